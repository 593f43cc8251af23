use super::{Celsius, MetricKind, Provider};
use crate::error::{Error, Result};
use crate::hardware::{HardwareContext, HardwareKind, SensorKind};

/// Sensor names that denote an overall CPU temperature across vendors.
/// Matched as case-sensitive substrings.
pub const CPU_SENSOR_NAMES: &[&str] = &["Tctl", "Tdie", "Package", "Average", "Core"];

pub fn is_cpu_package_sensor(name: &str) -> bool {
    CPU_SENSOR_NAMES.iter().any(|pattern| name.contains(pattern))
}

/// CPU temperature from the hardware-monitoring context.
pub struct LibraryCpuProvider<'a> {
    hardware: &'a HardwareContext,
}

impl<'a> LibraryCpuProvider<'a> {
    pub fn new(hardware: &'a HardwareContext) -> Self {
        Self { hardware }
    }
}

impl Provider for LibraryCpuProvider<'_> {
    fn name(&self) -> &str {
        "hwmon-cpu"
    }

    fn kind(&self) -> MetricKind {
        MetricKind::Cpu
    }

    fn read(&self) -> Result<Option<Celsius>> {
        let mut found_block = false;

        for block in self.hardware.blocks_of(|kind| kind == HardwareKind::Cpu) {
            found_block = true;
            block.refresh();

            let reading = block
                .sensors()
                .into_iter()
                .filter(|s| s.kind == SensorKind::Temperature && is_cpu_package_sensor(&s.name))
                .find_map(|s| s.value);

            if reading.is_some() {
                return Ok(reading);
            }
        }

        if !found_block {
            return Err(Error::Sensor("no CPU hardware block".to_string()));
        }
        Ok(None)
    }
}
