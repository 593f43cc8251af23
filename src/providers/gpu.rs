use super::{Celsius, MetricKind, Provider};
use crate::error::{Error, Result};
use crate::hardware::{HardwareContext, HardwareKind, SensorKind};

/// GPU temperature from the first NVIDIA, AMD or Intel block that reports
/// a temperature sensor. No name filtering is applied.
pub struct LibraryGpuProvider<'a> {
    hardware: &'a HardwareContext,
}

impl<'a> LibraryGpuProvider<'a> {
    pub fn new(hardware: &'a HardwareContext) -> Self {
        Self { hardware }
    }
}

impl Provider for LibraryGpuProvider<'_> {
    fn name(&self) -> &str {
        "hwmon-gpu"
    }

    fn kind(&self) -> MetricKind {
        MetricKind::Gpu
    }

    fn read(&self) -> Result<Option<Celsius>> {
        let mut found_block = false;

        for block in self.hardware.blocks_of(HardwareKind::is_gpu) {
            found_block = true;
            block.refresh();

            let reading = block
                .sensors()
                .into_iter()
                .filter(|s| s.kind == SensorKind::Temperature)
                .find_map(|s| s.value);

            if reading.is_some() {
                log::trace!("GPU temperature from {} ({})", block.name(), block.kind());
                return Ok(reading);
            }
        }

        if !found_block {
            return Err(Error::Sensor("no GPU hardware block".to_string()));
        }
        Ok(None)
    }
}
