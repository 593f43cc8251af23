use super::{HardwareBlock, HardwareKind, Sensor, SensorKind};
use crate::error::{Error, Result};
use nvml_wrapper::enum_wrappers::device::TemperatureSensor;
use nvml_wrapper::Nvml;
use std::sync::{Arc, Mutex};

/// One NVML device. The device handle is looked up by index on every
/// refresh so the block only holds the shared library handle.
pub struct NvidiaBlock {
    nvml: Arc<Nvml>,
    index: u32,
    name: String,
    snapshot: Mutex<Vec<Sensor>>,
}

impl NvidiaBlock {
    pub fn detect_all() -> Result<Vec<Self>> {
        let nvml = Arc::new(
            Nvml::init().map_err(|e| Error::Hardware(format!("Failed to initialize NVML: {}", e)))?,
        );

        let device_count = nvml
            .device_count()
            .map_err(|e| Error::Hardware(format!("Failed to get device count: {}", e)))?;

        let mut gpus = Vec::new();
        for index in 0..device_count {
            match nvml.device_by_index(index) {
                Ok(device) => {
                    let name = device
                        .name()
                        .unwrap_or_else(|_| "Unknown NVIDIA GPU".to_string());
                    gpus.push(Self {
                        nvml: Arc::clone(&nvml),
                        index,
                        name,
                        snapshot: Mutex::new(Vec::new()),
                    });
                }
                Err(e) => {
                    log::warn!("Failed to get NVIDIA device {}: {}", index, e);
                }
            }
        }

        if gpus.is_empty() {
            return Err(Error::Hardware("No NVIDIA GPUs detected".to_string()));
        }

        Ok(gpus)
    }

    fn read_sensors(&self) -> Result<Vec<Sensor>> {
        let device = self
            .nvml
            .device_by_index(self.index)
            .map_err(|e| Error::Hardware(format!("NVIDIA device {} lost: {}", self.index, e)))?;

        Ok(vec![
            Sensor {
                name: "GPU Core Load".to_string(),
                kind: SensorKind::Load,
                value: device.utilization_rates().ok().map(|u| u.gpu as f32),
            },
            Sensor::temperature(
                "GPU Core",
                device.temperature(TemperatureSensor::Gpu).ok().map(|t| t as f32),
            ),
            Sensor {
                name: "GPU Fan".to_string(),
                kind: SensorKind::Fan,
                value: device.fan_speed(0).ok().map(|f| f as f32),
            },
        ])
    }
}

impl HardwareBlock for NvidiaBlock {
    fn kind(&self) -> HardwareKind {
        HardwareKind::GpuNvidia
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn refresh(&self) {
        let sensors = match self.read_sensors() {
            Ok(sensors) => sensors,
            Err(e) => {
                log::debug!("{}", e);
                Vec::new()
            }
        };

        if let Ok(mut snapshot) = self.snapshot.lock() {
            *snapshot = sensors;
        }
    }

    fn sensors(&self) -> Vec<Sensor> {
        self.snapshot.lock().map(|s| s.clone()).unwrap_or_default()
    }
}
