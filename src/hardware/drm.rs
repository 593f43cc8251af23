use super::{HardwareBlock, HardwareKind, Sensor, SensorKind};
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const DRM_ROOT: &str = "/sys/class/drm";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vendor {
    Amd,
    Intel,
}

impl Vendor {
    fn pci_id(self) -> &'static str {
        match self {
            Self::Amd => "0x1002",
            Self::Intel => "0x8086",
        }
    }

    /// hwmon `name` files written by the vendor's kernel driver.
    fn hwmon_names(self) -> &'static [&'static str] {
        match self {
            Self::Amd => &["amdgpu"],
            Self::Intel => &["i915", "xe"],
        }
    }

    fn kind(self) -> HardwareKind {
        match self {
            Self::Amd => HardwareKind::GpuAmd,
            Self::Intel => HardwareKind::GpuIntel,
        }
    }
}

/// A DRM card exposing a vendor hwmon directory in sysfs.
pub struct DrmBlock {
    vendor: Vendor,
    hwmon_path: PathBuf,
    name: String,
    snapshot: Mutex<Vec<Sensor>>,
}

impl DrmBlock {
    pub fn detect_all(vendor: Vendor) -> Result<Vec<Self>> {
        Self::detect_in(Path::new(DRM_ROOT), vendor)
    }

    pub(crate) fn detect_in(drm_root: &Path, vendor: Vendor) -> Result<Vec<Self>> {
        let cards = fs::read_dir(drm_root)
            .map_err(|e| Error::Hardware(format!("Failed to read {}: {}", drm_root.display(), e)))?;

        let mut gpus = Vec::new();
        for entry in cards.flatten() {
            let path = entry.path();
            let card = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

            // Skip connectors such as card1-DP-1
            if !card.starts_with("card") || card.contains('-') {
                continue;
            }

            let device_path = path.join("device");
            let Ok(id) = fs::read_to_string(device_path.join("vendor")) else {
                continue;
            };
            if id.trim() != vendor.pci_id() {
                continue;
            }

            if let Some(hwmon_path) = Self::find_hwmon(&device_path, vendor) {
                let name = Self::read_gpu_name(&device_path, card, vendor);
                log::debug!("Found {} at {}", name, hwmon_path.display());
                gpus.push(Self {
                    vendor,
                    hwmon_path,
                    name,
                    snapshot: Mutex::new(Vec::new()),
                });
            }
        }

        if gpus.is_empty() {
            return Err(Error::Hardware(format!("No {:?} GPUs detected", vendor)));
        }

        Ok(gpus)
    }

    fn find_hwmon(device_path: &Path, vendor: Vendor) -> Option<PathBuf> {
        let entries = fs::read_dir(device_path.join("hwmon")).ok()?;
        entries.flatten().map(|e| e.path()).find(|path| {
            fs::read_to_string(path.join("name"))
                .map(|name| vendor.hwmon_names().iter().any(|n| *n == name.trim()))
                .unwrap_or(false)
        })
    }

    fn read_gpu_name(device_path: &Path, card: &str, vendor: Vendor) -> String {
        if let Ok(name) = fs::read_to_string(device_path.join("product_name")) {
            let trimmed = name.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
        format!("{:?} GPU ({})", vendor, card)
    }

    /// Reads `<prefix><n>_input` files, e.g. temp1_input, with optional labels.
    fn read_channels(&self, prefix: &str, kind: SensorKind, scale: f32) -> Vec<(u32, Sensor)> {
        let Ok(entries) = fs::read_dir(&self.hwmon_path) else {
            return Vec::new();
        };

        let mut channels: Vec<(u32, Sensor)> = entries
            .flatten()
            .filter_map(|entry| {
                let file = entry.file_name();
                let file = file.to_str()?;
                let index: u32 = file.strip_prefix(prefix)?.strip_suffix("_input")?.parse().ok()?;

                let value = fs::read_to_string(entry.path())
                    .ok()
                    .and_then(|raw| raw.trim().parse::<f32>().ok())
                    .map(|raw| raw / scale);
                let name = fs::read_to_string(self.hwmon_path.join(format!("{}{}_label", prefix, index)))
                    .map(|label| label.trim().to_string())
                    .unwrap_or_else(|_| format!("{}{}", prefix, index));

                Some((index, Sensor { name, kind, value }))
            })
            .collect();

        channels.sort_by_key(|(index, _)| *index);
        channels
    }
}

impl HardwareBlock for DrmBlock {
    fn kind(&self) -> HardwareKind {
        self.vendor.kind()
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn refresh(&self) {
        let mut sensors: Vec<Sensor> = self
            .read_channels("temp", SensorKind::Temperature, 1000.0)
            .into_iter()
            .map(|(_, sensor)| sensor)
            .collect();
        sensors.extend(
            self.read_channels("fan", SensorKind::Fan, 1.0)
                .into_iter()
                .map(|(_, sensor)| sensor),
        );

        if let Ok(mut snapshot) = self.snapshot.lock() {
            *snapshot = sensors;
        }
    }

    fn sensors(&self) -> Vec<Sensor> {
        self.snapshot.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut f = fs::File::create(path).unwrap();
        write!(f, "{content}").unwrap();
    }

    /// Builds a fake /sys/class/drm tree with one AMD card and one connector.
    fn fake_drm(test: &str) -> PathBuf {
        let root = std::env::temp_dir()
            .join("thermal_relay_test")
            .join(format!("{}_{}", test, std::process::id()));
        let _ = fs::remove_dir_all(&root);

        let device = root.join("card0/device");
        write_file(&device.join("vendor"), "0x1002\n");
        write_file(&device.join("product_name"), "Radeon RX 7800 XT\n");
        let hwmon = device.join("hwmon/hwmon3");
        write_file(&hwmon.join("name"), "amdgpu\n");
        write_file(&hwmon.join("temp2_input"), "71000\n");
        write_file(&hwmon.join("temp2_label"), "junction\n");
        write_file(&hwmon.join("temp1_input"), "54000\n");
        write_file(&hwmon.join("temp1_label"), "edge\n");
        write_file(&hwmon.join("fan1_input"), "1200\n");

        write_file(&root.join("card0-DP-1/device/vendor"), "0x1002\n");
        root
    }

    #[test]
    fn detects_amd_card_and_reads_sensors_in_channel_order() {
        let root = fake_drm("amd_detect");
        let gpus = DrmBlock::detect_in(&root, Vendor::Amd).unwrap();
        assert_eq!(gpus.len(), 1);

        let gpu = &gpus[0];
        assert_eq!(gpu.kind(), HardwareKind::GpuAmd);
        assert_eq!(gpu.name(), "Radeon RX 7800 XT");
        assert!(gpu.sensors().is_empty());

        gpu.refresh();
        let sensors = gpu.sensors();
        assert_eq!(sensors.len(), 3);
        assert_eq!(sensors[0].name, "edge");
        assert_eq!(sensors[0].kind, SensorKind::Temperature);
        assert!((sensors[0].value.unwrap() - 54.0).abs() < 0.001);
        assert_eq!(sensors[1].name, "junction");
        assert_eq!(sensors[2].kind, SensorKind::Fan);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn other_vendor_not_detected() {
        let root = fake_drm("intel_absent");
        let result = DrmBlock::detect_in(&root, Vendor::Intel);
        assert!(matches!(result, Err(Error::Hardware(_))));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn missing_root_is_error() {
        let result = DrmBlock::detect_in(Path::new("/nonexistent/drm"), Vendor::Amd);
        assert!(matches!(result, Err(Error::Hardware(_))));
    }
}
