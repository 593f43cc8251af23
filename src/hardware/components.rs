use super::{HardwareBlock, HardwareKind, Sensor};
use std::sync::Mutex;
use sysinfo::Components;

/// hwmon chip names that report CPU package/die temperatures.
const CPU_CHIPS: &[&str] = &["k10temp", "coretemp", "zenpower", "cpu_thermal", "cpu-thermal"];

/// sysinfo labels are "<chip> <sensor>", e.g. "k10temp Tctl".
fn is_cpu_label(label: &str) -> bool {
    CPU_CHIPS.iter().any(|chip| label.starts_with(chip))
}

/// SoC thermal drivers that expose a single die sensor with a generic label.
const SOC_CHIPS: &[&str] = &["cpu_thermal", "cpu-thermal"];

/// Sensor name without the chip prefix, e.g. "k10temp Tctl" becomes "Tctl".
/// SoC die sensors ("cpu_thermal temp1") are named "Package".
fn sensor_name(label: &str) -> String {
    let (chip, rest) = label.split_once(' ').unwrap_or((label, ""));
    if SOC_CHIPS.iter().any(|soc| *soc == chip) {
        return match rest {
            "" | "temp1" => "Package".to_string(),
            other => format!("Package {}", other),
        };
    }
    if rest.is_empty() {
        label.to_string()
    } else {
        rest.to_string()
    }
}

/// A block backed by sysinfo components whose labels pass `select`.
pub struct ComponentBlock {
    kind: HardwareKind,
    name: String,
    select: fn(&str) -> bool,
    components: Mutex<Components>,
    snapshot: Mutex<Vec<Sensor>>,
}

impl ComponentBlock {
    fn new(kind: HardwareKind, name: &str, select: fn(&str) -> bool) -> Self {
        Self {
            kind,
            name: name.to_string(),
            select,
            components: Mutex::new(Components::new_with_refreshed_list()),
            snapshot: Mutex::new(Vec::new()),
        }
    }

    fn has_sensors(&self) -> bool {
        self.components
            .lock()
            .map(|c| c.iter().any(|component| (self.select)(component.label())))
            .unwrap_or(false)
    }
}

/// Returns the CPU block plus an "other" block for the remaining board sensors.
pub fn detect_all() -> Vec<Box<dyn HardwareBlock>> {
    let candidates = [
        ComponentBlock::new(HardwareKind::Cpu, "CPU", is_cpu_label),
        ComponentBlock::new(HardwareKind::Other, "Board sensors", |label| !is_cpu_label(label)),
    ];

    let mut blocks: Vec<Box<dyn HardwareBlock>> = Vec::new();
    for block in candidates {
        if block.has_sensors() {
            blocks.push(Box::new(block));
        } else {
            log::debug!("No sysinfo sensors for {} block", block.kind);
        }
    }
    blocks
}

impl HardwareBlock for ComponentBlock {
    fn kind(&self) -> HardwareKind {
        self.kind
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn refresh(&self) {
        let Ok(mut components) = self.components.lock() else {
            log::warn!("{} component list poisoned, skipping refresh", self.name);
            return;
        };
        components.refresh(false);

        let sensors = components
            .iter()
            .filter(|c| (self.select)(c.label()))
            .map(|c| Sensor::temperature(sensor_name(c.label()), c.temperature()))
            .collect();

        if let Ok(mut snapshot) = self.snapshot.lock() {
            *snapshot = sensors;
        }
    }

    fn sensors(&self) -> Vec<Sensor> {
        self.snapshot.lock().map(|s| s.clone()).unwrap_or_default()
    }
}
