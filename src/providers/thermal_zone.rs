//! CPU temperature from the platform's ACPI thermal zones.
//!
//! ACPI reports zone temperatures in tenths of a Kelvin. The query layer
//! hands back raw decikelvin rows and the provider does the conversion, so
//! any platform backend only needs to produce rows in that unit.

use super::{Celsius, MetricKind, Provider};
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

const THERMAL_ROOT: &str = "/sys/class/thermal";

/// 0 °C in decikelvin, rounded the way ACPI firmware reports it.
const ZERO_CELSIUS_DK: i64 = 2732;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThermalZoneRow {
    /// Raw zone temperature in decikelvin.
    pub current_temperature: i64,
}

impl ThermalZoneRow {
    pub fn celsius(&self) -> Celsius {
        (self.current_temperature as f32 / 10.0) - 273.15
    }
}

/// A table of thermal-zone rows, queried fresh on every call.
pub trait ThermalZoneQuery: Send + Sync {
    fn query(&self) -> Result<Vec<ThermalZoneRow>>;
}

/// Linux ACPI thermal zones (`type` == `acpitz`) under sysfs.
///
/// The kernel exposes millidegrees Celsius; values are mapped back to the
/// ACPI decikelvin unit.
pub struct AcpiThermalZones {
    root: PathBuf,
}

impl AcpiThermalZones {
    pub fn new() -> Self {
        Self::with_root(THERMAL_ROOT)
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read_zone(path: &Path) -> Option<ThermalZoneRow> {
        let zone_type = fs::read_to_string(path.join("type")).ok()?;
        if zone_type.trim() != "acpitz" {
            return None;
        }
        let millidegrees: i64 = fs::read_to_string(path.join("temp")).ok()?.trim().parse().ok()?;
        Some(ThermalZoneRow {
            current_temperature: millidegrees / 100 + ZERO_CELSIUS_DK,
        })
    }
}

impl Default for AcpiThermalZones {
    fn default() -> Self {
        Self::new()
    }
}

impl ThermalZoneQuery for AcpiThermalZones {
    fn query(&self) -> Result<Vec<ThermalZoneRow>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut zones: Vec<PathBuf> = fs::read_dir(&self.root)?
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("thermal_zone"))
            })
            .collect();
        // thermal_zone0 first
        zones.sort();

        Ok(zones.iter().filter_map(|zone| Self::read_zone(zone)).collect())
    }
}

pub struct ThermalZoneProvider<Q = AcpiThermalZones> {
    query: Q,
}

impl ThermalZoneProvider<AcpiThermalZones> {
    pub fn new() -> Self {
        Self::with_query(AcpiThermalZones::new())
    }
}

impl Default for ThermalZoneProvider<AcpiThermalZones> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Q: ThermalZoneQuery> ThermalZoneProvider<Q> {
    pub fn with_query(query: Q) -> Self {
        Self { query }
    }
}

impl<Q: ThermalZoneQuery> Provider for ThermalZoneProvider<Q> {
    fn name(&self) -> &str {
        "acpi-thermal-zone"
    }

    fn kind(&self) -> MetricKind {
        MetricKind::Cpu
    }

    fn read(&self) -> Result<Option<Celsius>> {
        let rows = self.query.query()?;
        let row = rows
            .first()
            .ok_or_else(|| Error::Sensor("no thermal zones reported".to_string()))?;

        if row.current_temperature <= 0 {
            return Ok(None);
        }
        Ok(Some(row.celsius()))
    }
}
