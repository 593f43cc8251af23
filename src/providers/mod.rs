//! Temperature providers: one strategy per underlying data source.

pub mod cpu;
pub mod gpu;
pub mod thermal_zone;

pub use cpu::LibraryCpuProvider;
pub use gpu::LibraryGpuProvider;
pub use thermal_zone::{AcpiThermalZones, ThermalZoneProvider, ThermalZoneQuery, ThermalZoneRow};

use crate::error::Result;
use std::fmt;

/// Degrees Celsius.
pub type Celsius = f32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricKind {
    Cpu,
    Gpu,
}

impl MetricKind {
    pub const ALL: [MetricKind; 2] = [MetricKind::Cpu, MetricKind::Gpu];
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => f.write_str("CPU"),
            Self::Gpu => f.write_str("GPU"),
        }
    }
}

/// A reading is plausible when present and strictly above 0 °C.
///
/// Sub-zero readings are rejected too; the downstream display treats 0 as
/// "no data", so anything at or below it is handled as a missing value.
pub fn is_plausible(reading: Option<Celsius>) -> bool {
    matches!(reading, Some(v) if v > 0.0)
}

pub trait Provider: Send {
    /// Short identity used in diagnostics.
    fn name(&self) -> &str;

    fn kind(&self) -> MetricKind;

    /// Reads the source once. Errors here are source-unavailable conditions.
    fn read(&self) -> Result<Option<Celsius>>;

    /// Reads the source, reporting any failure as "no reading".
    fn sample(&self) -> Option<Celsius> {
        match self.read() {
            Ok(value) => value,
            Err(e) => {
                log::debug!("{} provider '{}' unavailable: {}", self.kind(), self.name(), e);
                None
            }
        }
    }
}
