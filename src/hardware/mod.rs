//! Hardware-monitoring context shared by the library-backed providers.
//!
//! The context is opened once by the process owner and borrowed by
//! providers. Every block must be refreshed before its sensors reflect the
//! current instant; `sensors()` returns the snapshot of the last refresh.

pub mod components;

#[cfg(any(feature = "amd", feature = "intel"))]
pub mod drm;

#[cfg(feature = "nvidia")]
pub mod nvidia;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HardwareKind {
    Cpu,
    GpuNvidia,
    GpuAmd,
    GpuIntel,
    Other,
}

impl HardwareKind {
    pub fn is_gpu(self) -> bool {
        matches!(self, Self::GpuNvidia | Self::GpuAmd | Self::GpuIntel)
    }
}

impl fmt::Display for HardwareKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Cpu => "CPU",
            Self::GpuNvidia => "GPU (NVIDIA)",
            Self::GpuAmd => "GPU (AMD)",
            Self::GpuIntel => "GPU (Intel)",
            Self::Other => "Other",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    Temperature,
    Load,
    Fan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sensor {
    pub name: String,
    pub kind: SensorKind,
    pub value: Option<f32>,
}

impl Sensor {
    pub fn temperature(name: impl Into<String>, value: Option<f32>) -> Self {
        Self {
            name: name.into(),
            kind: SensorKind::Temperature,
            value,
        }
    }
}

pub trait HardwareBlock: Send + Sync {
    fn kind(&self) -> HardwareKind;
    fn name(&self) -> String;
    /// Re-reads the underlying source into the block's snapshot.
    fn refresh(&self);
    fn sensors(&self) -> Vec<Sensor>;
}

pub struct HardwareContext {
    blocks: Vec<Box<dyn HardwareBlock>>,
}

impl HardwareContext {
    /// Probes every compiled-in backend. Backends that fail to detect
    /// anything are skipped, so the context may be empty.
    pub fn open() -> Self {
        let mut blocks: Vec<Box<dyn HardwareBlock>> = Vec::new();

        blocks.extend(components::detect_all());

        #[cfg(feature = "nvidia")]
        {
            match nvidia::NvidiaBlock::detect_all() {
                Ok(gpus) => {
                    for gpu in gpus {
                        blocks.push(Box::new(gpu));
                    }
                }
                Err(e) => log::debug!("NVIDIA backend skipped: {}", e),
            }
        }

        #[cfg(feature = "amd")]
        {
            match drm::DrmBlock::detect_all(drm::Vendor::Amd) {
                Ok(gpus) => {
                    for gpu in gpus {
                        blocks.push(Box::new(gpu));
                    }
                }
                Err(e) => log::debug!("AMD backend skipped: {}", e),
            }
        }

        #[cfg(feature = "intel")]
        {
            match drm::DrmBlock::detect_all(drm::Vendor::Intel) {
                Ok(gpus) => {
                    for gpu in gpus {
                        blocks.push(Box::new(gpu));
                    }
                }
                Err(e) => log::debug!("Intel backend skipped: {}", e),
            }
        }

        log::info!("Hardware monitor opened: {} block(s)", blocks.len());
        Self { blocks }
    }

    pub fn from_blocks(blocks: Vec<Box<dyn HardwareBlock>>) -> Self {
        Self { blocks }
    }

    pub fn blocks(&self) -> &[Box<dyn HardwareBlock>] {
        &self.blocks
    }

    pub fn blocks_of<'a>(
        &'a self,
        filter: impl Fn(HardwareKind) -> bool + 'a,
    ) -> impl Iterator<Item = &'a dyn HardwareBlock> + 'a {
        self.blocks
            .iter()
            .map(|b| b.as_ref())
            .filter(move |b| filter(b.kind()))
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }
}

impl Drop for HardwareContext {
    fn drop(&mut self) {
        log::debug!("Hardware monitor closed");
    }
}
