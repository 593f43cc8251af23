pub mod config;
pub mod daemon;
pub mod error;
pub mod hardware;
pub mod logger;
pub mod process;
pub mod providers;
pub mod resolver;
pub mod serial;

pub use config::Config;
pub use daemon::{CycleReport, LoopOptions, LoopState, SamplingLoop};
pub use error::{Error, Result};
pub use hardware::HardwareContext;
pub use providers::{Celsius, MetricKind, Provider};
pub use resolver::Resolver;
