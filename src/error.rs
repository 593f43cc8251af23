use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Hardware error: {0}")]
    Hardware(String),

    #[error("Sensor unavailable: {0}")]
    Sensor(String),

    #[error("Serial port unavailable: {0}")]
    PortUnavailable(String),

    #[error("Ambiguous serial port selection: {0} candidates and no default")]
    AmbiguousPort(usize),

    #[error("Serial write failed: {0}")]
    TransportWrite(String),

    #[error("Serial transport is {0}, refusing to write")]
    TransportClosed(String),

    #[error("Process error: {0}")]
    Process(String),

    #[error("Daemon error: {0}")]
    Daemon(String),
}

pub type Result<T> = std::result::Result<T, Error>;
