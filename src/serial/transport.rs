use crate::error::{Error, Result};
use std::fmt;
use std::io::Write;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Closed,
    Open,
    Failed,
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => f.write_str("closed"),
            Self::Open => f.write_str("open"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// Outbound line channel to the display.
///
/// A write error moves the channel to `Failed` for good; there is no
/// reconnect on the same instance.
pub struct Transport<W> {
    port: String,
    writer: Option<W>,
    state: TransportState,
}

pub type SerialTransport = Transport<Box<dyn serialport::SerialPort>>;

impl Transport<Box<dyn serialport::SerialPort>> {
    /// Claims `port`. Busy, missing or permission-denied ports are reported
    /// as [`Error::PortUnavailable`].
    pub fn open(port: &str, baud_rate: u32, timeout: Duration) -> Result<Self> {
        log::info!("Opening serial port {} at {} baud", port, baud_rate);
        let serial = serialport::new(port, baud_rate)
            .timeout(timeout)
            .open()
            .map_err(|e| Error::PortUnavailable(format!("{}: {}", port, e)))?;
        Ok(Self::from_writer(port, serial))
    }
}

impl<W: Write> Transport<W> {
    /// Wraps an already-open writer.
    pub fn from_writer(port: impl Into<String>, writer: W) -> Self {
        Self {
            port: port.into(),
            writer: Some(writer),
            state: TransportState::Open,
        }
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    /// Writes one newline-terminated record and flushes it.
    pub fn send(&mut self, line: &str) -> Result<()> {
        if self.state != TransportState::Open {
            return Err(Error::TransportClosed(self.state.to_string()));
        }
        let Some(writer) = self.writer.as_mut() else {
            return Err(Error::TransportClosed(self.state.to_string()));
        };

        let result = writer
            .write_all(line.as_bytes())
            .and_then(|_| {
                if line.ends_with('\n') {
                    Ok(())
                } else {
                    writer.write_all(b"\n")
                }
            })
            .and_then(|_| writer.flush());

        match result {
            Ok(()) => Ok(()),
            Err(e) => {
                log::error!("Serial write to {} failed: {}", self.port, e);
                self.state = TransportState::Failed;
                self.writer = None;
                Err(Error::TransportWrite(format!("{}: {}", self.port, e)))
            }
        }
    }

    pub fn close(&mut self) {
        if self.writer.take().is_some() {
            log::info!("Closing serial port {}", self.port);
        }
        if self.state == TransportState::Open {
            self.state = TransportState::Closed;
        }
    }
}
