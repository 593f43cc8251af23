use crate::error::{Error, Result};
use serialport::SerialPortType;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortCandidate {
    pub name: String,
    pub description: String,
    pub usb: bool,
}

impl PortCandidate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            usb: false,
        }
    }
}

impl fmt::Display for PortCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.description.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} ({})", self.name, self.description)
        }
    }
}

/// Lists serial ports that could host the display.
pub fn candidate_ports(usb_only: bool) -> Result<Vec<PortCandidate>> {
    let ports = serialport::available_ports()
        .map_err(|e| Error::PortUnavailable(format!("Failed to enumerate serial ports: {}", e)))?;

    let candidates: Vec<PortCandidate> = ports
        .into_iter()
        .map(|info| {
            let (usb, description) = match info.port_type {
                SerialPortType::UsbPort(usb) => {
                    let product = usb.product.unwrap_or_else(|| "USB serial".to_string());
                    (true, format!("{} {:04x}:{:04x}", product, usb.vid, usb.pid))
                }
                SerialPortType::PciPort => (false, "PCI".to_string()),
                SerialPortType::BluetoothPort => (false, "Bluetooth".to_string()),
                SerialPortType::Unknown => (false, String::new()),
            };
            PortCandidate {
                name: info.port_name,
                description,
                usb,
            }
        })
        .filter(|c| c.usb || !usb_only)
        .collect();

    log::debug!("Found {} candidate serial port(s)", candidates.len());
    Ok(candidates)
}

/// Resolves discovery output to exactly one port.
///
/// One candidate is taken as-is. With several, a configured default that is
/// among them wins; otherwise `chooser` picks an index. No candidates, or no
/// usable choice, is an error.
pub fn select_port<F>(candidates: &[PortCandidate], default: Option<&str>, chooser: F) -> Result<String>
where
    F: FnOnce(&[PortCandidate]) -> Option<usize>,
{
    match candidates {
        [] => Err(Error::PortUnavailable("no serial ports found".to_string())),
        [only] => {
            log::info!("Using the only serial port found: {}", only);
            Ok(only.name.clone())
        }
        many => {
            if let Some(default) = default {
                if many.iter().any(|c| c.name == default) {
                    log::info!("Using configured default port {}", default);
                    return Ok(default.to_string());
                }
                log::warn!("Configured default port {} not found", default);
            }

            match chooser(many) {
                Some(index) if index < many.len() => Ok(many[index].name.clone()),
                _ => Err(Error::AmbiguousPort(many.len())),
            }
        }
    }
}
