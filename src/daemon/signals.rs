use crate::error::Result;

#[cfg(unix)]
use signal_hook::{consts::{SIGINT, SIGTERM}, iterator::Signals};

/// SIGINT/SIGTERM request a graceful stop; a second one exits immediately.
#[cfg(unix)]
pub fn setup_signal_handlers() -> Result<()> {
    let mut signals = Signals::new([SIGTERM, SIGINT])
        .map_err(|e| crate::error::Error::Daemon(format!("Failed to setup signal handlers: {}", e)))?;

    std::thread::spawn(move || {
        for sig in signals.forever() {
            if super::should_stop() {
                log::warn!("Received signal {} again, exiting", sig);
                std::process::exit(130);
            }
            log::info!("Received termination signal, shutting down gracefully");
            super::set_stop_flag();
        }
    });

    Ok(())
}

#[cfg(not(unix))]
pub fn setup_signal_handlers() -> Result<()> {
    Ok(())
}
