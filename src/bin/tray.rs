#[cfg(all(unix, feature = "systray"))]
use std::sync::{Arc, Mutex};
#[cfg(all(unix, feature = "systray"))]
use std::thread::{self, JoinHandle};
#[cfg(all(unix, feature = "systray"))]
use std::time::Duration;
use thermal_relay::{logger, Config, Error, Result};

#[cfg(all(unix, feature = "systray"))]
use tray_item::{IconSource, TrayItem};

#[cfg(all(unix, feature = "systray"))]
const TRAY_UPDATE_INTERVAL_MS: u64 = 200;

#[cfg(all(unix, feature = "systray"))]
struct TrayState {
    status_line: String,
    link: String,
}

#[cfg(all(unix, feature = "systray"))]
impl TrayState {
    fn new() -> Self {
        Self {
            status_line: "CPU: -- | GPU: --".to_string(),
            link: "connecting".to_string(),
        }
    }
}

fn main() -> Result<()> {
    logger::init(false);

    log::info!("thermal-relay tray starting");

    let config = Config::load(None).unwrap_or_else(|e| {
        log::warn!("{}; using defaults", e);
        Config::default()
    });
    config.validate()?;

    #[cfg(all(unix, feature = "systray"))]
    {
        thermal_relay::daemon::setup_signal_handlers()?;

        let state = Arc::new(Mutex::new(TrayState::new()));

        let state_worker = state.clone();
        let worker = thread::spawn(move || {
            if let Err(e) = run_sampling_loop(state_worker.clone(), config) {
                log::error!("Sampling loop error: {}", e);
                if let Ok(mut s) = state_worker.lock() {
                    s.link = format!("error: {}", e);
                }
            }
        });

        init_tray(state, worker)
    }

    #[cfg(not(all(unix, feature = "systray")))]
    {
        let _ = config;
        log::error!("Systray mode needs a Unix build with --features systray");
        Err(Error::Daemon("Systray feature not enabled".to_string()))
    }
}

#[cfg(all(unix, feature = "systray"))]
fn run_sampling_loop(state: Arc<Mutex<TrayState>>, config: Config) -> Result<()> {
    use thermal_relay::daemon::{LoopOptions, SamplingLoop};
    use thermal_relay::serial::{candidate_ports, select_port, SerialTransport};
    use thermal_relay::{HardwareContext, Resolver};

    let port = match &config.serial.port {
        Some(port) => port.clone(),
        None => {
            let candidates = candidate_ports(config.serial.usb_only)?;
            // No terminal to ask on; only the configured default can break a tie.
            select_port(&candidates, config.serial.default_port.as_deref(), |_| None)?
        }
    };

    let hardware = HardwareContext::open();
    let resolver = Resolver::with_default_providers(&hardware);
    let timeout = Duration::from_millis(config.serial.timeout_ms);

    let mut sampler = SamplingLoop::initialize(
        resolver,
        || SerialTransport::open(&port, config.serial.baud_rate, timeout),
        LoopOptions::from(&config),
    )?;

    let link_port = port.clone();
    sampler.run(|report| {
        if let Ok(mut s) = state.lock() {
            s.status_line = report.status_line.clone();
            s.link = format!("{} ({})", link_port, report.state);
        }
    });

    if let Ok(mut s) = state.lock() {
        s.link = format!("{} ({})", port, sampler.transport_state());
    }
    Ok(())
}

#[cfg(all(unix, feature = "systray"))]
fn init_tray(state: Arc<Mutex<TrayState>>, worker: JoinHandle<()>) -> Result<()> {
    let mut tray = TrayItem::new("Thermal Relay", IconSource::Resource("thermal-relay"))
        .map_err(|e| Error::Daemon(format!("Failed to create tray: {}", e)))?;

    let state_status = state.clone();
    tray.add_menu_item("Show Status", move || {
        if let Ok(s) = state_status.lock() {
            thermal_relay::daemon::send_status_update(&s.status_line, &s.link);
        }
    })
    .map_err(|e| Error::Daemon(format!("Failed to add menu item: {}", e)))?;

    tray.add_menu_item("Exit", || {
        log::info!("Tray: user clicked Exit");
        thermal_relay::daemon::set_stop_flag();
    })
    .map_err(|e| Error::Daemon(format!("Failed to add menu item: {}", e)))?;

    log::info!("Systray initialized successfully");

    run_tray_event_loop(worker)
}

#[cfg(all(unix, feature = "systray"))]
fn run_tray_event_loop(worker: JoinHandle<()>) -> Result<()> {
    while !thermal_relay::daemon::should_stop() {
        thread::sleep(Duration::from_millis(TRAY_UPDATE_INTERVAL_MS));
    }

    log::info!("Tray: stop signal received");
    // The worker closes the port once its current cycle ends.
    worker
        .join()
        .map_err(|_| Error::Daemon("Sampling thread panicked".to_string()))
}
