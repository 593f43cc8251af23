use clap::Parser;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::time::Duration;
use thermal_relay::daemon::{self, LoopOptions, SamplingLoop};
use thermal_relay::hardware::HardwareContext;
use thermal_relay::serial::discovery::{candidate_ports, select_port, PortCandidate};
use thermal_relay::serial::{SerialTransport, TransportState};
use thermal_relay::{logger, process, Config, Error, MetricKind, Resolver, Result};

#[derive(Parser, Debug)]
#[command(name = "thermal-relay")]
#[command(author, version, about = "Streams CPU/GPU temperatures to a serial display", long_about = None)]
struct Args {
    #[arg(short, long, help = "Serial port of the display (skips discovery)")]
    port: Option<String>,

    #[arg(short, long, help = "Baud rate")]
    baud: Option<u32>,

    #[arg(short, long, help = "Sampling interval in milliseconds", value_name = "MS")]
    interval_ms: Option<u64>,

    #[arg(short, long, help = "Path to custom config file")]
    config: Option<PathBuf>,

    #[arg(short, long, help = "Terminate other running instances and exit")]
    kill: bool,

    #[arg(long, help = "List candidate serial ports and exit")]
    list_ports: bool,

    #[arg(long, help = "List detected hardware sensors and exit")]
    list_sensors: bool,

    #[arg(long, help = "Write the effective configuration to the default config path and exit")]
    init_config: bool,

    #[arg(short, long, help = "Do not print the status line every cycle")]
    quiet: bool,

    #[arg(short, long, help = "Verbose logging")]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    logger::init(args.verbose);

    if let Err(e) = run(args) {
        log::error!("{}", e);
        eprintln!("thermal-relay: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    if args.kill {
        let killed = process::kill_other_instances()?;
        println!("Terminated {} running instance(s)", killed);
        return Ok(());
    }

    let config = load_config(&args)?;

    if args.init_config {
        config.save()?;
        println!("Wrote {}", Config::config_path()?.display());
        return Ok(());
    }

    if args.list_ports {
        return list_ports(config.serial.usb_only);
    }

    log::info!("Starting thermal-relay v{}", env!("CARGO_PKG_VERSION"));

    let hardware = HardwareContext::open();

    if args.list_sensors {
        list_sensors(&hardware);
        return Ok(());
    }

    let port = resolve_port(&args, &config)?;
    // After the port prompt, so Ctrl-C there still interrupts the process.
    daemon::setup_signal_handlers()?;
    let resolver = Resolver::with_default_providers(&hardware);
    for kind in MetricKind::ALL {
        log::debug!("{} providers: {}", kind, resolver.providers(kind).join(", "));
    }

    let baud_rate = config.serial.baud_rate;
    let timeout = Duration::from_millis(config.serial.timeout_ms);
    let mut sampler = SamplingLoop::initialize(
        resolver,
        || SerialTransport::open(&port, baud_rate, timeout),
        LoopOptions::from(&config),
    )?;

    let quiet = args.quiet;
    sampler.run(|report| {
        if !quiet {
            println!("{}", report.status_line);
        }
    });

    if sampler.transport_state() == TransportState::Failed {
        return Err(Error::Daemon(format!("display link on {} was lost", port)));
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<Config> {
    if let Some(path) = &args.config {
        log::info!("Loading config from: {}", path.display());
    }
    let mut config = Config::load(args.config.as_deref())?;

    if let Some(port) = &args.port {
        config.serial.port = Some(port.clone());
    }
    if let Some(baud) = args.baud {
        config.serial.baud_rate = baud;
    }
    if let Some(interval_ms) = args.interval_ms {
        config.refresh.interval_ms = interval_ms;
    }

    config.validate()?;
    Ok(config)
}

fn resolve_port(args: &Args, config: &Config) -> Result<String> {
    if let Some(port) = &config.serial.port {
        log::debug!(
            "Using {} port {}",
            if args.port.is_some() { "command-line" } else { "configured" },
            port
        );
        return Ok(port.clone());
    }

    let candidates = candidate_ports(config.serial.usb_only)?;
    select_port(&candidates, config.serial.default_port.as_deref(), choose_interactively)
}

/// Asks on the terminal which port to use. Empty input picks the first one;
/// without a terminal there is no choice.
fn choose_interactively(candidates: &[PortCandidate]) -> Option<usize> {
    if !io::stdin().is_terminal() {
        log::warn!("Several serial ports found and no terminal to choose from");
        return None;
    }

    println!("Several serial ports found:");
    for (i, candidate) in candidates.iter().enumerate() {
        println!("  [{}] {}", i + 1, candidate);
    }
    print!("Select port [1]: ");
    io::stdout().flush().ok()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).ok()?;
    let line = line.trim();
    if line.is_empty() {
        return Some(0);
    }
    match line.parse::<usize>() {
        Ok(n) if n >= 1 => Some(n - 1),
        _ => None,
    }
}

fn list_ports(usb_only: bool) -> Result<()> {
    let candidates = candidate_ports(usb_only)?;
    if candidates.is_empty() {
        println!("No serial ports found{}", if usb_only { " (USB only)" } else { "" });
    }
    for candidate in candidates {
        println!("{}", candidate);
    }
    Ok(())
}

fn list_sensors(hardware: &HardwareContext) {
    if hardware.is_empty() {
        println!("No hardware sensors detected");
    }

    for block in hardware.blocks() {
        block.refresh();
        println!("{} [{}]", block.name(), block.kind());
        for sensor in block.sensors() {
            let value = sensor
                .value
                .map(|v| format!("{:.1}", v))
                .unwrap_or_else(|| "--".to_string());
            println!("  {:<24} {:<12} {}", sensor.name, format!("{:?}", sensor.kind), value);
        }
    }

    let resolver = Resolver::with_default_providers(hardware);
    for kind in MetricKind::ALL {
        match resolver.resolve_detailed(kind) {
            Some(resolution) => println!(
                "{}: {:.1}°C via {}",
                kind, resolution.value, resolution.provider
            ),
            None => println!("{}: -- (tried {})", kind, resolver.providers(kind).join(", ")),
        }
    }
}
