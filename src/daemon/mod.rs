mod notifications;
mod signals;

pub use notifications::{send_status_update, send_transport_failure};
pub use signals::setup_signal_handlers;

use crate::config::Config;
use crate::error::Result;
use crate::providers::{Celsius, MetricKind};
use crate::resolver::Resolver;
use crate::serial::{format_record, Transport, TransportState};
use std::fmt;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

static STOP_FLAG: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Initializing,
    Running,
    /// Transport failed; values are still resolved for local display.
    Degraded,
    Stopped,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Initializing => "initializing",
            Self::Running => "running",
            Self::Degraded => "degraded",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct LoopOptions {
    pub interval: Duration,
    pub keep_running_degraded: bool,
    pub notifications_enabled: bool,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for LoopOptions {
    fn from(config: &Config) -> Self {
        Self {
            interval: Duration::from_millis(config.refresh.interval_ms),
            keep_running_degraded: config.daemon.keep_running_degraded,
            notifications_enabled: config.daemon.notifications_enabled,
        }
    }
}

/// Outcome of one sampling cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub cycle: u64,
    pub cpu: Option<Celsius>,
    pub gpu: Option<Celsius>,
    pub status_line: String,
    pub transmitted: bool,
    pub state: LoopState,
}

/// Local display text, built every cycle whether or not a record is sent.
pub fn status_line(cpu: Option<Celsius>, gpu: Option<Celsius>) -> String {
    fn show(value: Option<Celsius>) -> String {
        value
            .map(|v| format!("{:.1}°C", v))
            .unwrap_or_else(|| "--".to_string())
    }
    format!("CPU: {} | GPU: {}", show(cpu), show(gpu))
}

/// Periodic resolve-then-transmit driver. Owns the resolver and the
/// transport; nothing else writes to the channel.
pub struct SamplingLoop<'a, W: Write> {
    resolver: Resolver<'a>,
    transport: Transport<W>,
    options: LoopOptions,
    state: LoopState,
    cycles: u64,
}

impl<'a, W: Write> SamplingLoop<'a, W> {
    /// Opens the transport. On failure the loop never reaches `Running` and
    /// the error is returned to the caller as fatal.
    pub fn initialize<F>(resolver: Resolver<'a>, open: F, options: LoopOptions) -> Result<Self>
    where
        F: FnOnce() -> Result<Transport<W>>,
    {
        log::debug!("Sampling loop {}", LoopState::Initializing);

        let transport = match open() {
            Ok(transport) => transport,
            Err(e) => {
                log::error!("Sampling loop {}: {}", LoopState::Stopped, e);
                return Err(e);
            }
        };

        log::info!(
            "Sampling loop {} on {} (interval: {}ms)",
            LoopState::Running,
            transport.port(),
            options.interval.as_millis()
        );

        Ok(Self {
            resolver,
            transport,
            options,
            state: LoopState::Running,
            cycles: 0,
        })
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn transport_state(&self) -> TransportState {
        self.transport.state()
    }

    /// Resolves both metrics and sends a record when both are plausible and
    /// the loop is still `Running`.
    pub fn run_cycle(&mut self) -> CycleReport {
        self.cycles += 1;

        let cpu = self.resolver.resolve(MetricKind::Cpu);
        let gpu = self.resolver.resolve(MetricKind::Gpu);
        let status_line = status_line(cpu, gpu);

        let mut transmitted = false;
        if self.state == LoopState::Running {
            match (cpu, gpu) {
                (Some(cpu), Some(gpu)) => match self.transport.send(&format_record(cpu, gpu)) {
                    Ok(()) => transmitted = true,
                    Err(e) => self.on_transport_failure(&e.to_string()),
                },
                _ => log::debug!("Cycle {}: incomplete reading, not sent ({})", self.cycles, status_line),
            }
        }

        CycleReport {
            cycle: self.cycles,
            cpu,
            gpu,
            status_line,
            transmitted,
            state: self.state,
        }
    }

    fn on_transport_failure(&mut self, reason: &str) {
        self.state = if self.options.keep_running_degraded {
            LoopState::Degraded
        } else {
            LoopState::Stopped
        };
        log::error!(
            "Serial transport failed, no further records will be sent (loop {}): {}",
            self.state,
            reason
        );

        if self.options.notifications_enabled {
            send_transport_failure(self.transport.port(), reason);
        }
    }

    /// Runs cycles until the process stop flag is set or the loop stops.
    pub fn run<F>(&mut self, observer: F) -> LoopState
    where
        F: FnMut(&CycleReport),
    {
        self.run_until(should_stop, observer)
    }

    /// Runs cycles until `stop` returns true or the loop stops. Cycles never
    /// overlap: the next one starts only after the previous one returned.
    pub fn run_until<S, F>(&mut self, stop: S, mut observer: F) -> LoopState
    where
        S: Fn() -> bool,
        F: FnMut(&CycleReport),
    {
        loop {
            let cycle_start = Instant::now();

            if stop() {
                log::info!("Sampling loop stop requested");
                break;
            }

            let report = self.run_cycle();
            observer(&report);

            if self.state == LoopState::Stopped {
                break;
            }

            self.sleep_until_next_cycle(cycle_start);
        }

        self.shutdown();
        self.state
    }

    fn sleep_until_next_cycle(&self, cycle_start: Instant) {
        let elapsed = cycle_start.elapsed();
        if elapsed < self.options.interval {
            std::thread::sleep(self.options.interval - elapsed);
        } else {
            log::warn!(
                "Cycle took {}ms, longer than the {}ms interval",
                elapsed.as_millis(),
                self.options.interval.as_millis()
            );
        }
    }

    pub fn shutdown(&mut self) {
        self.transport.close();
        if self.state != LoopState::Stopped {
            log::info!("Sampling loop {} after {} cycle(s)", LoopState::Stopped, self.cycles);
        }
        self.state = LoopState::Stopped;
    }
}

pub fn should_stop() -> bool {
    STOP_FLAG.load(Ordering::Relaxed)
}

pub fn set_stop_flag() {
    STOP_FLAG.store(true, Ordering::Relaxed);
}
