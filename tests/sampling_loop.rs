use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thermal_relay::daemon::{LoopOptions, LoopState, SamplingLoop};
use thermal_relay::hardware::{HardwareBlock, HardwareContext, HardwareKind, Sensor};
use thermal_relay::providers::{
    LibraryCpuProvider, LibraryGpuProvider, ThermalZoneProvider, ThermalZoneQuery, ThermalZoneRow,
};
use thermal_relay::serial::discovery::select_port;
use thermal_relay::serial::fake::FakeSerialPort;
use thermal_relay::serial::{Transport, TransportState};
use thermal_relay::{Celsius, Error, MetricKind, Provider, Resolver, Result};

/// Replays one reading per call; repeats the last one when the script runs out.
struct Scripted {
    kind: MetricKind,
    script: Mutex<VecDeque<Option<Celsius>>>,
    last: Mutex<Option<Celsius>>,
    calls: Arc<Mutex<usize>>,
}

impl Scripted {
    fn new(kind: MetricKind, script: &[Option<Celsius>]) -> Self {
        Self {
            kind,
            script: Mutex::new(script.iter().copied().collect()),
            last: Mutex::new(None),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    fn calls(&self) -> Arc<Mutex<usize>> {
        self.calls.clone()
    }
}

impl Provider for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    fn kind(&self) -> MetricKind {
        self.kind
    }

    fn read(&self) -> Result<Option<Celsius>> {
        *self.calls.lock().unwrap() += 1;
        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.script.lock().unwrap().pop_front() {
            *last = next;
        }
        Ok(*last)
    }
}

struct Zones(Vec<i64>);

impl ThermalZoneQuery for Zones {
    fn query(&self) -> Result<Vec<ThermalZoneRow>> {
        Ok(self
            .0
            .iter()
            .map(|&raw| ThermalZoneRow { current_temperature: raw })
            .collect())
    }
}

struct Block {
    kind: HardwareKind,
    sensors: Vec<Sensor>,
}

impl HardwareBlock for Block {
    fn kind(&self) -> HardwareKind {
        self.kind
    }

    fn name(&self) -> String {
        format!("{}", self.kind)
    }

    fn refresh(&self) {}

    fn sensors(&self) -> Vec<Sensor> {
        self.sensors.clone()
    }
}

fn options() -> LoopOptions {
    LoopOptions {
        interval: Duration::from_millis(1),
        keep_running_degraded: true,
        notifications_enabled: false,
    }
}

fn hardware(cpu: f32, gpu: f32) -> HardwareContext {
    HardwareContext::from_blocks(vec![
        Box::new(Block {
            kind: HardwareKind::Cpu,
            sensors: vec![
                Sensor::temperature("CCD1", Some(61.0)),
                Sensor::temperature("CPU Package", Some(cpu)),
            ],
        }),
        Box::new(Block {
            kind: HardwareKind::GpuAmd,
            sensors: vec![Sensor::temperature("edge", Some(gpu))],
        }),
    ])
}

#[test]
fn thermal_zone_without_reading_falls_back_to_hardware_monitor() {
    let hw = hardware(40.2, 55.0);
    let mut resolver = Resolver::new();
    resolver.register(ThermalZoneProvider::with_query(Zones(vec![0])));
    resolver.register(LibraryCpuProvider::new(&hw));
    resolver.register(LibraryGpuProvider::new(&hw));

    let resolution = resolver.resolve_detailed(MetricKind::Cpu).unwrap();
    assert_eq!(resolution.value, 40.2);
    assert_eq!(resolution.provider, "hwmon-cpu");
    assert_eq!(resolver.resolve(MetricKind::Gpu), Some(55.0));
}

#[test]
fn sub_zero_thermal_zone_is_rejected() {
    let hw = hardware(38.0, 55.0);
    let mut resolver = Resolver::new();
    // -5.0 °C
    resolver.register(ThermalZoneProvider::with_query(Zones(vec![2682])));
    resolver.register(LibraryCpuProvider::new(&hw));

    assert_eq!(resolver.resolve(MetricKind::Cpu), Some(38.0));
}

#[test]
fn plausible_thermal_zone_wins() {
    let hw = hardware(38.0, 55.0);
    let mut resolver = Resolver::new();
    // 318.2 K, 45.05 °C
    resolver.register(ThermalZoneProvider::with_query(Zones(vec![3182, 3500])));
    resolver.register(LibraryCpuProvider::new(&hw));

    let resolution = resolver.resolve_detailed(MetricKind::Cpu).unwrap();
    assert!((resolution.value - 45.05).abs() < 0.01);
    assert_eq!(resolution.provider, "acpi-thermal-zone");
}

#[test]
fn hardware_backed_loop_sends_formatted_records() {
    let hw = hardware(42.34, 55.71);
    let fake = FakeSerialPort::new();
    let port = fake.clone();

    let mut resolver = Resolver::new();
    resolver.register(ThermalZoneProvider::with_query(Zones(Vec::new())));
    resolver.register(LibraryCpuProvider::new(&hw));
    resolver.register(LibraryGpuProvider::new(&hw));

    let mut sampler =
        SamplingLoop::initialize(resolver, || Ok(Transport::from_writer("fake0", port)), options()).unwrap();

    let report = sampler.run_cycle();
    assert_eq!(report.cpu, Some(42.34));
    assert_eq!(report.gpu, Some(55.71));
    assert!(report.transmitted);
    assert_eq!(fake.raw(), b"42.3,55.7\n".to_vec());
}

#[test]
fn missing_gpu_means_no_write_even_with_cpu() {
    let fake = FakeSerialPort::new();
    let port = fake.clone();

    let mut resolver = Resolver::new();
    resolver.register(Scripted::new(MetricKind::Cpu, &[Some(41.0)]));
    resolver.register(Scripted::new(MetricKind::Gpu, &[None]));
    resolver.register(Scripted::new(MetricKind::Gpu, &[Some(0.0)]));

    let mut sampler =
        SamplingLoop::initialize(resolver, || Ok(Transport::from_writer("fake0", port)), options()).unwrap();

    let report = sampler.run_cycle();
    assert_eq!(report.cpu, Some(41.0));
    assert_eq!(report.gpu, None);
    assert!(!report.transmitted);
    assert_eq!(report.status_line, "CPU: 41.0°C | GPU: --");
    assert!(fake.raw().is_empty());
}

#[test]
fn write_failure_degrades_but_keeps_resolving() {
    let fake = FakeSerialPort::failing_after(2);
    let port = fake.clone();

    let cpu = Scripted::new(MetricKind::Cpu, &[Some(40.0), Some(41.0), Some(42.0), Some(43.0)]);
    let gpu = Scripted::new(MetricKind::Gpu, &[Some(50.0)]);
    let cpu_calls = cpu.calls();
    let gpu_calls = gpu.calls();

    let mut resolver = Resolver::new();
    resolver.register(cpu);
    resolver.register(gpu);

    let mut sampler =
        SamplingLoop::initialize(resolver, || Ok(Transport::from_writer("fake0", port)), options()).unwrap();

    let states: Vec<_> = (0..4).map(|_| sampler.run_cycle()).collect();
    assert!(states[0].transmitted);
    assert!(states[1].transmitted);
    assert!(!states[2].transmitted);
    assert_eq!(states[2].state, LoopState::Degraded);
    assert_eq!(states[3].cpu, Some(43.0));
    assert!(!states[3].transmitted);

    assert_eq!(*cpu_calls.lock().unwrap(), 4);
    assert_eq!(*gpu_calls.lock().unwrap(), 4);
    assert_eq!(fake.lines(), vec!["40.0,50.0", "41.0,50.0"]);
    assert_eq!(fake.write_attempts(), 3);
    assert_eq!(sampler.transport_state(), TransportState::Failed);
}

#[test]
fn run_until_drives_cycles_and_shuts_down() {
    let fake = FakeSerialPort::new();
    let port = fake.clone();

    let mut resolver = Resolver::new();
    resolver.register(Scripted::new(MetricKind::Cpu, &[Some(40.0)]));
    resolver.register(Scripted::new(MetricKind::Gpu, &[Some(50.0)]));

    let mut sampler =
        SamplingLoop::initialize(resolver, || Ok(Transport::from_writer("fake0", port)), options()).unwrap();

    let mut seen = Vec::new();
    let count = Arc::new(Mutex::new(0u64));
    let stop_count = count.clone();
    let state = sampler.run_until(
        || *stop_count.lock().unwrap() >= 2,
        |report| {
            *count.lock().unwrap() = report.cycle;
            seen.push(report.status_line.clone());
        },
    );

    assert_eq!(state, LoopState::Stopped);
    assert_eq!(seen, vec!["CPU: 40.0°C | GPU: 50.0°C"; 2]);
    assert_eq!(fake.lines().len(), 2);
    assert_eq!(sampler.transport_state(), TransportState::Closed);
}

#[test]
fn no_ports_never_reaches_running() {
    let result = SamplingLoop::<FakeSerialPort>::initialize(
        Resolver::new(),
        || {
            let port = select_port(&[], None, |_| Some(0))?;
            Ok(Transport::from_writer(port, FakeSerialPort::new()))
        },
        options(),
    );
    assert!(matches!(result, Err(Error::PortUnavailable(_))));
}
