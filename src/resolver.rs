//! Per-metric provider chains with first-plausible-wins resolution.

use crate::hardware::HardwareContext;
use crate::providers::{
    is_plausible, Celsius, LibraryCpuProvider, LibraryGpuProvider, MetricKind, Provider,
    ThermalZoneProvider,
};
use std::collections::BTreeMap;

/// The accepted value for a metric and the provider that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<'p> {
    pub value: Celsius,
    pub provider: &'p str,
}

/// Ordered provider chains, one per [`MetricKind`].
///
/// Registration order is priority order. Resolution keeps no state between
/// calls, so resolving twice against unchanged sensors gives the same answer.
#[derive(Default)]
pub struct Resolver<'a> {
    chains: BTreeMap<MetricKind, Vec<Box<dyn Provider + 'a>>>,
}

impl<'a> Resolver<'a> {
    pub fn new() -> Self {
        Self {
            chains: BTreeMap::new(),
        }
    }

    /// Registers the startup list: CPU tries the ACPI thermal zone before the
    /// hardware monitor, GPU uses the hardware monitor only.
    pub fn with_default_providers(hardware: &'a HardwareContext) -> Self {
        let mut resolver = Self::new();
        resolver.register(ThermalZoneProvider::new());
        resolver.register(LibraryCpuProvider::new(hardware));
        resolver.register(LibraryGpuProvider::new(hardware));
        resolver
    }

    /// Appends `provider` to the chain for its metric.
    pub fn register(&mut self, provider: impl Provider + 'a) {
        let kind = provider.kind();
        log::debug!("Registered {} provider '{}'", kind, provider.name());
        self.chains.entry(kind).or_default().push(Box::new(provider));
    }

    pub fn providers(&self, kind: MetricKind) -> Vec<&str> {
        self.chains
            .get(&kind)
            .map(|chain| chain.iter().map(|p| p.name()).collect())
            .unwrap_or_default()
    }

    pub fn resolve(&self, kind: MetricKind) -> Option<Celsius> {
        self.resolve_detailed(kind).map(|r| r.value)
    }

    pub fn resolve_detailed(&self, kind: MetricKind) -> Option<Resolution<'_>> {
        let chain = self.chains.get(&kind)?;

        for provider in chain {
            let reading = provider.sample();
            if is_plausible(reading) {
                let value = reading?;
                log::trace!("{} resolved by '{}': {:.1}", kind, provider.name(), value);
                return Some(Resolution {
                    value,
                    provider: provider.name(),
                });
            }
            log::debug!(
                "{} provider '{}' gave no plausible reading ({:?}), falling back",
                kind,
                provider.name(),
                reading
            );
        }

        None
    }
}
