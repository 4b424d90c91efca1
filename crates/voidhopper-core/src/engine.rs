//! Simulation service - main entry point for driving passes

use crate::config::HopperConfig;
use crate::error::PersistenceError;
use crate::persistence::PersistenceStore;
use crate::registry::HopperRegistry;
use crate::systems::{transfer_pass, PassReport};
use crate::world::HostWorld;

/// "Run every N ticks after an initial delay" on the single logic thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedInterval {
    interval: u32,
    countdown: u32,
}

impl FixedInterval {
    pub fn new(initial_delay: u32, interval: u32) -> Self {
        Self {
            interval: interval.max(1),
            countdown: initial_delay,
        }
    }

    /// Advance one host tick; true when a pass is due on this tick
    pub fn advance(&mut self) -> bool {
        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown == 0 {
            self.countdown = self.interval;
            true
        } else {
            false
        }
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }
}

/// Owns the registry and the scheduler; the host calls [`tick`](Self::tick)
/// once per host tick and forwards placement/configuration events to the
/// registry.
pub struct HopperService {
    registry: HopperRegistry,
    config: HopperConfig,
    scheduler: FixedInterval,
    ticks: u64,
    passes: u64,
    totals: PassReport,
}

impl HopperService {
    /// Service with an in-memory registry and no file
    pub fn new(config: HopperConfig) -> Self {
        let registry = HopperRegistry::in_memory(config.max_links);
        Self::with_registry(registry, config)
    }

    /// Service whose registry is loaded from (and saved to) `config.data_file`
    pub fn open<W: HostWorld>(config: HopperConfig, world: &W) -> Result<Self, PersistenceError> {
        let store = PersistenceStore::new(config.data_file.clone());
        let registry =
            HopperRegistry::load(store, |name| world.world_exists(name), config.max_links)?;
        Ok(Self::with_registry(registry, config))
    }

    fn with_registry(registry: HopperRegistry, config: HopperConfig) -> Self {
        let scheduler = FixedInterval::new(config.initial_delay, config.tick_interval);
        Self {
            registry,
            config,
            scheduler,
            ticks: 0,
            passes: 0,
            totals: PassReport::default(),
        }
    }

    /// One host tick; runs a pass when the scheduler says so
    pub fn tick<W: HostWorld>(&mut self, world: &mut W) -> Option<PassReport> {
        self.ticks += 1;
        if self.scheduler.advance() {
            Some(self.simulate(world))
        } else {
            None
        }
    }

    /// Run one pass right now
    pub fn simulate<W: HostWorld>(&mut self, world: &mut W) -> PassReport {
        let report = transfer_pass(&mut self.registry, world, &self.config);
        self.passes += 1;
        self.totals.accumulate(&report);
        report
    }

    /// Controlled shutdown: final save. Returns whether it succeeded.
    pub fn shutdown(&mut self) -> bool {
        log::info!(
            "Shutting down: {} hoppers, {} passes, {} collected, {} voided",
            self.registry.len(),
            self.passes,
            self.totals.units_collected,
            self.totals.units_voided
        );
        self.registry.save()
    }

    pub fn registry(&self) -> &HopperRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut HopperRegistry {
        &mut self.registry
    }

    pub fn config(&self) -> &HopperConfig {
        &self.config
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Sum of every pass report so far
    pub fn totals(&self) -> &PassReport {
        &self.totals
    }
}
