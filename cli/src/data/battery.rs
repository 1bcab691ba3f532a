use std::sync::Arc;

use battinfo_core::{Aggregator, AggregatorConfig, BatteryCounters, Result, Target};
use battinfo_platform::{BatterySource, DeviceId, RawInfo, RawStatus};
use battinfo_protocol::{
    BatteryInfoSnapshot, CountersSnapshot, RawInfoSnapshot, RawStatusSnapshot, UnitSelector,
};

use super::snapshot::{
    battery_info_snapshot, counters_snapshot, raw_info_snapshot, raw_status_snapshot,
};

/// Unit-addressed battery queries answered with wire snapshots.
///
/// Shared by the one-shot commands and the daemon so both report the same
/// readings for the same source.
pub struct BatteryData {
    aggregator: Arc<Aggregator<Box<dyn BatterySource>>>,
    counters: BatteryCounters<Box<dyn BatterySource>>,
}

impl BatteryData {
    pub fn new(source: Box<dyn BatterySource>, config: AggregatorConfig) -> Self {
        let aggregator = Arc::new(Aggregator::new(source, config));
        let counters = BatteryCounters::new(Arc::clone(&aggregator));
        Self {
            aggregator,
            counters,
        }
    }

    pub fn source_name(&self) -> &'static str {
        self.aggregator.source().name()
    }

    pub fn info_expire_secs(&self) -> u64 {
        self.aggregator.config().info_expire_secs
    }

    pub fn units(&self) -> u32 {
        u32::try_from(self.aggregator.unit_count()).unwrap_or(u32::MAX)
    }

    pub fn devices(&self) -> Result<Vec<DeviceId>> {
        self.aggregator.devices()
    }

    pub fn battery_info(&self, unit: UnitSelector) -> Result<BatteryInfoSnapshot> {
        let target = match unit {
            UnitSelector::All => Target::All,
            UnitSelector::Unit(unit) => Target::Device(self.aggregator.device_at(unit as usize)?),
        };
        let info = self.aggregator.battery_info(&target)?;
        Ok(battery_info_snapshot(&info))
    }

    pub fn raw_info(&self, unit: u32) -> Result<RawInfoSnapshot> {
        let device = self.aggregator.device_at(unit as usize)?;
        let info = self.aggregator.raw_info(&device)?;
        Ok(raw_info_snapshot(&device, &info))
    }

    pub fn raw_status(&self, unit: u32) -> Result<RawStatusSnapshot> {
        let device = self.aggregator.device_at(unit as usize)?;
        let status = self.aggregator.raw_status(&device)?;
        Ok(raw_status_snapshot(&device, &status))
    }

    /// Raw readings for a device by name, for diagnostics.
    pub fn raw_device(&self, device: &DeviceId) -> (Result<RawStatus>, Result<RawInfo>) {
        (
            self.aggregator.raw_status(device),
            self.aggregator.raw_info(device),
        )
    }

    pub fn counters(&self) -> CountersSnapshot {
        counters_snapshot(&self.counters.snapshot())
    }
}
