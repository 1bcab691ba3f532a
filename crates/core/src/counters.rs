//! Read-only monitoring counters over the system-wide reading.

use std::sync::{Arc, Mutex, PoisonError};

use battinfo_platform::BatterySource;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::aggregator::Aggregator;
use crate::error::{AggregateError, Result};
use crate::info::{NormalizedInfo, Target};

/// All counters captured from one aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub life: i32,
    pub time: i64,
    pub state: u32,
    pub units: usize,
    pub info_expire: u64,
}

impl CounterSnapshot {
    /// Counter names in display order.
    pub const NAMES: [&'static str; 5] = ["life", "time", "state", "units", "info_expire"];

    /// Looks up one counter by name.
    pub fn value(&self, name: &str) -> Result<i64> {
        match name {
            "life" => Ok(i64::from(self.life)),
            "time" => Ok(self.time),
            "state" => Ok(i64::from(self.state)),
            "units" => Ok(i64::try_from(self.units).unwrap_or(i64::MAX)),
            "info_expire" => Ok(i64::try_from(self.info_expire).unwrap_or(i64::MAX)),
            other => Err(AggregateError::InvalidArgument(format!(
                "unknown counter {other:?}"
            ))),
        }
    }
}

/// Counters mirroring the latest all-units reading.
///
/// Each read of `life`, `time` or `state` re-runs the aggregation, so the
/// values are never older than the read itself. When an aggregation fails
/// the previous reading is served.
pub struct BatteryCounters<S> {
    aggregator: Arc<Aggregator<S>>,
    last: Mutex<NormalizedInfo>,
}

impl<S: BatterySource> BatteryCounters<S> {
    pub fn new(aggregator: Arc<Aggregator<S>>) -> Self {
        Self {
            aggregator,
            last: Mutex::new(NormalizedInfo::not_present()),
        }
    }

    /// Remaining capacity percent, or -1.
    pub fn life(&self) -> i32 {
        self.refresh().capacity_raw()
    }

    /// Minutes remaining, or -1.
    pub fn time(&self) -> i64 {
        self.refresh().minutes_raw()
    }

    /// Combined state bits.
    pub fn state(&self) -> u32 {
        self.refresh().state.bits()
    }

    pub fn units(&self) -> usize {
        self.aggregator.unit_count()
    }

    pub fn info_expire(&self) -> u64 {
        self.aggregator.config().info_expire_secs
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        let info = self.refresh();
        CounterSnapshot {
            life: info.capacity_raw(),
            time: info.minutes_raw(),
            state: info.state.bits(),
            units: self.units(),
            info_expire: self.info_expire(),
        }
    }

    fn refresh(&self) -> NormalizedInfo {
        let computed = self.aggregator.battery_info(&Target::All);
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        match computed {
            Ok(info) => {
                *last = info;
                info
            }
            Err(e) => {
                warn!(error = %e, "Battery counters refresh failed, serving last reading");
                *last
            }
        }
    }
}
