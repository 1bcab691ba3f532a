//! Normalized output of an aggregation.

use std::fmt;

use battinfo_platform::{BatteryState, DeviceId};
use serde::{Deserialize, Serialize};

/// Which battery a query is about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Target {
    /// Composite reading over every valid battery.
    #[default]
    All,
    Device(DeviceId),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::All => f.write_str("all"),
            Target::Device(device) => write!(f, "{device}"),
        }
    }
}

/// Normalized battery reading for one device or the whole system.
///
/// `None` means unknown. Use the `*_raw` accessors for the `-1` encoding
/// expected by counters and the control channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedInfo {
    /// Remaining capacity, 0-100.
    pub capacity_percent: Option<u8>,

    /// Linear estimate of minutes until empty.
    pub minutes_remaining: Option<u32>,

    pub state: BatteryState,

    /// Discharge rate in device units per hour.
    pub rate: Option<u32>,
}

impl Default for NormalizedInfo {
    fn default() -> Self {
        Self::not_present()
    }
}

impl NormalizedInfo {
    /// Reading for a slot without a usable battery.
    pub const fn not_present() -> Self {
        Self {
            capacity_percent: None,
            minutes_remaining: None,
            state: BatteryState::NOT_PRESENT,
            rate: None,
        }
    }

    pub fn capacity_raw(&self) -> i32 {
        self.capacity_percent.map_or(-1, i32::from)
    }

    pub fn minutes_raw(&self) -> i64 {
        self.minutes_remaining.map_or(-1, i64::from)
    }

    pub fn rate_raw(&self) -> i64 {
        self.rate.map_or(-1, i64::from)
    }

    /// Format time remaining as a human-readable string.
    pub fn time_remaining_formatted(&self) -> Option<String> {
        let total_mins = self.minutes_remaining?;
        let hours = total_mins / 60;
        let mins = total_mins % 60;

        if hours > 0 {
            Some(format!("{}h {}m", hours, mins))
        } else {
            Some(format!("{}m", mins))
        }
    }
}
