//! Dynamic per-device readings.

use serde::{Deserialize, Serialize};

use crate::types::{known, BatteryState, UNKNOWN_VALUE};

/// Battery status block, refreshed on every query.
///
/// Capacity and rate are in the device's [`crate::PowerUnit`]s, voltage in mV.
/// `None` marks a reading the firmware reported as unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawStatus {
    pub state: BatteryState,

    /// Present discharge/charge rate. `Some(0)` when idle.
    pub rate: Option<u32>,

    pub remaining_capacity: Option<u32>,

    pub present_voltage: Option<u32>,
}

impl RawStatus {
    /// Builds a status from raw firmware words, mapping the unknown marker to `None`.
    pub fn from_firmware(state: u32, rate: u32, remaining_capacity: u32, voltage: u32) -> Self {
        Self {
            state: BatteryState::from_bits_retain(state),
            rate: known(rate),
            remaining_capacity: known(remaining_capacity),
            present_voltage: known(voltage),
        }
    }

    /// Returns the raw firmware words in `(state, rate, capacity, voltage)` order.
    pub fn to_firmware(&self) -> (u32, u32, u32, u32) {
        (
            self.state.bits(),
            self.rate.unwrap_or(UNKNOWN_VALUE),
            self.remaining_capacity.unwrap_or(UNKNOWN_VALUE),
            self.present_voltage.unwrap_or(UNKNOWN_VALUE),
        )
    }

    /// Whether the reading can be trusted.
    ///
    /// Batteries that are not really installed tend to report an
    /// out-of-range state or unknown capacity/voltage.
    pub fn is_valid(&self) -> bool {
        self.state.bits() < BatteryState::MAX
            && self.remaining_capacity.is_some()
            && self.present_voltage.is_some()
    }

    /// Rate to count towards the system discharge rate, if any.
    pub fn discharge_rate(&self) -> Option<u32> {
        match self.rate {
            Some(rate) if rate > 0 && self.state.is_discharging() => Some(rate),
            _ => None,
        }
    }
}
