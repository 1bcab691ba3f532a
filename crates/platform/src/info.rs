//! Static per-device readings.

use serde::{Deserialize, Serialize};

use crate::types::{BatteryChemistry, BatteryTechnology, PowerUnit};

/// Battery information block. Changes rarely (on insertion or recalibration).
///
/// Capacities are in [`RawInfo::units`], voltages in mV.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawInfo {
    pub units: PowerUnit,

    /// Factory design capacity.
    pub design_capacity: Option<u32>,

    /// Capacity at the last full charge. Zero means the block is uninitialized.
    pub last_full_capacity: u32,

    pub technology: BatteryTechnology,

    pub design_voltage: Option<u32>,

    /// Capacity at which the platform warns the user.
    pub warning_capacity: Option<u32>,

    /// Capacity at which the platform considers the battery low.
    pub low_capacity: Option<u32>,

    pub model: Option<String>,

    pub serial: Option<String>,

    pub chemistry: BatteryChemistry,

    pub oem_info: Option<String>,
}

impl RawInfo {
    /// Whether the block holds a usable full-charge capacity.
    pub fn is_valid(&self) -> bool {
        self.last_full_capacity != 0
    }

    /// Health as a percentage of design capacity, when both are known.
    pub fn health_percent(&self) -> Option<f32> {
        match self.design_capacity {
            Some(design) if design > 0 && self.is_valid() => {
                Some(self.last_full_capacity as f32 / design as f32 * 100.0)
            }
            _ => None,
        }
    }
}
