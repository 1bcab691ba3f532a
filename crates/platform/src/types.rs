//! Shared types for raw battery readings.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Raw firmware value meaning "unknown" for capacity, rate and voltage readings.
pub const UNKNOWN_VALUE: u32 = 0xFFFF_FFFF;

bitflags! {
    /// Battery state bits as reported by the firmware status block.
    ///
    /// Unknown bits are retained so that out-of-range readings can be
    /// rejected by [`crate::RawStatus::is_valid`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct BatteryState: u32 {
        const DISCHARGING = 0x0001;
        const CHARGING = 0x0002;
        const CRITICAL = 0x0004;
        /// All state bits set. Reported for slots with no usable battery.
        const NOT_PRESENT = Self::DISCHARGING.bits() | Self::CHARGING.bits() | Self::CRITICAL.bits();
    }
}

impl BatteryState {
    /// First raw value that is out of range for a status reading.
    pub const MAX: u32 = 0x0007;

    /// Returns a human-readable label for the state.
    pub fn label(&self) -> &'static str {
        if *self == BatteryState::NOT_PRESENT {
            return "Not Present";
        }
        let critical = self.contains(BatteryState::CRITICAL);
        match (
            self.contains(BatteryState::DISCHARGING),
            self.contains(BatteryState::CHARGING),
        ) {
            (true, true) => "Invalid",
            (true, false) if critical => "Critical",
            (true, false) => "Discharging",
            (false, true) if critical => "Charging (Critical)",
            (false, true) => "Charging",
            (false, false) if critical => "Critical",
            (false, false) => "High",
        }
    }

    /// Returns true if the battery is currently charging.
    pub fn is_charging(&self) -> bool {
        self.contains(BatteryState::CHARGING)
    }

    /// Returns true if the battery is discharging (on battery power).
    pub fn is_discharging(&self) -> bool {
        self.contains(BatteryState::DISCHARGING)
    }
}

impl Default for BatteryState {
    fn default() -> Self {
        BatteryState::NOT_PRESENT
    }
}

impl fmt::Display for BatteryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Unit family used by a device for its capacity and rate readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUnit {
    /// Capacity in mWh, rate in mW.
    #[default]
    MilliWatt,
    /// Capacity in mAh, rate in mA.
    MilliAmp,
}

impl PowerUnit {
    pub fn capacity_suffix(&self) -> &'static str {
        match self {
            PowerUnit::MilliWatt => "mWh",
            PowerUnit::MilliAmp => "mAh",
        }
    }
}

/// Whether the cell can be recharged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatteryTechnology {
    /// Non-rechargeable.
    Primary,
    /// Rechargeable.
    #[default]
    Secondary,
}

impl BatteryTechnology {
    pub fn label(&self) -> &'static str {
        match self {
            BatteryTechnology::Primary => "Primary",
            BatteryTechnology::Secondary => "Secondary",
        }
    }
}

/// Battery chemistry type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatteryChemistry {
    /// Lithium-ion
    LithiumIon,
    /// Lithium-polymer
    LithiumPolymer,
    /// Nickel-metal hydride
    NickelMetalHydride,
    /// Nickel-cadmium
    NickelCadmium,
    /// Lead-acid
    LeadAcid,
    /// Unknown or unsupported chemistry
    #[default]
    Unknown,
}

impl BatteryChemistry {
    /// Returns a short label for the chemistry.
    pub fn label(&self) -> &'static str {
        match self {
            BatteryChemistry::LithiumIon => "Li-ion",
            BatteryChemistry::LithiumPolymer => "Li-poly",
            BatteryChemistry::NickelMetalHydride => "NiMH",
            BatteryChemistry::NickelCadmium => "NiCd",
            BatteryChemistry::LeadAcid => "Lead-acid",
            BatteryChemistry::Unknown => "Unknown",
        }
    }

    /// Parses the free-form technology strings used by firmware and sysfs.
    pub fn from_label(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "li-ion" | "lion" | "lithium-ion" => BatteryChemistry::LithiumIon,
            "li-poly" | "lipo" | "lip" | "lithium-polymer" => BatteryChemistry::LithiumPolymer,
            "nimh" | "ni-mh" => BatteryChemistry::NickelMetalHydride,
            "nicd" | "ni-cd" => BatteryChemistry::NickelCadmium,
            "pbac" | "lead-acid" => BatteryChemistry::LeadAcid,
            _ => BatteryChemistry::Unknown,
        }
    }
}

impl fmt::Display for BatteryChemistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(feature = "system")]
impl From<starship_battery::Technology> for BatteryChemistry {
    fn from(tech: starship_battery::Technology) -> Self {
        match tech {
            starship_battery::Technology::LithiumIon => BatteryChemistry::LithiumIon,
            starship_battery::Technology::LithiumPolymer => BatteryChemistry::LithiumPolymer,
            starship_battery::Technology::NickelMetalHydride => {
                BatteryChemistry::NickelMetalHydride
            }
            starship_battery::Technology::NickelCadmium => BatteryChemistry::NickelCadmium,
            starship_battery::Technology::LeadAcid => BatteryChemistry::LeadAcid,
            _ => BatteryChemistry::Unknown,
        }
    }
}

#[cfg(feature = "system")]
impl From<starship_battery::State> for BatteryState {
    fn from(state: starship_battery::State) -> Self {
        match state {
            starship_battery::State::Charging => BatteryState::CHARGING,
            starship_battery::State::Discharging => BatteryState::DISCHARGING,
            starship_battery::State::Empty => BatteryState::DISCHARGING | BatteryState::CRITICAL,
            starship_battery::State::Full | starship_battery::State::Unknown => {
                BatteryState::empty()
            }
        }
    }
}

/// Maps a raw firmware word to `None` when it holds the unknown marker.
pub(crate) fn known(value: u32) -> Option<u32> {
    (value != UNKNOWN_VALUE).then_some(value)
}
