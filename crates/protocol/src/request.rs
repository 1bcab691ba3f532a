use serde::{Deserialize, Serialize};

use crate::types::UnitSelector;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DaemonRequest {
    GetStatus,
    GetUnits,
    GetBatteryInfo { unit: UnitSelector },
    GetRawInfo { unit: u32 },
    GetRawStatus { unit: u32 },
    GetCounters,
    Subscribe,
    Unsubscribe,
    Shutdown,
}

impl DaemonRequest {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
