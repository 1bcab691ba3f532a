use serde::{Deserialize, Serialize};

use crate::types::{
    BatteryInfoSnapshot, BatteryUpdate, CountersSnapshot, DaemonStatus, ErrorKind,
    RawInfoSnapshot, RawStatusSnapshot,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DaemonResponse {
    Status(DaemonStatus),
    Units(u32),
    BatteryInfo(BatteryInfoSnapshot),
    RawInfo(RawInfoSnapshot),
    RawStatus(RawStatusSnapshot),
    Counters(CountersSnapshot),
    Update(BatteryUpdate),
    Ok,
    Error { kind: ErrorKind, message: String },
    Subscribed,
    Unsubscribed,
    SubscriptionRejected { reason: String },
}

impl DaemonResponse {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        DaemonResponse::Error {
            kind,
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
