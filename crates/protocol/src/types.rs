use serde::{Deserialize, Serialize};

use crate::version::{MIN_SUPPORTED_VERSION, PROTOCOL_VERSION};

pub const MAX_SUBSCRIBERS: usize = 8;

/// Firmware word meaning "unknown" in raw status snapshots.
pub const UNKNOWN_VALUE: u32 = 0xFFFF_FFFF;

/// Battery addressed by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnitSelector {
    #[default]
    All,
    Unit(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NoDevices,
    DeviceGone,
    NoSuchDevice,
    InvalidArgument,
    Transport,
    Internal,
}

/// Normalized reading. `-1` marks unknown capacity, minutes and rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryInfoSnapshot {
    pub cap: i32,
    pub min: i64,
    pub state: u32,
    pub rate: i64,
    pub state_label: String,
    #[serde(default)]
    pub time_remaining_formatted: Option<String>,
}

impl Default for BatteryInfoSnapshot {
    fn default() -> Self {
        Self {
            cap: -1,
            min: -1,
            state: 0x7,
            rate: -1,
            state_label: "Not Present".to_string(),
            time_remaining_formatted: None,
        }
    }
}

/// Status block as firmware words, `UNKNOWN_VALUE` for unknown readings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawStatusSnapshot {
    pub device: String,
    pub state: u32,
    pub rate: u32,
    pub cap: u32,
    pub volt: u32,
    #[serde(default)]
    pub valid: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RawInfoSnapshot {
    pub device: String,
    /// Capacity unit suffix, `mWh` or `mAh`.
    pub units: String,
    pub dcap: Option<u32>,
    pub lfcap: u32,
    pub technology: String,
    pub dvol: Option<u32>,
    pub wcap: Option<u32>,
    pub lcap: Option<u32>,
    pub model: Option<String>,
    pub serial: Option<String>,
    pub chemistry: String,
    pub oeminfo: Option<String>,
    #[serde(default)]
    pub valid: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CountersSnapshot {
    pub life: i32,
    pub time: i64,
    pub state: u32,
    pub units: u32,
    pub info_expire: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatteryUpdate {
    pub timestamp: i64,
    pub info: BatteryInfoSnapshot,
}

impl Default for BatteryUpdate {
    fn default() -> Self {
        Self {
            timestamp: chrono::Utc::now().timestamp(),
            info: BatteryInfoSnapshot::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonStatus {
    pub running: bool,
    pub uptime_secs: u64,
    pub version: String,
    pub source: String,
    pub units: u32,
    pub subscriber_count: usize,
    pub info_expire_secs: u64,
    #[serde(default)]
    pub cache_age_ms: Option<u64>,
    #[serde(default = "default_protocol_version")]
    pub protocol_version: u32,
    #[serde(default = "default_min_supported_version")]
    pub min_supported_version: u32,
}

fn default_protocol_version() -> u32 {
    PROTOCOL_VERSION
}

fn default_min_supported_version() -> u32 {
    MIN_SUPPORTED_VERSION
}

impl Default for DaemonStatus {
    fn default() -> Self {
        Self {
            running: false,
            uptime_secs: 0,
            version: String::new(),
            source: String::new(),
            units: 0,
            subscriber_count: 0,
            info_expire_secs: 5,
            cache_age_ms: None,
            protocol_version: PROTOCOL_VERSION,
            min_supported_version: MIN_SUPPORTED_VERSION,
        }
    }
}
