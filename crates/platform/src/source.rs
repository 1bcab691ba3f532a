//! Device source trait and shared identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::info::RawInfo;
use crate::status::RawStatus;

/// Stable name of a battery device, e.g. `BAT0`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("device {0} is gone")]
    Gone(DeviceId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse {what}: {reason}")]
    Parse { what: String, reason: String },

    #[error("source unavailable: {0}")]
    Unavailable(String),
}

impl SourceError {
    /// Whether the error means the device vanished after enumeration.
    pub fn is_gone(&self) -> bool {
        matches!(self, SourceError::Gone(_))
    }
}

pub type Result<T> = std::result::Result<T, SourceError>;

/// Transport that enumerates battery devices and fetches their raw readings.
///
/// Implementations are queried sequentially by the aggregator and must be
/// shareable across threads.
pub trait BatterySource: Send + Sync {
    /// Short identifier used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Lists battery devices in a stable order. An empty list is valid.
    fn list_devices(&self) -> Result<Vec<DeviceId>>;

    /// Whether the device can still be resolved.
    fn exists(&self, device: &DeviceId) -> bool;

    /// Whether a battery is physically installed in the slot.
    fn is_present(&self, device: &DeviceId) -> bool;

    fn fetch_status(&self, device: &DeviceId) -> Result<RawStatus>;

    fn fetch_info(&self, device: &DeviceId) -> Result<RawInfo>;
}

impl<S: BatterySource + ?Sized> BatterySource for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn list_devices(&self) -> Result<Vec<DeviceId>> {
        (**self).list_devices()
    }

    fn exists(&self, device: &DeviceId) -> bool {
        (**self).exists(device)
    }

    fn is_present(&self, device: &DeviceId) -> bool {
        (**self).is_present(device)
    }

    fn fetch_status(&self, device: &DeviceId) -> Result<RawStatus> {
        (**self).fetch_status(device)
    }

    fn fetch_info(&self, device: &DeviceId) -> Result<RawInfo> {
        (**self).fetch_info(device)
    }
}
