//! Raw battery readings and device sources for battinfo.
//!
//! This crate provides the firmware-level data model (status and info
//! blocks), their validity checks, and the [`BatterySource`] trait with
//! platform-specific implementations.
//!
//! # Features
//!
//! - `sysfs` - Linux `power_supply` class reader
//! - `system` - Cross-platform reader backed by `starship-battery`
//!
//! # Example
//!
//! ```ignore
//! use battinfo_platform::{BatterySource, SysfsSource};
//!
//! let source = SysfsSource::new();
//! for device in source.list_devices()? {
//!     let status = source.fetch_status(&device)?;
//!     println!("{device}: {} valid={}", status.state, status.is_valid());
//! }
//! ```

mod info;
mod memory;
mod source;
mod status;
mod types;

#[cfg(feature = "sysfs")]
mod sysfs;

#[cfg(feature = "system")]
mod system;

pub use info::RawInfo;
pub use memory::{Fault, MemoryDevice, MemorySource};
pub use source::{BatterySource, DeviceId, SourceError};
pub use status::RawStatus;
pub use types::{BatteryChemistry, BatteryState, BatteryTechnology, PowerUnit, UNKNOWN_VALUE};

#[cfg(feature = "sysfs")]
pub use sysfs::{SysfsSource, POWER_SUPPLY_PATH};

#[cfg(feature = "system")]
pub use system::SystemSource;
