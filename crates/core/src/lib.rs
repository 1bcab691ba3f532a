//! Multi-battery aggregation for battinfo.
//!
//! The [`Aggregator`] turns the raw status and info blocks of every battery
//! a [`battinfo_platform::BatterySource`] exposes into one
//! [`NormalizedInfo`]: either a single battery's reading or a system-wide
//! composite (average capacity, total minutes, combined state).
//!
//! # Example
//!
//! ```ignore
//! use battinfo_core::{Aggregator, AggregatorConfig, Target};
//! use battinfo_platform::SysfsSource;
//!
//! let aggregator = Aggregator::new(SysfsSource::new(), AggregatorConfig::default());
//! let info = aggregator.battery_info(&Target::All)?;
//! println!("{}% ({})", info.capacity_raw(), info.state);
//! ```

mod aggregator;
mod counters;
mod error;
mod info;

pub use aggregator::{Aggregator, AggregatorConfig, DEFAULT_INFO_EXPIRE_SECS};
pub use counters::{BatteryCounters, CounterSnapshot};
pub use error::{AggregateError, Result};
pub use info::{NormalizedInfo, Target};
