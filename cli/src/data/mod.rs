mod battery;
mod snapshot;
mod source;

pub use battery::BatteryData;
pub use snapshot::{
    battery_info_snapshot, counters_from_wire, counters_snapshot, error_kind, raw_info_snapshot,
    raw_status_snapshot,
};
pub use source::{open_source, SourceOptions};
