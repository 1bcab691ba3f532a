mod request;
mod response;
mod types;
mod version;

pub use request::DaemonRequest;
pub use response::DaemonResponse;
pub use types::{
    BatteryInfoSnapshot, BatteryUpdate, CountersSnapshot, DaemonStatus, ErrorKind,
    RawInfoSnapshot, RawStatusSnapshot, UnitSelector, MAX_SUBSCRIBERS, UNKNOWN_VALUE,
};
pub use version::{MIN_SUPPORTED_VERSION, PROTOCOL_VERSION};
