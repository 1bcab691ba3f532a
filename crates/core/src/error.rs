use battinfo_platform::{DeviceId, SourceError};

#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("no battery devices")]
    NoDevices,

    #[error("battery {0} disappeared during the query")]
    DeviceGone(DeviceId),

    #[error("no such battery: {0}")]
    NoSuchDevice(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("transport error: {0}")]
    Source(#[source] SourceError),
}

impl From<SourceError> for AggregateError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Gone(device) => AggregateError::DeviceGone(device),
            other => AggregateError::Source(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, AggregateError>;
