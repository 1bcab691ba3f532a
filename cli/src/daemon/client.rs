use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

use battinfo_protocol::{
    BatteryInfoSnapshot, BatteryUpdate, CountersSnapshot, DaemonRequest, DaemonResponse,
    DaemonStatus, ErrorKind, RawInfoSnapshot, RawStatusSnapshot, UnitSelector,
    MIN_SUPPORTED_VERSION, PROTOCOL_VERSION,
};

use crate::daemon::socket_path;

#[derive(Debug, Clone)]
pub struct VersionMismatchError {
    pub client_protocol_version: u32,
    pub client_min_supported: u32,
    pub daemon_protocol_version: u32,
    pub daemon_min_supported: u32,
    pub daemon_binary_version: String,
    pub kind: VersionMismatchKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionMismatchKind {
    ClientTooOld,
    DaemonTooOld,
}

impl std::fmt::Display for VersionMismatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            VersionMismatchKind::ClientTooOld => {
                write!(
                    f,
                    "Protocol version mismatch: client uses protocol v{}, but daemon (v{}) requires v{}+.\n\n\
                    Please update battinfo.",
                    self.client_protocol_version,
                    self.daemon_binary_version,
                    self.daemon_min_supported
                )
            }
            VersionMismatchKind::DaemonTooOld => {
                write!(
                    f,
                    "Protocol version mismatch: daemon (v{}) uses protocol v{}, but this client requires v{}+.\n\n\
                    Please restart the daemon:\n  \
                    battinfo daemon stop && battinfo daemon start",
                    self.daemon_binary_version,
                    self.daemon_protocol_version,
                    self.client_min_supported
                )
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Connection failed: {0}")]
    Connection(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Daemon error ({kind:?}): {message}")]
    Daemon { kind: ErrorKind, message: String },

    #[error("Subscription rejected: {0}")]
    SubscriptionRejected(String),

    #[error("{0}")]
    VersionMismatch(VersionMismatchError),
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Checks if the client and daemon protocol versions are compatible.
pub fn check_version_compatibility(status: &DaemonStatus) -> Result<()> {
    let mismatch = |kind| {
        ClientError::VersionMismatch(VersionMismatchError {
            client_protocol_version: PROTOCOL_VERSION,
            client_min_supported: MIN_SUPPORTED_VERSION,
            daemon_protocol_version: status.protocol_version,
            daemon_min_supported: status.min_supported_version,
            daemon_binary_version: status.version.clone(),
            kind,
        })
    };

    // Can the daemon understand our messages?
    if PROTOCOL_VERSION < status.min_supported_version {
        return Err(mismatch(VersionMismatchKind::ClientTooOld));
    }

    // Can we understand the daemon's?
    if status.protocol_version < MIN_SUPPORTED_VERSION {
        return Err(mismatch(VersionMismatchKind::DaemonTooOld));
    }

    Ok(())
}

fn unexpected(response: DaemonResponse) -> ClientError {
    match response {
        DaemonResponse::Error { kind, message } => ClientError::Daemon { kind, message },
        other => ClientError::Protocol(format!("Unexpected response: {:?}", other)),
    }
}

pub struct DaemonClient {
    stream: UnixStream,
    read_buffer: Vec<u8>,
}

impl DaemonClient {
    pub fn connect() -> Result<Self> {
        Self::connect_to(&socket_path())
    }

    pub fn connect_to(path: &Path) -> Result<Self> {
        let stream = UnixStream::connect(path)?;
        stream.set_read_timeout(Some(Duration::from_secs(5)))?;
        stream.set_write_timeout(Some(Duration::from_secs(5)))?;
        Ok(Self {
            stream,
            read_buffer: Vec::with_capacity(8 * 1024),
        })
    }

    /// Connects to the daemon and validates protocol version compatibility.
    pub fn connect_with_version_check() -> Result<Self> {
        let mut client = Self::connect()?;
        let status = client.get_status()?;
        check_version_compatibility(&status)?;
        Ok(client)
    }

    fn read_line_blocking(&mut self) -> Result<String> {
        let mut temp_buf = [0u8; 4096];
        loop {
            if let Some(pos) = self.read_buffer.iter().position(|&b| b == b'\n') {
                let line_bytes: Vec<u8> = self.read_buffer.drain(..=pos).collect();
                return Ok(String::from_utf8_lossy(&line_bytes).to_string());
            }
            let n = self.stream.read(&mut temp_buf)?;
            if n == 0 {
                return Err(ClientError::Protocol("Connection closed".into()));
            }
            self.read_buffer.extend_from_slice(&temp_buf[..n]);
        }
    }

    fn read_response(&mut self) -> Result<DaemonResponse> {
        let line = self.read_line_blocking()?;
        tracing::trace!(line_len = line.len(), "read response");
        DaemonResponse::from_json(&line).map_err(|e| ClientError::Protocol(e.to_string()))
    }

    fn send_request(&mut self, request: DaemonRequest) -> Result<DaemonResponse> {
        let json = request
            .to_json()
            .map_err(|e| ClientError::Protocol(e.to_string()))?;

        writeln!(self.stream, "{}", json)?;
        self.stream.flush()?;

        // Updates queued for a subscriber may precede the answer.
        loop {
            match self.read_response()? {
                DaemonResponse::Update(_) => continue,
                response => return Ok(response),
            }
        }
    }

    pub fn get_status(&mut self) -> Result<DaemonStatus> {
        match self.send_request(DaemonRequest::GetStatus)? {
            DaemonResponse::Status(status) => Ok(status),
            other => Err(unexpected(other)),
        }
    }

    pub fn get_units(&mut self) -> Result<u32> {
        match self.send_request(DaemonRequest::GetUnits)? {
            DaemonResponse::Units(units) => Ok(units),
            other => Err(unexpected(other)),
        }
    }

    pub fn get_battery_info(&mut self, unit: UnitSelector) -> Result<BatteryInfoSnapshot> {
        match self.send_request(DaemonRequest::GetBatteryInfo { unit })? {
            DaemonResponse::BatteryInfo(info) => Ok(info),
            other => Err(unexpected(other)),
        }
    }

    pub fn get_raw_info(&mut self, unit: u32) -> Result<RawInfoSnapshot> {
        match self.send_request(DaemonRequest::GetRawInfo { unit })? {
            DaemonResponse::RawInfo(info) => Ok(info),
            other => Err(unexpected(other)),
        }
    }

    pub fn get_raw_status(&mut self, unit: u32) -> Result<RawStatusSnapshot> {
        match self.send_request(DaemonRequest::GetRawStatus { unit })? {
            DaemonResponse::RawStatus(status) => Ok(status),
            other => Err(unexpected(other)),
        }
    }

    pub fn get_counters(&mut self) -> Result<CountersSnapshot> {
        match self.send_request(DaemonRequest::GetCounters)? {
            DaemonResponse::Counters(counters) => Ok(counters),
            other => Err(unexpected(other)),
        }
    }

    pub fn shutdown(&mut self) -> Result<()> {
        match self.send_request(DaemonRequest::Shutdown)? {
            DaemonResponse::Ok => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    pub fn subscribe(&mut self) -> Result<()> {
        match self.send_request(DaemonRequest::Subscribe)? {
            DaemonResponse::Subscribed => Ok(()),
            DaemonResponse::SubscriptionRejected { reason } => {
                Err(ClientError::SubscriptionRejected(reason))
            }
            other => Err(unexpected(other)),
        }
    }

    pub fn unsubscribe(&mut self) -> Result<()> {
        match self.send_request(DaemonRequest::Unsubscribe)? {
            DaemonResponse::Unsubscribed => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Blocks until the next pushed update arrives.
    pub fn read_update(&mut self) -> Result<BatteryUpdate> {
        self.stream.set_read_timeout(None)?;
        loop {
            match self.read_response()? {
                DaemonResponse::Update(update) => return Ok(update),
                DaemonResponse::Error { kind, message } => {
                    return Err(ClientError::Daemon { kind, message })
                }
                other => tracing::debug!(response = ?other, "Ignoring non-update message"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(protocol_version: u32, min_supported_version: u32) -> DaemonStatus {
        DaemonStatus {
            version: "0.0.0".to_string(),
            protocol_version,
            min_supported_version,
            ..Default::default()
        }
    }

    #[test]
    fn test_same_version_is_compatible() {
        assert!(check_version_compatibility(&status(PROTOCOL_VERSION, MIN_SUPPORTED_VERSION)).is_ok());
    }

    #[test]
    fn test_minimum_supported_daemon_is_compatible() {
        assert!(check_version_compatibility(&status(MIN_SUPPORTED_VERSION, 1)).is_ok());
    }

    #[test]
    fn test_newer_daemon_rejects_old_client() {
        let err = check_version_compatibility(&status(PROTOCOL_VERSION + 2, PROTOCOL_VERSION + 1))
            .unwrap_err();
        match err {
            ClientError::VersionMismatch(m) => assert_eq!(m.kind, VersionMismatchKind::ClientTooOld),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_old_daemon_is_rejected() {
        let err = check_version_compatibility(&status(0, 0)).unwrap_err();
        match err {
            ClientError::VersionMismatch(m) => {
                assert_eq!(m.kind, VersionMismatchKind::DaemonTooOld);
                assert!(m.to_string().contains("battinfo daemon stop"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_error_response_maps_to_daemon_error() {
        let err = unexpected(DaemonResponse::error(ErrorKind::NoDevices, "no battery devices"));
        assert!(matches!(
            err,
            ClientError::Daemon {
                kind: ErrorKind::NoDevices,
                ..
            }
        ));
    }
}
