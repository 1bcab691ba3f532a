use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use battinfo_core::AggregateError;
use battinfo_platform::SourceError;
use battinfo_protocol::{
    BatteryInfoSnapshot, BatteryUpdate, DaemonRequest, DaemonResponse, DaemonStatus, ErrorKind,
    UnitSelector, MIN_SUPPORTED_VERSION, PROTOCOL_VERSION,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::{runtime_dir, LogLevel, UserConfig};
use crate::daemon::cache::InfoCache;
use crate::daemon::{pid_file_path, socket_path};
use crate::data::{error_kind, open_source, BatteryData, SourceOptions};

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Battery source error: {0}")]
    Source(#[from] SourceError),

    #[error("Already running")]
    AlreadyRunning,

    #[error("Failed to daemonize: {0}")]
    Daemonize(String),
}

pub type Result<T> = std::result::Result<T, DaemonError>;

type ClientId = u64;

enum ClientMessage {
    Request { request: DaemonRequest },
    Invalid { reason: String },
    Disconnect,
}

struct ClientHandle {
    response_tx: mpsc::Sender<DaemonResponse>,
    writer: tokio::task::JoinHandle<()>,
    is_subscriber: bool,
}

pub(crate) struct DaemonState {
    battery: BatteryData,
    cache: InfoCache,
    start_time: Instant,
    refresh_interval: Duration,
    max_subscribers: usize,
}

impl DaemonState {
    pub(crate) fn new(battery: BatteryData, config: &UserConfig) -> Self {
        let expire = Duration::from_secs(battery.info_expire_secs());
        Self {
            battery,
            cache: InfoCache::new(expire),
            start_time: Instant::now(),
            refresh_interval: Duration::from_millis(config.daemon.refresh_ms.max(1)),
            max_subscribers: config.daemon.effective_max_subscribers(),
        }
    }

    fn get_status(&self, subscriber_count: usize) -> DaemonStatus {
        DaemonStatus {
            running: true,
            uptime_secs: self.start_time.elapsed().as_secs(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            source: self.battery.source_name().to_string(),
            units: self.battery.units(),
            subscriber_count,
            info_expire_secs: self.battery.info_expire_secs(),
            cache_age_ms: self
                .cache
                .age(Instant::now())
                .map(|age| age.as_millis() as u64),
            protocol_version: PROTOCOL_VERSION,
            min_supported_version: MIN_SUPPORTED_VERSION,
        }
    }

    /// All-units reading, served from the cache while it is fresh.
    fn current_info(&mut self) -> std::result::Result<BatteryInfoSnapshot, AggregateError> {
        let now = Instant::now();
        if let Some(info) = self.cache.get(now) {
            return Ok(info.clone());
        }

        match self.battery.battery_info(UnitSelector::All) {
            Ok(info) => {
                self.cache.store(now, info.clone());
                Ok(info)
            }
            Err(e) => {
                self.cache.invalidate();
                Err(e)
            }
        }
    }

    fn handle_request(&mut self, request: &DaemonRequest, subscriber_count: usize) -> DaemonResponse {
        let result = match request {
            DaemonRequest::GetStatus => Ok(DaemonResponse::Status(self.get_status(subscriber_count))),
            DaemonRequest::GetUnits => Ok(DaemonResponse::Units(self.battery.units())),
            DaemonRequest::GetBatteryInfo { unit } => match unit {
                UnitSelector::All => self.current_info().map(DaemonResponse::BatteryInfo),
                UnitSelector::Unit(_) => self
                    .battery
                    .battery_info(*unit)
                    .map(DaemonResponse::BatteryInfo),
            },
            DaemonRequest::GetRawInfo { unit } => {
                self.battery.raw_info(*unit).map(DaemonResponse::RawInfo)
            }
            DaemonRequest::GetRawStatus { unit } => {
                self.battery.raw_status(*unit).map(DaemonResponse::RawStatus)
            }
            DaemonRequest::GetCounters => Ok(DaemonResponse::Counters(self.battery.counters())),
            DaemonRequest::Shutdown => Ok(DaemonResponse::Ok),
            DaemonRequest::Subscribe | DaemonRequest::Unsubscribe => Ok(DaemonResponse::error(
                ErrorKind::Internal,
                "Handled separately",
            )),
        };

        result.unwrap_or_else(|e| {
            debug!(request = ?request, error = %e, "Request failed");
            DaemonResponse::error(error_kind(&e), e.to_string())
        })
    }
}

async fn client_reader_task(
    mut reader: BufReader<tokio::net::unix::OwnedReadHalf>,
    msg_tx: mpsc::Sender<(ClientId, ClientMessage)>,
    client_id: ClientId,
) {
    let mut line = String::new();
    loop {
        line.clear();
        let msg = match reader.read_line(&mut line).await {
            Ok(0) => {
                let _ = msg_tx.send((client_id, ClientMessage::Disconnect)).await;
                break;
            }
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match DaemonRequest::from_json(trimmed) {
                    Ok(request) => ClientMessage::Request { request },
                    Err(e) => {
                        warn!(client_id, error = %e, "Invalid request from client");
                        ClientMessage::Invalid {
                            reason: e.to_string(),
                        }
                    }
                }
            }
            Err(e) => {
                debug!(client_id, error = %e, "Client read error");
                let _ = msg_tx.send((client_id, ClientMessage::Disconnect)).await;
                break;
            }
        };

        if msg_tx.send((client_id, msg)).await.is_err() {
            break;
        }
    }
}

async fn client_writer_task(
    mut writer: tokio::net::unix::OwnedWriteHalf,
    mut response_rx: mpsc::Receiver<DaemonResponse>,
) {
    while let Some(response) = response_rx.recv().await {
        let json = match response.to_json() {
            Ok(j) => j,
            Err(_) => continue,
        };
        if writer
            .write_all(format!("{}\n", json).as_bytes())
            .await
            .is_err()
        {
            break;
        }
    }
}

pub fn run_daemon(
    foreground: bool,
    log_level: LogLevel,
    log_level_override: Option<LogLevel>,
    config: UserConfig,
    source_options: SourceOptions,
) -> Result<()> {
    let socket = socket_path();

    if socket.exists() {
        if crate::daemon::is_daemon_running() {
            return Err(DaemonError::AlreadyRunning);
        }
        fs::remove_file(&socket)?;
    }

    fs::create_dir_all(runtime_dir())?;

    // Resolve the source before detaching so errors reach the terminal.
    let source = open_source(&source_options)?;
    let battery = BatteryData::new(source, config.aggregator_config());

    if !foreground {
        match daemonize::Daemonize::new()
            .pid_file(pid_file_path())
            .working_directory(runtime_dir())
            .start()
        {
            Ok(_) => {}
            Err(e) => return Err(DaemonError::Daemonize(e.to_string())),
        }
        let _guard =
            crate::logging::init(log_level, crate::logging::LogMode::File, log_level_override);
        std::mem::forget(_guard);
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        source = battery.source_name(),
        "Daemon starting"
    );

    let state = DaemonState::new(battery, &config);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let local = tokio::task::LocalSet::new();
    let result = local.block_on(&runtime, serve(socket, state));

    if !foreground {
        fs::remove_file(pid_file_path()).ok();
    }
    result
}

pub(crate) async fn serve(socket: PathBuf, mut state: DaemonState) -> Result<()> {
    let listener = UnixListener::bind(&socket)?;
    info!(socket = ?socket, "Listening for connections");

    let mut refresh_tick = tokio::time::interval(state.refresh_interval);
    refresh_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let (msg_tx, mut msg_rx) = mpsc::channel::<(ClientId, ClientMessage)>(256);
    let mut clients: HashMap<ClientId, ClientHandle> = HashMap::new();
    let mut next_client_id: ClientId = 1;
    let mut shutdown_requested = false;

    loop {
        tokio::select! {
            _ = refresh_tick.tick() => {
                let subscriber_count = subscriber_count(&clients);
                if subscriber_count == 0 {
                    continue;
                }

                let update = match state.current_info() {
                    Ok(info) => DaemonResponse::Update(BatteryUpdate {
                        timestamp: chrono::Utc::now().timestamp(),
                        info,
                    }),
                    Err(e) => {
                        warn!(error = %e, "Battery refresh failed");
                        DaemonResponse::error(error_kind(&e), e.to_string())
                    }
                };

                let mut disconnected = Vec::new();
                for (id, client) in &clients {
                    if client.is_subscriber
                        && client.response_tx.send(update.clone()).await.is_err()
                    {
                        disconnected.push(*id);
                    }
                }
                for id in disconnected {
                    clients.remove(&id);
                    debug!(client_id = id, "Removed disconnected subscriber");
                }
            }
            result = listener.accept() => {
                match result {
                    Ok((stream, _)) => {
                        let client_id = next_client_id;
                        next_client_id += 1;
                        debug!(client_id, "Client connected");

                        let (reader, writer) = stream.into_split();
                        let (response_tx, response_rx) = mpsc::channel::<DaemonResponse>(64);

                        tokio::task::spawn_local(client_reader_task(
                            BufReader::new(reader),
                            msg_tx.clone(),
                            client_id,
                        ));
                        let writer = tokio::task::spawn_local(client_writer_task(writer, response_rx));

                        clients.insert(client_id, ClientHandle {
                            response_tx,
                            writer,
                            is_subscriber: false,
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "Socket accept error");
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            Some((client_id, msg)) = msg_rx.recv() => {
                let response = match msg {
                    ClientMessage::Disconnect => {
                        if clients.remove(&client_id).is_some() {
                            debug!(client_id, count = clients.len(), "Client disconnected");
                        }
                        continue;
                    }
                    ClientMessage::Invalid { reason } => {
                        DaemonResponse::error(ErrorKind::InvalidArgument, reason)
                    }
                    ClientMessage::Request { request } => {
                        debug!(client_id, request = ?request, "Handling request");

                        match &request {
                            DaemonRequest::Subscribe => {
                                let count = subscriber_count(&clients);
                                if count >= state.max_subscribers {
                                    DaemonResponse::SubscriptionRejected {
                                        reason: format!("Maximum subscribers ({}) reached", state.max_subscribers),
                                    }
                                } else if let Some(client) = clients.get_mut(&client_id) {
                                    if !client.is_subscriber {
                                        client.is_subscriber = true;
                                        info!(client_id, count = count + 1, "Subscriber added");
                                    }
                                    DaemonResponse::Subscribed
                                } else {
                                    DaemonResponse::error(ErrorKind::Internal, "Client not found")
                                }
                            }
                            DaemonRequest::Unsubscribe => {
                                if let Some(client) = clients.get_mut(&client_id) {
                                    if client.is_subscriber {
                                        client.is_subscriber = false;
                                        info!(client_id, count = subscriber_count(&clients), "Subscriber removed");
                                    }
                                }
                                DaemonResponse::Unsubscribed
                            }
                            DaemonRequest::Shutdown => {
                                info!("Shutdown requested by client");
                                shutdown_requested = true;
                                DaemonResponse::Ok
                            }
                            _ => {
                                let count = subscriber_count(&clients);
                                state.handle_request(&request, count)
                            }
                        }
                    }
                };

                if let Some(client) = clients.get(&client_id) {
                    let _ = client.response_tx.send(response).await;
                }

                if shutdown_requested {
                    // Closing the channel lets the writer drain the final answer and exit.
                    if let Some(client) = clients.remove(&client_id) {
                        drop(client.response_tx);
                        let _ = client.writer.await;
                    }
                    break;
                }
            }
        }
    }

    info!("Daemon shutting down");
    remove_socket(&socket);

    Ok(())
}

fn subscriber_count(clients: &HashMap<ClientId, ClientHandle>) -> usize {
    clients.values().filter(|c| c.is_subscriber).count()
}

fn remove_socket(socket: &Path) {
    if let Err(e) = fs::remove_file(socket) {
        debug!(socket = ?socket, error = %e, "Failed to remove socket");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DaemonConfig;
    use crate::daemon::client::ClientError;
    use crate::daemon::DaemonClient;
    use battinfo_core::AggregatorConfig;
    use battinfo_platform::{BatteryState, MemoryDevice, MemorySource, RawInfo, RawStatus};
    use std::io::{BufRead, BufReader as StdBufReader, Write};
    use std::os::unix::net::UnixStream;
    use std::thread;

    fn battery() -> BatteryData {
        let source = MemorySource::new().with_device(MemoryDevice::new(
            "BAT0",
            RawStatus {
                state: BatteryState::DISCHARGING,
                rate: Some(1000),
                remaining_capacity: Some(3000),
                present_voltage: Some(11_400),
            },
            RawInfo {
                last_full_capacity: 5000,
                ..Default::default()
            },
        ));
        BatteryData::new(Box::new(source), AggregatorConfig::default())
    }

    fn start_server(dir: &Path, daemon: DaemonConfig) -> (PathBuf, thread::JoinHandle<()>) {
        let socket = dir.join("battinfo.sock");
        let config = UserConfig {
            daemon,
            ..Default::default()
        };
        let path = socket.clone();
        let handle = thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let local = tokio::task::LocalSet::new();
            let state = DaemonState::new(battery(), &config);
            local.block_on(&runtime, serve(path, state)).unwrap();
        });

        for _ in 0..100 {
            if socket.exists() {
                break;
            }
            thread::sleep(Duration::from_millis(20));
        }
        (socket, handle)
    }

    #[test]
    fn test_requests_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let (socket, handle) = start_server(dir.path(), DaemonConfig::default());

        let mut client = DaemonClient::connect_to(&socket).unwrap();
        let status = client.get_status().unwrap();
        assert_eq!(status.source, "memory");
        assert_eq!(status.units, 1);
        assert_eq!(status.protocol_version, PROTOCOL_VERSION);

        assert_eq!(client.get_units().unwrap(), 1);

        let info = client.get_battery_info(UnitSelector::All).unwrap();
        assert_eq!(info.cap, 60);
        assert_eq!(info.min, 180);

        let status = client.get_raw_status(0).unwrap();
        assert_eq!(status.device, "BAT0");

        let err = client.get_raw_info(3).unwrap_err();
        assert!(matches!(
            err,
            ClientError::Daemon {
                kind: ErrorKind::NoSuchDevice,
                ..
            }
        ));

        let counters = client.get_counters().unwrap();
        assert_eq!(counters.life, 60);

        client.shutdown().unwrap();
        handle.join().unwrap();
        assert!(!socket.exists());
    }

    #[test]
    fn test_garbage_is_invalid_argument() {
        let dir = tempfile::tempdir().unwrap();
        let (socket, handle) = start_server(dir.path(), DaemonConfig::default());

        let mut stream = UnixStream::connect(&socket).unwrap();
        stream.write_all(b"not json\n").unwrap();
        let mut line = String::new();
        StdBufReader::new(stream.try_clone().unwrap())
            .read_line(&mut line)
            .unwrap();
        match DaemonResponse::from_json(&line).unwrap() {
            DaemonResponse::Error { kind, .. } => assert_eq!(kind, ErrorKind::InvalidArgument),
            other => panic!("unexpected response: {:?}", other),
        }

        DaemonClient::connect_to(&socket).unwrap().shutdown().unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_subscribers_get_updates_and_are_capped() {
        let dir = tempfile::tempdir().unwrap();
        let (socket, handle) = start_server(
            dir.path(),
            DaemonConfig {
                refresh_ms: 50,
                max_subscribers: 1,
            },
        );

        let mut first = DaemonClient::connect_to(&socket).unwrap();
        first.subscribe().unwrap();

        let mut second = DaemonClient::connect_to(&socket).unwrap();
        assert!(matches!(
            second.subscribe(),
            Err(ClientError::SubscriptionRejected(_))
        ));

        let update = first.read_update().unwrap();
        assert_eq!(update.info.cap, 60);

        first.unsubscribe().unwrap();
        second.subscribe().unwrap();

        second.shutdown().unwrap();
        handle.join().unwrap();
    }
}
