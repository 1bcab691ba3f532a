use std::fs;
use std::path::PathBuf;

use battinfo_core::{AggregatorConfig, DEFAULT_INFO_EXPIRE_SECS};
use battinfo_platform::POWER_SUPPLY_PATH;
use battinfo_protocol::MAX_SUBSCRIBERS;
use serde::{Deserialize, Serialize};
use tracing::Level;

const APP_DIR: &str = "battinfo";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "off" | "none" => LogLevel::Off,
            "error" => LogLevel::Error,
            "info" => LogLevel::Info,
            "debug" => LogLevel::Debug,
            "trace" => LogLevel::Trace,
            _ => LogLevel::Warn,
        }
    }

    pub fn as_tracing_level(&self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

/// Which transport feeds the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// sysfs when the power-supply class exists, the system manager otherwise.
    #[default]
    Auto,
    Sysfs,
    System,
}

impl SourceKind {
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Auto => "auto",
            SourceKind::Sysfs => "sysfs",
            SourceKind::System => "system",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Interval between cache refreshes and subscriber updates.
    pub refresh_ms: u64,
    pub max_subscribers: usize,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            refresh_ms: 1000,
            max_subscribers: MAX_SUBSCRIBERS,
        }
    }
}

impl DaemonConfig {
    pub fn effective_max_subscribers(&self) -> usize {
        self.max_subscribers.min(MAX_SUBSCRIBERS)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub log_level: LogLevel,
    pub source: SourceKind,
    pub sysfs_root: PathBuf,
    pub info_expire_secs: u64,
    pub daemon: DaemonConfig,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            source: SourceKind::default(),
            sysfs_root: PathBuf::from(POWER_SUPPLY_PATH),
            info_expire_secs: DEFAULT_INFO_EXPIRE_SECS,
            daemon: DaemonConfig::default(),
        }
    }
}

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join(APP_DIR)
}

pub fn runtime_dir() -> PathBuf {
    dirs::runtime_dir()
        .or_else(dirs::cache_dir)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(APP_DIR)
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

pub fn ensure_dirs() -> std::io::Result<()> {
    fs::create_dir_all(config_dir())?;
    Ok(())
}

impl UserConfig {
    pub fn load() -> Self {
        let path = config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content),
            Err(_) => Self::default(),
        }
    }

    /// Parses a config file, falling back to defaults when it is malformed.
    pub fn parse(content: &str) -> Self {
        toml::from_str(content).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Malformed config, using defaults");
            Self::default()
        })
    }

    pub fn save(&self) -> std::io::Result<()> {
        ensure_dirs()?;
        let path = config_path();
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        fs::write(path, content)
    }

    pub fn merge_with_args(&mut self, source: Option<SourceKind>) {
        if let Some(source) = source {
            self.source = source;
        }
    }

    pub fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            info_expire_secs: self.info_expire_secs,
        }
    }
}
