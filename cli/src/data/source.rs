use std::path::PathBuf;

use battinfo_platform::{BatterySource, MemorySource, SourceError};
use tracing::debug;

use crate::config::{SourceKind, UserConfig};

/// Everything needed to pick and build a battery source.
#[derive(Debug, Clone)]
pub struct SourceOptions {
    pub kind: SourceKind,
    pub sysfs_root: PathBuf,
    /// Fixture file replacing the hardware sources.
    pub fixture: Option<PathBuf>,
}

impl SourceOptions {
    pub fn from_config(config: &UserConfig, fixture: Option<PathBuf>) -> Self {
        Self {
            kind: config.source,
            sysfs_root: config.sysfs_root.clone(),
            fixture,
        }
    }
}

pub fn open_source(options: &SourceOptions) -> Result<Box<dyn BatterySource>, SourceError> {
    if let Some(path) = &options.fixture {
        debug!(path = ?path, "Loading battery fixture");
        return Ok(Box::new(MemorySource::load_fixture(path)?));
    }

    match options.kind {
        SourceKind::Sysfs => sysfs(options),
        SourceKind::System => system(),
        SourceKind::Auto => {
            if options.sysfs_root.is_dir() {
                sysfs(options)
            } else {
                system()
            }
        }
    }
}

#[cfg(feature = "sysfs")]
fn sysfs(options: &SourceOptions) -> Result<Box<dyn BatterySource>, SourceError> {
    Ok(Box::new(battinfo_platform::SysfsSource::with_root(
        options.sysfs_root.clone(),
    )))
}

#[cfg(not(feature = "sysfs"))]
fn sysfs(_options: &SourceOptions) -> Result<Box<dyn BatterySource>, SourceError> {
    Err(SourceError::Unavailable(
        "built without the sysfs source".to_string(),
    ))
}

#[cfg(feature = "system")]
fn system() -> Result<Box<dyn BatterySource>, SourceError> {
    Ok(Box::new(battinfo_platform::SystemSource::new()))
}

#[cfg(not(feature = "system"))]
fn system() -> Result<Box<dyn BatterySource>, SourceError> {
    Err(SourceError::Unavailable(
        "built without the system source".to_string(),
    ))
}
