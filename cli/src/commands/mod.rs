pub mod config;
pub mod counters;
pub mod daemon;
pub mod debug;
pub mod info;
pub mod logs;
pub mod pipe;
pub mod raw;
pub mod units;

use color_eyre::eyre::{eyre, Result};

use battinfo_protocol::{
    BatteryInfoSnapshot, CountersSnapshot, RawInfoSnapshot, RawStatusSnapshot, UnitSelector,
};

use crate::config::UserConfig;
use crate::daemon::DaemonClient;
use crate::data::{open_source, BatteryData, SourceOptions};

/// Settings shared by every query command.
pub struct Context {
    pub config: UserConfig,
    pub source: SourceOptions,
    pub remote: bool,
}

/// Answers queries either in-process or through the daemon.
pub enum Backend {
    Local(BatteryData),
    Remote(DaemonClient),
}

impl Backend {
    pub fn open(ctx: &Context) -> Result<Self> {
        if ctx.remote {
            let client = DaemonClient::connect_with_version_check()
                .map_err(|e| eyre!("Cannot reach the daemon: {}", e))?;
            return Ok(Backend::Remote(client));
        }

        let source = open_source(&ctx.source)?;
        Ok(Backend::Local(BatteryData::new(
            source,
            ctx.config.aggregator_config(),
        )))
    }

    pub fn units(&mut self) -> Result<u32> {
        match self {
            Backend::Local(data) => Ok(data.units()),
            Backend::Remote(client) => Ok(client.get_units()?),
        }
    }

    pub fn battery_info(&mut self, unit: UnitSelector) -> Result<BatteryInfoSnapshot> {
        match self {
            Backend::Local(data) => Ok(data.battery_info(unit)?),
            Backend::Remote(client) => Ok(client.get_battery_info(unit)?),
        }
    }

    pub fn raw_info(&mut self, unit: u32) -> Result<RawInfoSnapshot> {
        match self {
            Backend::Local(data) => Ok(data.raw_info(unit)?),
            Backend::Remote(client) => Ok(client.get_raw_info(unit)?),
        }
    }

    pub fn raw_status(&mut self, unit: u32) -> Result<RawStatusSnapshot> {
        match self {
            Backend::Local(data) => Ok(data.raw_status(unit)?),
            Backend::Remote(client) => Ok(client.get_raw_status(unit)?),
        }
    }

    pub fn counters(&mut self) -> Result<CountersSnapshot> {
        match self {
            Backend::Local(data) => Ok(data.counters()),
            Backend::Remote(client) => Ok(client.get_counters()?),
        }
    }
}

/// Renders a `-1` encoded reading.
pub(crate) fn or_unknown(value: i64) -> String {
    if value < 0 {
        "unknown".to_string()
    } else {
        value.to_string()
    }
}
