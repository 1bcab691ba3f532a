//! Linux `power_supply` class source.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::info::RawInfo;
use crate::source::{BatterySource, DeviceId, Result, SourceError};
use crate::status::RawStatus;
use crate::types::{BatteryChemistry, BatteryState, BatteryTechnology, PowerUnit};

pub const POWER_SUPPLY_PATH: &str = "/sys/class/power_supply";

/// Reads batteries from a sysfs `power_supply` tree.
///
/// Values are exported in micro units (µWh, µW, µAh, µA, µV) and converted to
/// the milli units used by [`RawStatus`] and [`RawInfo`].
#[derive(Debug, Clone)]
pub struct SysfsSource {
    root: PathBuf,
}

impl Default for SysfsSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SysfsSource {
    pub fn new() -> Self {
        Self::with_root(POWER_SUPPLY_PATH)
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn device_path(&self, device: &DeviceId) -> Result<PathBuf> {
        let path = self.root.join(device.as_str());
        if path.is_dir() {
            Ok(path)
        } else {
            Err(SourceError::Gone(device.clone()))
        }
    }
}

impl BatterySource for SysfsSource {
    fn name(&self) -> &'static str {
        "sysfs"
    }

    fn list_devices(&self) -> Result<Vec<DeviceId>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut devices: Vec<DeviceId> = entries
            .flatten()
            .filter(|entry| {
                read_attr(&entry.path(), "type")
                    .ok()
                    .flatten()
                    .is_some_and(|kind| kind == "Battery")
            })
            .map(|entry| DeviceId::new(entry.file_name().to_string_lossy()))
            .collect();
        devices.sort();

        trace!(root = ?self.root, count = devices.len(), "Enumerated sysfs batteries");
        Ok(devices)
    }

    fn exists(&self, device: &DeviceId) -> bool {
        self.root.join(device.as_str()).is_dir()
    }

    fn is_present(&self, device: &DeviceId) -> bool {
        let Ok(path) = self.device_path(device) else {
            return false;
        };
        match read_attr(&path, "present") {
            Ok(Some(present)) => present == "1",
            Ok(None) => true,
            Err(_) => false,
        }
    }

    fn fetch_status(&self, device: &DeviceId) -> Result<RawStatus> {
        let path = self.device_path(device)?;
        let status = read_status(&path)?;
        still_there(device, &path, status)
    }

    fn fetch_info(&self, device: &DeviceId) -> Result<RawInfo> {
        let path = self.device_path(device)?;
        let info = read_info(&path)?;
        still_there(device, &path, info)
    }
}

/// Rejects a reading taken while the device directory went away.
///
/// Attributes of a removed directory read as missing, so a reading
/// assembled across the removal would look like an unknown battery.
fn still_there<T>(device: &DeviceId, path: &Path, reading: T) -> Result<T> {
    if path.is_dir() {
        Ok(reading)
    } else {
        trace!(%device, "sysfs battery removed during read");
        Err(SourceError::Gone(device.clone()))
    }
}

fn read_status(path: &Path) -> Result<RawStatus> {
    let mut state = match read_attr(path, "status")?.as_deref() {
        Some(s) if s.eq_ignore_ascii_case("Discharging") => BatteryState::DISCHARGING,
        Some(s) if s.eq_ignore_ascii_case("Charging") => BatteryState::CHARGING,
        _ => BatteryState::empty(),
    };
    if read_attr(path, "capacity_level")?.as_deref() == Some("Critical") {
        state |= BatteryState::CRITICAL;
    }

    let (remaining_capacity, rate) = match read_micro(path, "energy_now")? {
        Some(energy) => (Some(energy), read_micro(path, "power_now")?),
        None => (
            read_micro(path, "charge_now")?,
            read_micro(path, "current_now")?,
        ),
    };

    Ok(RawStatus {
        state,
        rate,
        remaining_capacity,
        present_voltage: read_micro(path, "voltage_now")?,
    })
}

fn read_info(path: &Path) -> Result<RawInfo> {
    let (units, prefix) = if path.join("energy_full").exists() {
        (PowerUnit::MilliWatt, "energy")
    } else {
        (PowerUnit::MilliAmp, "charge")
    };

    Ok(RawInfo {
        units,
        design_capacity: read_micro(path, &format!("{prefix}_full_design"))?,
        last_full_capacity: read_micro(path, &format!("{prefix}_full"))?.unwrap_or(0),
        technology: BatteryTechnology::Secondary,
        design_voltage: read_micro(path, "voltage_min_design")?,
        warning_capacity: read_micro(path, "alarm")?,
        low_capacity: None,
        model: read_attr(path, "model_name")?,
        serial: read_attr(path, "serial_number")?,
        chemistry: read_attr(path, "technology")?
            .map(|t| BatteryChemistry::from_label(&t))
            .unwrap_or_default(),
        oem_info: read_attr(path, "manufacturer")?,
    })
}

/// Reads a trimmed attribute. Missing or empty attributes are `None`.
fn read_attr(dir: &Path, name: &str) -> Result<Option<String>> {
    match fs::read_to_string(dir.join(name)) {
        Ok(content) => {
            let value = content.trim();
            Ok((!value.is_empty()).then(|| value.to_string()))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Reads a micro-unit attribute and converts it to milli units.
///
/// Some drivers export signed currents, only the magnitude is kept.
fn read_micro(dir: &Path, name: &str) -> Result<Option<u32>> {
    let Some(raw) = read_attr(dir, name)? else {
        return Ok(None);
    };
    let micro: i64 = raw.parse().map_err(|e: std::num::ParseIntError| SourceError::Parse {
        what: dir.join(name).display().to_string(),
        reason: e.to_string(),
    })?;
    let milli = micro.unsigned_abs() / 1000;
    Ok(Some(u32::try_from(milli).unwrap_or(u32::MAX - 1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_battery(root: &Path, name: &str, attrs: &[(&str, &str)]) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("type"), "Battery\n").unwrap();
        for (attr, value) in attrs {
            fs::write(dir.join(attr), format!("{value}\n")).unwrap();
        }
        dir
    }

    fn energy_battery(root: &Path, name: &str) -> PathBuf {
        write_battery(
            root,
            name,
            &[
                ("status", "Discharging"),
                ("present", "1"),
                ("energy_now", "30000000"),
                ("energy_full", "50000000"),
                ("energy_full_design", "57000000"),
                ("power_now", "10000000"),
                ("voltage_now", "11400000"),
                ("voltage_min_design", "11100000"),
                ("technology", "Li-ion"),
                ("model_name", "5B10W13975"),
                ("manufacturer", "SMP"),
            ],
        )
    }

    #[test]
    fn test_lists_only_batteries_sorted() {
        let td = TempDir::new().unwrap();
        energy_battery(td.path(), "BAT1");
        energy_battery(td.path(), "BAT0");
        let ac = td.path().join("AC");
        fs::create_dir_all(&ac).unwrap();
        fs::write(ac.join("type"), "Mains").unwrap();

        let source = SysfsSource::with_root(td.path());
        let devices = source.list_devices().unwrap();

        assert_eq!(devices, vec![DeviceId::from("BAT0"), DeviceId::from("BAT1")]);
    }

    #[test]
    fn test_missing_root_lists_nothing() {
        let td = TempDir::new().unwrap();
        let source = SysfsSource::with_root(td.path().join("nope"));
        assert!(source.list_devices().unwrap().is_empty());
    }

    #[test]
    fn test_energy_status_and_info() {
        let td = TempDir::new().unwrap();
        energy_battery(td.path(), "BAT0");
        let source = SysfsSource::with_root(td.path());
        let id = DeviceId::from("BAT0");

        let status = source.fetch_status(&id).unwrap();
        assert_eq!(status.state, BatteryState::DISCHARGING);
        assert_eq!(status.remaining_capacity, Some(30_000));
        assert_eq!(status.rate, Some(10_000));
        assert_eq!(status.present_voltage, Some(11_400));
        assert!(status.is_valid());

        let info = source.fetch_info(&id).unwrap();
        assert_eq!(info.units, PowerUnit::MilliWatt);
        assert_eq!(info.last_full_capacity, 50_000);
        assert_eq!(info.design_capacity, Some(57_000));
        assert_eq!(info.design_voltage, Some(11_100));
        assert_eq!(info.chemistry, BatteryChemistry::LithiumIon);
        assert_eq!(info.model.as_deref(), Some("5B10W13975"));
        assert_eq!(info.oem_info.as_deref(), Some("SMP"));
        assert!(info.is_valid());
    }

    #[test]
    fn test_charge_based_battery_uses_milliamps() {
        let td = TempDir::new().unwrap();
        write_battery(
            td.path(),
            "BAT0",
            &[
                ("status", "Charging"),
                ("charge_now", "2000000"),
                ("charge_full", "4000000"),
                ("current_now", "-1500000"),
                ("voltage_now", "12000000"),
            ],
        );
        let source = SysfsSource::with_root(td.path());
        let id = DeviceId::from("BAT0");

        let status = source.fetch_status(&id).unwrap();
        assert_eq!(status.state, BatteryState::CHARGING);
        assert_eq!(status.remaining_capacity, Some(2000));
        assert_eq!(status.rate, Some(1500));

        let info = source.fetch_info(&id).unwrap();
        assert_eq!(info.units, PowerUnit::MilliAmp);
        assert_eq!(info.last_full_capacity, 4000);
    }

    #[test]
    fn test_critical_level_sets_flag() {
        let td = TempDir::new().unwrap();
        let dir = energy_battery(td.path(), "BAT0");
        fs::write(dir.join("capacity_level"), "Critical\n").unwrap();

        let source = SysfsSource::with_root(td.path());
        let status = source.fetch_status(&DeviceId::from("BAT0")).unwrap();
        assert_eq!(
            status.state,
            BatteryState::DISCHARGING | BatteryState::CRITICAL
        );
    }

    #[test]
    fn test_missing_readings_are_unknown() {
        let td = TempDir::new().unwrap();
        write_battery(td.path(), "BAT0", &[("status", "Unknown")]);
        let source = SysfsSource::with_root(td.path());
        let id = DeviceId::from("BAT0");

        let status = source.fetch_status(&id).unwrap();
        assert_eq!(status.remaining_capacity, None);
        assert_eq!(status.present_voltage, None);
        assert!(!status.is_valid());

        let info = source.fetch_info(&id).unwrap();
        assert_eq!(info.last_full_capacity, 0);
        assert!(!info.is_valid());
    }

    #[test]
    fn test_present_flag() {
        let td = TempDir::new().unwrap();
        let dir = energy_battery(td.path(), "BAT0");
        let source = SysfsSource::with_root(td.path());
        let id = DeviceId::from("BAT0");
        assert!(source.is_present(&id));

        fs::write(dir.join("present"), "0\n").unwrap();
        assert!(!source.is_present(&id));
    }

    #[test]
    fn test_vanished_device_is_gone() {
        let td = TempDir::new().unwrap();
        let dir = energy_battery(td.path(), "BAT0");
        let source = SysfsSource::with_root(td.path());
        let id = DeviceId::from("BAT0");
        assert!(source.exists(&id));

        fs::remove_dir_all(dir).unwrap();
        assert!(!source.exists(&id));
        assert!(!source.is_present(&id));
        assert!(source.fetch_status(&id).unwrap_err().is_gone());
        assert!(source.fetch_info(&id).unwrap_err().is_gone());
    }

    #[test]
    fn test_removed_while_reading_is_gone() {
        let td = TempDir::new().unwrap();
        let dir = energy_battery(td.path(), "BAT0");
        let id = DeviceId::from("BAT0");

        let status = read_status(&dir).unwrap();
        assert!(still_there(&id, &dir, status).is_ok());

        fs::remove_dir_all(&dir).unwrap();

        // Attributes of the removed directory read as missing.
        let status = read_status(&dir).unwrap();
        assert_eq!(status.remaining_capacity, None);
        assert!(still_there(&id, &dir, status).unwrap_err().is_gone());

        let info = read_info(&dir).unwrap();
        assert_eq!(info.last_full_capacity, 0);
        assert!(still_there(&id, &dir, info).unwrap_err().is_gone());
    }

    #[test]
    fn test_garbage_value_is_parse_error() {
        let td = TempDir::new().unwrap();
        let dir = energy_battery(td.path(), "BAT0");
        fs::write(dir.join("energy_now"), "lots\n").unwrap();

        let source = SysfsSource::with_root(td.path());
        let err = source.fetch_status(&DeviceId::from("BAT0")).unwrap_err();
        assert!(matches!(err, SourceError::Parse { .. }));
    }
}
