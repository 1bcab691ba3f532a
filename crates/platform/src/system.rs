//! Cross-platform source backed by `starship-battery`.

use starship_battery::units::electric_potential::millivolt;
use starship_battery::units::energy::watt_hour;
use starship_battery::units::power::watt;
use starship_battery::{Battery, Manager};
use tracing::trace;

use crate::info::RawInfo;
use crate::source::{BatterySource, DeviceId, Result, SourceError};
use crate::status::RawStatus;
use crate::types::{BatteryState, BatteryTechnology, PowerUnit};

const DEVICE_PREFIX: &str = "BAT";

/// Battery source for any platform `starship-battery` supports.
///
/// Devices are named `BAT<index>` in the order the OS reports them. The
/// manager is created per query so the source holds no OS handles.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSource;

impl SystemSource {
    pub fn new() -> Self {
        Self
    }

    fn batteries(&self) -> Result<Vec<Battery>> {
        let manager = Manager::new().map_err(unavailable)?;
        let batteries = manager.batteries().map_err(unavailable)?;
        Ok(batteries.flatten().collect())
    }

    fn battery(&self, device: &DeviceId) -> Result<Battery> {
        let index = parse_index(device).ok_or_else(|| SourceError::Gone(device.clone()))?;
        self.batteries()?
            .into_iter()
            .nth(index)
            .ok_or_else(|| SourceError::Gone(device.clone()))
    }
}

impl BatterySource for SystemSource {
    fn name(&self) -> &'static str {
        "system"
    }

    fn list_devices(&self) -> Result<Vec<DeviceId>> {
        let count = self.batteries()?.len();
        trace!(count, "Enumerated system batteries");
        Ok((0..count)
            .map(|i| DeviceId::new(format!("{DEVICE_PREFIX}{i}")))
            .collect())
    }

    fn exists(&self, device: &DeviceId) -> bool {
        self.battery(device).is_ok()
    }

    fn is_present(&self, device: &DeviceId) -> bool {
        self.exists(device)
    }

    fn fetch_status(&self, device: &DeviceId) -> Result<RawStatus> {
        let battery = self.battery(device)?;
        Ok(RawStatus {
            state: BatteryState::from(battery.state()),
            rate: Some(milli(battery.energy_rate().get::<watt>().abs())),
            remaining_capacity: Some(milli(battery.energy().get::<watt_hour>())),
            present_voltage: Some(battery.voltage().get::<millivolt>().max(0.0) as u32),
        })
    }

    fn fetch_info(&self, device: &DeviceId) -> Result<RawInfo> {
        let battery = self.battery(device)?;
        Ok(RawInfo {
            units: PowerUnit::MilliWatt,
            design_capacity: Some(milli(battery.energy_full_design().get::<watt_hour>())),
            last_full_capacity: milli(battery.energy_full().get::<watt_hour>()),
            technology: BatteryTechnology::Secondary,
            design_voltage: None,
            warning_capacity: None,
            low_capacity: None,
            model: battery.model().map(str::to_string),
            serial: battery.serial_number().map(str::to_string),
            chemistry: battery.technology().into(),
            oem_info: battery.vendor().map(str::to_string),
        })
    }
}

fn unavailable(e: starship_battery::Error) -> SourceError {
    SourceError::Unavailable(e.to_string())
}

fn parse_index(device: &DeviceId) -> Option<usize> {
    device.as_str().strip_prefix(DEVICE_PREFIX)?.parse().ok()
}

/// Converts a base-unit float (Wh, W) to an integer milli-unit reading.
fn milli(value: f32) -> u32 {
    (value.max(0.0) * 1000.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_index() {
        assert_eq!(parse_index(&DeviceId::from("BAT0")), Some(0));
        assert_eq!(parse_index(&DeviceId::from("BAT12")), Some(12));
        assert_eq!(parse_index(&DeviceId::from("AC")), None);
        assert_eq!(parse_index(&DeviceId::from("BATx")), None);
    }

    #[test]
    fn test_milli_conversion() {
        assert_eq!(milli(52.6), 52_600);
        assert_eq!(milli(0.0), 0);
        assert_eq!(milli(-3.0), 0);
    }

    #[test]
    fn test_unknown_name_is_gone() {
        let source = SystemSource::new();
        let err = source.fetch_status(&DeviceId::from("AC")).unwrap_err();
        assert!(err.is_gone());
    }
}
