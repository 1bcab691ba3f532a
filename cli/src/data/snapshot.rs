//! Conversions between aggregation results and wire snapshots.

use battinfo_core::{AggregateError, CounterSnapshot, NormalizedInfo};
use battinfo_platform::{DeviceId, RawInfo, RawStatus};
use battinfo_protocol::{
    BatteryInfoSnapshot, CountersSnapshot, ErrorKind, RawInfoSnapshot, RawStatusSnapshot,
};

pub fn battery_info_snapshot(info: &NormalizedInfo) -> BatteryInfoSnapshot {
    BatteryInfoSnapshot {
        cap: info.capacity_raw(),
        min: info.minutes_raw(),
        state: info.state.bits(),
        rate: info.rate_raw(),
        state_label: info.state.label().to_string(),
        time_remaining_formatted: info.time_remaining_formatted(),
    }
}

pub fn raw_status_snapshot(device: &DeviceId, status: &RawStatus) -> RawStatusSnapshot {
    let (state, rate, cap, volt) = status.to_firmware();
    RawStatusSnapshot {
        device: device.to_string(),
        state,
        rate,
        cap,
        volt,
        valid: status.is_valid(),
    }
}

pub fn raw_info_snapshot(device: &DeviceId, info: &RawInfo) -> RawInfoSnapshot {
    RawInfoSnapshot {
        device: device.to_string(),
        units: info.units.capacity_suffix().to_string(),
        dcap: info.design_capacity,
        lfcap: info.last_full_capacity,
        technology: info.technology.label().to_lowercase(),
        dvol: info.design_voltage,
        wcap: info.warning_capacity,
        lcap: info.low_capacity,
        model: info.model.clone(),
        serial: info.serial.clone(),
        chemistry: info.chemistry.label().to_string(),
        oeminfo: info.oem_info.clone(),
        valid: info.is_valid(),
    }
}

pub fn counters_snapshot(counters: &CounterSnapshot) -> CountersSnapshot {
    CountersSnapshot {
        life: counters.life,
        time: counters.time,
        state: counters.state,
        units: u32::try_from(counters.units).unwrap_or(u32::MAX),
        info_expire: counters.info_expire,
    }
}

/// Counters received from the daemon, for lookups by name.
pub fn counters_from_wire(counters: &CountersSnapshot) -> CounterSnapshot {
    CounterSnapshot {
        life: counters.life,
        time: counters.time,
        state: counters.state,
        units: counters.units as usize,
        info_expire: counters.info_expire,
    }
}

pub fn error_kind(err: &AggregateError) -> ErrorKind {
    match err {
        AggregateError::NoDevices => ErrorKind::NoDevices,
        AggregateError::DeviceGone(_) => ErrorKind::DeviceGone,
        AggregateError::NoSuchDevice(_) => ErrorKind::NoSuchDevice,
        AggregateError::InvalidArgument(_) => ErrorKind::InvalidArgument,
        AggregateError::Source(_) => ErrorKind::Transport,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battinfo_platform::{BatteryState, PowerUnit, SourceError};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_battery_info_uses_negative_sentinels() {
        let snapshot = battery_info_snapshot(&NormalizedInfo::not_present());
        assert_eq!(snapshot, BatteryInfoSnapshot::default());

        let charging = NormalizedInfo {
            capacity_percent: Some(80),
            minutes_remaining: None,
            state: BatteryState::CHARGING,
            rate: Some(1000),
        };
        let snapshot = battery_info_snapshot(&charging);
        assert_eq!(snapshot.cap, 80);
        assert_eq!(snapshot.min, -1);
        assert_eq!(snapshot.rate, 1000);
        assert_eq!(snapshot.state, 0x2);
        assert_eq!(snapshot.state_label, "Charging");
    }

    #[test]
    fn test_raw_status_keeps_firmware_words() {
        let status = RawStatus::from_firmware(0x1, 0xFFFF_FFFF, 3000, 11_400);
        let snapshot = raw_status_snapshot(&DeviceId::from("BAT0"), &status);
        assert_eq!(
            snapshot,
            RawStatusSnapshot {
                device: "BAT0".to_string(),
                state: 0x1,
                rate: 0xFFFF_FFFF,
                cap: 3000,
                volt: 11_400,
                valid: true,
            }
        );
    }

    #[test]
    fn test_raw_info_reports_validity() {
        let info = RawInfo {
            units: PowerUnit::MilliAmp,
            ..Default::default()
        };
        let snapshot = raw_info_snapshot(&DeviceId::from("BAT1"), &info);
        assert_eq!(snapshot.units, "mAh");
        assert_eq!(snapshot.lfcap, 0);
        assert_eq!(snapshot.technology, "secondary");
        assert!(!snapshot.valid);
    }

    #[test]
    fn test_counters_from_wire() {
        let wire = CountersSnapshot {
            life: 80,
            time: -1,
            state: 2,
            units: 2,
            info_expire: 5,
        };
        let counters = counters_from_wire(&wire);
        assert_eq!(counters_snapshot(&counters), wire);
        assert_eq!(counters.value("time").unwrap(), -1);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(error_kind(&AggregateError::NoDevices), ErrorKind::NoDevices);
        assert_eq!(
            error_kind(&AggregateError::DeviceGone(DeviceId::from("BAT0"))),
            ErrorKind::DeviceGone
        );
        assert_eq!(
            error_kind(&AggregateError::NoSuchDevice("unit 4".to_string())),
            ErrorKind::NoSuchDevice
        );
        assert_eq!(
            error_kind(&AggregateError::Source(SourceError::Unavailable(
                "down".to_string()
            ))),
            ErrorKind::Transport
        );
    }
}
