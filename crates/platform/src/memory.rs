//! In-memory source for tests, demos and fixture files.

use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::info::RawInfo;
use crate::source::{BatterySource, DeviceId, Result, SourceError};
use crate::status::RawStatus;
use crate::types::{BatteryChemistry, PowerUnit, UNKNOWN_VALUE};

/// Failure injected into a device's fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fault {
    /// Status fetch fails with a transport error.
    Status,
    /// Info fetch fails with a transport error.
    Info,
    /// Device resolves but every fetch reports it gone.
    Gone,
    /// Device is still listed but can no longer be resolved.
    Vanished,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryDevice {
    pub id: DeviceId,
    pub present: bool,
    pub status: RawStatus,
    pub info: RawInfo,
    pub fault: Option<Fault>,
}

impl MemoryDevice {
    pub fn new(id: impl Into<DeviceId>, status: RawStatus, info: RawInfo) -> Self {
        Self {
            id: id.into(),
            present: true,
            status,
            info,
            fault: None,
        }
    }

    pub fn absent(mut self) -> Self {
        self.present = false;
        self
    }

    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.fault = Some(fault);
        self
    }
}

/// Battery source holding its devices in memory, in insertion order.
#[derive(Debug, Default)]
pub struct MemorySource {
    devices: Mutex<Vec<MemoryDevice>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(self, device: MemoryDevice) -> Self {
        self.insert(device);
        self
    }

    /// Adds a device, replacing any existing device with the same id.
    pub fn insert(&self, device: MemoryDevice) {
        let mut devices = self.lock();
        match devices.iter_mut().find(|d| d.id == device.id) {
            Some(existing) => *existing = device,
            None => devices.push(device),
        }
    }

    pub fn remove(&self, id: &DeviceId) -> Option<MemoryDevice> {
        let mut devices = self.lock();
        let index = devices.iter().position(|d| &d.id == id)?;
        Some(devices.remove(index))
    }

    pub fn update_status(&self, id: &DeviceId, status: RawStatus) -> bool {
        self.modify(id, |device| device.status = status)
    }

    pub fn set_fault(&self, id: &DeviceId, fault: Option<Fault>) -> bool {
        self.modify(id, |device| device.fault = fault)
    }

    /// Parses a TOML fixture with one `[[battery]]` table per device.
    pub fn from_fixture_str(content: &str) -> Result<Self> {
        let fixture: Fixture = toml::from_str(content).map_err(|e| SourceError::Parse {
            what: "battery fixture".to_string(),
            reason: e.to_string(),
        })?;
        let source = Self::new();
        for battery in fixture.battery {
            source.insert(battery.into_device());
        }
        Ok(source)
    }

    pub fn load_fixture(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_fixture_str(&content)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<MemoryDevice>> {
        self.devices.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn modify(&self, id: &DeviceId, f: impl FnOnce(&mut MemoryDevice)) -> bool {
        let mut devices = self.lock();
        match devices.iter_mut().find(|d| &d.id == id) {
            Some(device) => {
                f(device);
                true
            }
            None => false,
        }
    }

    fn with_resolved<T>(
        &self,
        id: &DeviceId,
        f: impl FnOnce(&MemoryDevice) -> Result<T>,
    ) -> Result<T> {
        let devices = self.lock();
        match devices.iter().find(|d| &d.id == id) {
            Some(device) if !matches!(device.fault, Some(Fault::Gone | Fault::Vanished)) => {
                f(device)
            }
            _ => Err(SourceError::Gone(id.clone())),
        }
    }
}

impl BatterySource for MemorySource {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn list_devices(&self) -> Result<Vec<DeviceId>> {
        Ok(self.lock().iter().map(|d| d.id.clone()).collect())
    }

    fn exists(&self, id: &DeviceId) -> bool {
        self.lock()
            .iter()
            .any(|d| &d.id == id && d.fault != Some(Fault::Vanished))
    }

    fn is_present(&self, id: &DeviceId) -> bool {
        self.lock().iter().any(|d| &d.id == id && d.present)
    }

    fn fetch_status(&self, id: &DeviceId) -> Result<RawStatus> {
        self.with_resolved(id, |device| match device.fault {
            Some(Fault::Status) => Err(injected(id, "status")),
            _ => Ok(device.status),
        })
    }

    fn fetch_info(&self, id: &DeviceId) -> Result<RawInfo> {
        self.with_resolved(id, |device| match device.fault {
            Some(Fault::Info) => Err(injected(id, "info")),
            _ => Ok(device.info.clone()),
        })
    }
}

fn injected(id: &DeviceId, what: &str) -> SourceError {
    SourceError::Io(std::io::Error::other(format!(
        "injected {what} failure on {id}"
    )))
}

#[derive(Debug, Deserialize)]
struct Fixture {
    #[serde(default)]
    battery: Vec<FixtureBattery>,
}

/// One device in a fixture file. Readings use firmware words, so
/// `4294967295` marks an unknown value and omitted readings are unknown.
#[derive(Debug, Deserialize)]
struct FixtureBattery {
    name: String,
    #[serde(default = "default_present")]
    present: bool,
    #[serde(default)]
    state: u32,
    rate: Option<u32>,
    remaining_capacity: Option<u32>,
    voltage: Option<u32>,
    #[serde(default)]
    last_full_capacity: u32,
    design_capacity: Option<u32>,
    #[serde(default)]
    units: PowerUnit,
    model: Option<String>,
    serial: Option<String>,
    chemistry: Option<String>,
    fault: Option<Fault>,
}

fn default_present() -> bool {
    true
}

impl FixtureBattery {
    fn into_device(self) -> MemoryDevice {
        let status = RawStatus::from_firmware(
            self.state,
            self.rate.unwrap_or(UNKNOWN_VALUE),
            self.remaining_capacity.unwrap_or(UNKNOWN_VALUE),
            self.voltage.unwrap_or(UNKNOWN_VALUE),
        );
        let info = RawInfo {
            units: self.units,
            design_capacity: self.design_capacity,
            last_full_capacity: self.last_full_capacity,
            model: self.model,
            serial: self.serial,
            chemistry: self
                .chemistry
                .as_deref()
                .map(BatteryChemistry::from_label)
                .unwrap_or_default(),
            ..Default::default()
        };
        MemoryDevice {
            id: DeviceId::new(self.name),
            present: self.present,
            status,
            info,
            fault: self.fault,
        }
    }
}
