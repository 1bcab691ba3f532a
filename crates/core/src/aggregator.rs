//! Two-pass aggregation of per-battery readings.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use battinfo_platform::{BatterySource, BatteryState, DeviceId, RawInfo, RawStatus, SourceError};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::{AggregateError, Result};
use crate::info::{NormalizedInfo, Target};

/// Default seconds before a battery reading should be re-sampled.
pub const DEFAULT_INFO_EXPIRE_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Refresh interval advertised to caches in front of the aggregator.
    pub info_expire_secs: u64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            info_expire_secs: DEFAULT_INFO_EXPIRE_SECS,
        }
    }
}

/// Per-device working state for one aggregation call.
#[derive(Debug, Default)]
struct Slot {
    info: NormalizedInfo,
    remaining: u64,
    valid: bool,
}

/// What pass 1 fetched from one device.
#[derive(Default)]
struct Sample {
    /// Status block, kept even when the device turns out unusable.
    status: Option<RawStatus>,
    /// Set only when both blocks passed their validity checks.
    reading: Option<Reading>,
}

/// A device reading that passed both validity checks.
struct Reading {
    remaining: u64,
    last_full: u64,
}

/// Combines the readings of every battery a [`BatterySource`] exposes.
///
/// All accumulators live on the stack of each call. The only shared state is
/// the transport lock, which keeps the device queries of one call together.
pub struct Aggregator<S> {
    source: S,
    config: AggregatorConfig,
    transport: Mutex<()>,
}

impl<S: BatterySource> Aggregator<S> {
    pub fn new(source: S, config: AggregatorConfig) -> Self {
        Self {
            source,
            config,
            transport: Mutex::new(()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Recommended refresh interval for callers that cache results.
    pub fn info_expire(&self) -> Duration {
        Duration::from_secs(self.config.info_expire_secs)
    }

    /// Number of battery devices. Zero when enumeration fails, while the
    /// other operations report that as `NoDevices`.
    pub fn unit_count(&self) -> usize {
        match self.source.list_devices() {
            Ok(devices) => devices.len(),
            Err(e) => {
                warn!(source = self.source.name(), error = %e, "Battery enumeration failed");
                0
            }
        }
    }

    pub fn devices(&self) -> Result<Vec<DeviceId>> {
        self.source.list_devices().map_err(|e| {
            warn!(source = self.source.name(), error = %e, "Battery enumeration failed");
            AggregateError::NoDevices
        })
    }

    /// Resolves a unit number to its device.
    pub fn device_at(&self, unit: usize) -> Result<DeviceId> {
        let devices = self.devices()?;
        if devices.is_empty() {
            return Err(AggregateError::NoDevices);
        }
        devices
            .into_iter()
            .nth(unit)
            .ok_or_else(|| AggregateError::NoSuchDevice(format!("unit {unit}")))
    }

    /// Raw info block of one device. Validity is not enforced.
    pub fn raw_info(&self, device: &DeviceId) -> Result<RawInfo> {
        self.ensure_listed(device)?;
        let _transport = self.lock_transport();
        Ok(self.source.fetch_info(device)?)
    }

    /// Raw status block of one device. Validity is not enforced.
    pub fn raw_status(&self, device: &DeviceId) -> Result<RawStatus> {
        self.ensure_listed(device)?;
        let _transport = self.lock_transport();
        Ok(self.source.fetch_status(device)?)
    }

    /// Normalized reading for one battery or the whole system.
    ///
    /// Devices that are absent, fail to answer, or report invalid readings
    /// count as "not present". A single target still reports the rate of its
    /// status block when that block could be fetched. The call fails when a
    /// device vanishes mid-query or a requested device does not exist.
    /// Enumeration failure is `NoDevices`. With no usable battery at all the
    /// not-present reading is returned.
    ///
    /// Minutes are computed per device against the summed discharge rate of
    /// all batteries and then added up. This matches sequentially drained
    /// packs where only the active one reports a rate, and is only an
    /// approximation when several discharge at once.
    pub fn battery_info(&self, target: &Target) -> Result<NormalizedInfo> {
        let devices = self.devices()?;

        let mut slots: Vec<Slot> = Vec::with_capacity(devices.len());
        let mut target_index = None;
        let mut combined_state = BatteryState::empty();
        let mut total_rate: u64 = 0;
        let mut valid_units: u64 = 0;

        // Pass 1: status, capacity and summed discharge rate per battery.
        {
            let _transport = self.lock_transport();

            for (i, device) in devices.iter().enumerate() {
                if !self.source.exists(device) {
                    warn!(%device, "Battery vanished during enumeration");
                    return Err(AggregateError::DeviceGone(device.clone()));
                }

                let mut slot = Slot::default();

                if matches!(target, Target::Device(wanted) if wanted == device) {
                    target_index = Some(i);
                }

                let sample = self.read_sample(device)?;
                if let Some(status) = &sample.status {
                    // A single target reports its own rate even when unusable.
                    slot.info.rate = status.rate;
                }

                if let (Some(status), Some(reading)) = (sample.status, sample.reading) {
                    let Reading {
                        remaining,
                        last_full,
                    } = reading;

                    valid_units += 1;
                    combined_state |= status.state;

                    // Some firmware reports design capacity instead of the
                    // real one when full, so cap at 100.
                    let percent = (100 * remaining / last_full).min(100);

                    slot.valid = true;
                    slot.remaining = remaining;
                    slot.info = NormalizedInfo {
                        capacity_percent: Some(percent as u8),
                        minutes_remaining: None,
                        state: status.state,
                        rate: status.rate,
                    };

                    if let Some(rate) = status.discharge_rate() {
                        total_rate += u64::from(rate);
                    }
                }

                slots.push(slot);
            }
        }

        if let (Target::Device(wanted), None) = (target, target_index) {
            return Err(AggregateError::NoSuchDevice(wanted.to_string()));
        }

        // Pass 2: remaining time per battery against the summed rate.
        let mut total_cap: u64 = 0;
        let mut total_min: u64 = 0;
        for slot in slots.iter_mut().filter(|s| s.valid) {
            let minutes = if total_rate > 0 {
                60 * slot.remaining / total_rate
            } else {
                0
            };
            slot.info.minutes_remaining = Some(saturate(minutes));
            total_min += minutes;
            total_cap += slot.info.capacity_percent.map_or(0, u64::from);
        }

        if valid_units == 0 {
            debug!(%target, devices = devices.len(), "No valid battery units");
            return Ok(NormalizedInfo::not_present());
        }

        let mut result = match target_index {
            Some(i) => slots[i].info,
            None => NormalizedInfo {
                capacity_percent: Some((total_cap / valid_units) as u8),
                minutes_remaining: Some(saturate(total_min)),
                state: combined_state,
                rate: Some(saturate(total_rate)),
            },
        };

        if total_rate == 0 || result.state.is_charging() {
            result.minutes_remaining = None;
        }

        trace!(
            %target,
            valid_units,
            total_rate,
            capacity = result.capacity_raw(),
            minutes = result.minutes_raw(),
            state = result.state.bits(),
            "Aggregated battery info"
        );

        Ok(result)
    }

    /// Fetches both blocks of a device and judges whether they are usable.
    ///
    /// Only a vanished device is an error; anything else makes the device
    /// count as not present.
    fn read_sample(&self, device: &DeviceId) -> Result<Sample> {
        if !self.source.is_present(device) {
            debug!(%device, "Skipping absent battery");
            return Ok(Sample::default());
        }

        let status = match self.source.fetch_status(device) {
            Ok(status) => status,
            Err(e) => {
                fetch_failed(device, e)?;
                return Ok(Sample::default());
            }
        };
        let info = match self.source.fetch_info(device) {
            Ok(info) => info,
            Err(e) => {
                fetch_failed(device, e)?;
                return Ok(Sample {
                    status: Some(status),
                    reading: None,
                });
            }
        };

        if !status.is_valid() {
            debug!(%device, state = status.state.bits(), "Skipping battery with invalid status");
        } else if !info.is_valid() {
            debug!(%device, "Skipping battery with invalid info");
        }
        let reading = status
            .remaining_capacity
            .filter(|_| status.is_valid() && info.is_valid())
            .map(|remaining| Reading {
                remaining: u64::from(remaining),
                last_full: u64::from(info.last_full_capacity),
            });

        Ok(Sample {
            status: Some(status),
            reading,
        })
    }

    fn ensure_listed(&self, device: &DeviceId) -> Result<()> {
        let devices = self.devices()?;
        if devices.is_empty() {
            return Err(AggregateError::NoDevices);
        }
        if devices.contains(device) {
            Ok(())
        } else {
            Err(AggregateError::NoSuchDevice(device.to_string()))
        }
    }

    fn lock_transport(&self) -> MutexGuard<'_, ()> {
        self.transport
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn saturate(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Fails the call for a vanished device, otherwise lets the device be skipped.
fn fetch_failed(device: &DeviceId, err: SourceError) -> Result<()> {
    if err.is_gone() {
        warn!(%device, "Battery disappeared while being queried");
        return Err(err.into());
    }
    debug!(%device, error = %err, "Skipping battery that failed to answer");
    Ok(())
}
