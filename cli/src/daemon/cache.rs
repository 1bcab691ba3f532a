use std::time::{Duration, Instant};

use battinfo_protocol::BatteryInfoSnapshot;

/// Holds the last all-units reading for the advertised expiry.
pub struct InfoCache {
    expire: Duration,
    entry: Option<(Instant, BatteryInfoSnapshot)>,
}

impl InfoCache {
    pub fn new(expire: Duration) -> Self {
        Self {
            expire,
            entry: None,
        }
    }

    /// Cached reading, when it is younger than the expiry.
    pub fn get(&self, now: Instant) -> Option<&BatteryInfoSnapshot> {
        match &self.entry {
            Some((at, info)) if now.saturating_duration_since(*at) < self.expire => Some(info),
            _ => None,
        }
    }

    pub fn store(&mut self, now: Instant, info: BatteryInfoSnapshot) {
        self.entry = Some((now, info));
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    pub fn age(&self, now: Instant) -> Option<Duration> {
        self.entry
            .as_ref()
            .map(|(at, _)| now.saturating_duration_since(*at))
    }
}
