//! Live kiosk presence registry with TTL eviction
//!
//! Kiosks announce themselves periodically over MQTT. The registry keeps one
//! record per device ID and lazily evicts entries that have been silent
//! longer than [`KIOSK_TTL`] the next time the live set is read.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::Result;

/// Maximum silence duration after which a kiosk is no longer considered live
pub const KIOSK_TTL: Duration = Duration::from_secs(60);

/// A presence announcement payload published by a kiosk
#[derive(Debug, Deserialize)]
pub struct KioskAnnouncement {
    /// Stable device identity, distinct from the network address
    #[serde(rename = "deviceId")]
    pub device_id: String,

    /// IPv4 address or hostname the kiosk is reachable on
    pub ip4: String,

    /// Human-readable device name
    #[serde(rename = "deviceName")]
    pub device_name: String,
}

/// Address and display name of a currently-live kiosk
///
/// Snapshot element - a value copy, unaffected by later registry mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KioskEndpoint {
    /// Network address from the most recent announcement
    pub address: String,

    /// Display name from the most recent announcement
    pub display_name: String,
}

#[derive(Debug, Clone)]
struct KioskRecord {
    address: String,
    display_name: String,
    last_seen: Instant,
}

/// Registry of currently-reachable kiosks keyed by device ID
///
/// The internal map is the only mutable shared state in the gateway. It is
/// guarded by a single exclusive lock covering both eviction and read/write,
/// held only for the duration of the map operation - never across a network
/// call.
#[derive(Debug, Default)]
pub struct KioskRegistry {
    kiosks: Mutex<HashMap<String, KioskRecord>>,
}

impl KioskRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode an announcement payload and register the kiosk
    ///
    /// # Errors
    ///
    /// Returns a decode error for malformed payloads; the registry is left
    /// unchanged in that case.
    pub fn ingest(&self, payload: &[u8]) -> Result<()> {
        let announcement: KioskAnnouncement = serde_json::from_slice(payload)?;
        tracing::debug!(
            device_id = %announcement.device_id,
            address = %announcement.ip4,
            "announcement received"
        );
        self.upsert(
            &announcement.device_id,
            &announcement.ip4,
            &announcement.device_name,
        );
        Ok(())
    }

    /// Create or overwrite the record for `device_id` with `last_seen = now`
    ///
    /// Address and display name always reflect the most recent announcement.
    pub fn upsert(&self, device_id: &str, address: &str, display_name: &str) {
        self.upsert_at(device_id, address, display_name, Instant::now());
    }

    /// Evict stale entries, then return a value copy of the live set
    ///
    /// Eviction and read happen under the same critical section so a
    /// snapshot never contains an entry concurrently being evicted.
    #[must_use]
    pub fn live_snapshot(&self) -> Vec<KioskEndpoint> {
        self.live_snapshot_at(Instant::now())
    }

    fn upsert_at(&self, device_id: &str, address: &str, display_name: &str, now: Instant) {
        let mut kiosks = self.kiosks.lock().unwrap_or_else(PoisonError::into_inner);
        let record = KioskRecord {
            address: address.to_string(),
            display_name: display_name.to_string(),
            last_seen: now,
        };
        if kiosks.insert(device_id.to_string(), record).is_none() {
            tracing::info!(device_id, address, display_name, "discovered new kiosk");
        }
    }

    fn live_snapshot_at(&self, now: Instant) -> Vec<KioskEndpoint> {
        let mut kiosks = self.kiosks.lock().unwrap_or_else(PoisonError::into_inner);
        kiosks.retain(|device_id, record| {
            // Strictly-exceeds semantics: a record exactly TTL old is kept.
            let live = now.duration_since(record.last_seen) <= KIOSK_TTL;
            if !live {
                tracing::info!(
                    device_id,
                    address = %record.address,
                    display_name = %record.display_name,
                    "kiosk timed out"
                );
            }
            live
        });
        kiosks
            .values()
            .map(|record| KioskEndpoint {
                address: record.address.clone(),
                display_name: record.display_name.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_announcement_wins() {
        let registry = KioskRegistry::new();
        registry.upsert("kiosk-1", "10.0.0.1", "Lobby");
        registry.upsert("kiosk-1", "10.0.0.2", "Lobby East");
        registry.upsert("kiosk-1", "10.0.0.3", "Lobby West");

        let snapshot = registry.live_snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].address, "10.0.0.3");
        assert_eq!(snapshot[0].display_name, "Lobby West");
    }

    #[test]
    fn record_present_just_inside_ttl() {
        let registry = KioskRegistry::new();
        let t0 = Instant::now();
        registry.upsert_at("kiosk-1", "10.0.0.1", "Lobby", t0);

        let just_inside = t0 + KIOSK_TTL - Duration::from_millis(1);
        assert_eq!(registry.live_snapshot_at(just_inside).len(), 1);
    }

    #[test]
    fn record_evicted_just_past_ttl() {
        let registry = KioskRegistry::new();
        let t0 = Instant::now();
        registry.upsert_at("kiosk-1", "10.0.0.1", "Lobby", t0);

        let just_past = t0 + KIOSK_TTL + Duration::from_millis(1);
        assert!(registry.live_snapshot_at(just_past).is_empty());

        // Eviction is permanent - the record stays gone at later reads too.
        assert!(registry.live_snapshot_at(t0 + KIOSK_TTL).is_empty());
    }

    #[test]
    fn announcement_refreshes_ttl() {
        let registry = KioskRegistry::new();
        let t0 = Instant::now();
        registry.upsert_at("kiosk-1", "10.0.0.1", "Lobby", t0);

        let t1 = t0 + Duration::from_secs(45);
        registry.upsert_at("kiosk-1", "10.0.0.1", "Lobby", t1);

        // 90s after first sighting, but only 45s after the refresh.
        let t2 = t0 + Duration::from_secs(90);
        assert_eq!(registry.live_snapshot_at(t2).len(), 1);
    }

    #[test]
    fn snapshot_is_isolated_from_later_upserts() {
        let registry = KioskRegistry::new();
        registry.upsert("kiosk-1", "10.0.0.1", "Lobby");

        let snapshot = registry.live_snapshot();
        registry.upsert("kiosk-2", "10.0.0.2", "Cafe");
        registry.upsert("kiosk-1", "10.0.0.9", "Lobby Moved");

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].address, "10.0.0.1");
    }

    #[test]
    fn ingest_decodes_announcement_payload() {
        let registry = KioskRegistry::new();
        let payload = br#"{"deviceId": "abc123", "ip4": "192.168.1.40", "deviceName": "Hall"}"#;
        registry.ingest(payload).unwrap();

        let snapshot = registry.live_snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].address, "192.168.1.40");
        assert_eq!(snapshot[0].display_name, "Hall");
    }

    #[test]
    fn malformed_payload_leaves_registry_unchanged() {
        let registry = KioskRegistry::new();
        registry.upsert("kiosk-1", "10.0.0.1", "Lobby");

        assert!(registry.ingest(b"not json").is_err());
        assert!(registry.ingest(b"{\"deviceId\": \"x\"}").is_err());

        let snapshot = registry.live_snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].address, "10.0.0.1");
    }
}
