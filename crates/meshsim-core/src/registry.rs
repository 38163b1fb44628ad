//! The authoritative registry of live peers.
//!
//! Single source of truth for peer identity and existence. All mutations go
//! through the session manager or the router-applied peer commands, each a
//! single critical section over one lock, so every operation is atomic and
//! linearizable with respect to `lookup`/`list_active`: a peer is visible no
//! earlier than its creation returns and gone no later than its deletion
//! returns.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use meshsim_peer::{Metadata, PeerEvent, PeerId};
use meshsim_topology::GeoCoord;

use crate::error::{Error, Result};

/// Internal registry entry for one live peer.
pub(crate) struct PeerEntry {
    pub(crate) coord: GeoCoord,
    pub(crate) metadata: Metadata,
    pub(crate) debug_status: Option<String>,
    pub(crate) neighbors: Vec<PeerId>,
    pub(crate) mailbox: mpsc::UnboundedSender<PeerEvent>,
    pub(crate) alive: Arc<AtomicBool>,
}

impl PeerEntry {
    pub(crate) fn new(
        coord: GeoCoord,
        metadata: Metadata,
        mailbox: mpsc::UnboundedSender<PeerEvent>,
        alive: Arc<AtomicBool>,
    ) -> Self {
        Self {
            coord,
            metadata,
            debug_status: None,
            neighbors: Vec::new(),
            mailbox,
            alive,
        }
    }
}

/// Externally visible view of one peer.
#[derive(Debug, Clone, Serialize)]
pub struct PeerInfo {
    pub id: PeerId,
    pub coord: GeoCoord,
    pub metadata: Metadata,
    pub debug_status: Option<String>,
    pub neighbors: Vec<PeerId>,
}

/// A routing snapshot of one active peer, taken per tick cycle.
pub(crate) struct ActivePeer {
    pub(crate) id: PeerId,
    pub(crate) coord: GeoCoord,
    pub(crate) mailbox: mpsc::UnboundedSender<PeerEvent>,
}

/// High-level snapshot of the whole simulation, for external observers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Overview {
    #[serde(rename = "TS")]
    pub ts: i64,
    #[serde(rename = "Actors")]
    pub actors: BTreeMap<PeerId, OverviewEntry>,
}

/// One peer's slice of the [`Overview`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverviewEntry {
    #[serde(rename = "ID")]
    pub id: PeerId,
    #[serde(rename = "Coord")]
    pub coord: GeoCoord,
    #[serde(rename = "Peers")]
    pub peers: Vec<PeerId>,
    #[serde(rename = "Meta")]
    pub meta: Metadata,
    #[serde(rename = "Debug")]
    pub debug: Option<String>,
}

/// The live peer table.
#[derive(Default)]
pub struct Registry {
    peers: RwLock<HashMap<PeerId, PeerEntry>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new peer, enforcing the optional capacity limit atomically.
    pub(crate) fn try_insert(
        &self,
        id: PeerId,
        entry: PeerEntry,
        limit: Option<usize>,
    ) -> Result<()> {
        let mut peers = self.peers.write();
        if let Some(limit) = limit {
            if peers.len() >= limit {
                return Err(Error::ResourceExhausted { limit });
            }
        }
        peers.insert(id, entry);
        Ok(())
    }

    /// Remove a peer, clearing its alive flag before the entry goes away so
    /// queued deliveries are suppressed from the instant of removal.
    pub(crate) fn remove(&self, id: &PeerId) -> Option<PeerEntry> {
        let mut peers = self.peers.write();
        if let Some(entry) = peers.get(id) {
            entry.alive.store(false, Ordering::Release);
        }
        peers.remove(id)
    }

    /// Resolve an identifier to its current state.
    pub fn lookup(&self, id: &PeerId) -> Option<PeerInfo> {
        let peers = self.peers.read();
        peers.get(id).map(|entry| PeerInfo {
            id: id.clone(),
            coord: entry.coord,
            metadata: entry.metadata.clone(),
            debug_status: entry.debug_status.clone(),
            neighbors: entry.neighbors.clone(),
        })
    }

    /// Identifiers of all live peers.
    pub fn list_active(&self) -> Vec<PeerId> {
        self.peers.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.peers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.read().is_empty()
    }

    /// Overwrite a peer's debug status; latest write wins.
    /// Returns false if the peer is no longer live.
    pub fn set_debug_message(&self, id: &PeerId, status: String) -> bool {
        let mut peers = self.peers.write();
        match peers.get_mut(id) {
            Some(entry) => {
                entry.debug_status = Some(status);
                true
            }
            None => false,
        }
    }

    /// Move a peer. The coordinate has already passed validation.
    pub fn set_coordinate(&self, id: &PeerId, coord: GeoCoord) -> bool {
        let mut peers = self.peers.write();
        match peers.get_mut(id) {
            Some(entry) => {
                entry.coord = coord;
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_neighbors(&self, id: &PeerId, neighbors: Vec<PeerId>) {
        if let Some(entry) = self.peers.write().get_mut(id) {
            entry.neighbors = neighbors;
        }
    }

    /// Mailbox of a live peer, if any. Used for message delivery; an absent
    /// entry means the destination is inactive and the message is dropped.
    pub(crate) fn mailbox(&self, id: &PeerId) -> Option<mpsc::UnboundedSender<PeerEvent>> {
        self.peers.read().get(id).map(|e| e.mailbox.clone())
    }

    /// Consistent per-cycle snapshot of all active peers.
    pub(crate) fn active_snapshot(&self) -> Vec<ActivePeer> {
        self.peers
            .read()
            .iter()
            .map(|(id, entry)| ActivePeer {
                id: id.clone(),
                coord: entry.coord,
                mailbox: entry.mailbox.clone(),
            })
            .collect()
    }

    /// Build the observer-facing overview with a wall-clock timestamp.
    pub fn overview(&self) -> Overview {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or_default();
        let peers = self.peers.read();
        let actors = peers
            .iter()
            .map(|(id, entry)| {
                (
                    id.clone(),
                    OverviewEntry {
                        id: id.clone(),
                        coord: entry.coord,
                        peers: entry.neighbors.clone(),
                        meta: entry.metadata.clone(),
                        debug: entry.debug_status.clone(),
                    },
                )
            })
            .collect();
        Overview { ts, actors }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> (PeerEntry, Arc<AtomicBool>) {
        let (tx, _rx) = mpsc::unbounded_channel();
        let alive = Arc::new(AtomicBool::new(true));
        (
            PeerEntry::new(
                GeoCoord::new(53.9, 27.5),
                Metadata::new(),
                tx,
                Arc::clone(&alive),
            ),
            alive,
        )
    }

    #[test]
    fn insert_lookup_remove() {
        let registry = Registry::new();
        let id = PeerId::random();
        let (e, _alive) = entry();
        registry.try_insert(id.clone(), e, None).unwrap();

        assert!(registry.lookup(&id).is_some());
        assert_eq!(registry.list_active(), vec![id.clone()]);

        assert!(registry.remove(&id).is_some());
        assert!(registry.lookup(&id).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_clears_alive_flag() {
        let registry = Registry::new();
        let id = PeerId::random();
        let (e, alive) = entry();
        registry.try_insert(id.clone(), e, None).unwrap();

        registry.remove(&id);
        assert!(!alive.load(Ordering::Acquire));
    }

    #[test]
    fn capacity_limit_is_enforced() {
        let registry = Registry::new();
        for _ in 0..2 {
            let (e, _alive) = entry();
            registry.try_insert(PeerId::random(), e, Some(2)).unwrap();
        }
        let (e, _alive) = entry();
        match registry.try_insert(PeerId::random(), e, Some(2)) {
            Err(Error::ResourceExhausted { limit }) => assert_eq!(limit, 2),
            other => panic!("expected ResourceExhausted, got {other:?}"),
        }
    }

    #[test]
    fn debug_status_latest_write_wins() {
        let registry = Registry::new();
        let id = PeerId::random();
        let (e, _alive) = entry();
        registry.try_insert(id.clone(), e, None).unwrap();

        assert!(registry.set_debug_message(&id, "one".into()));
        assert!(registry.set_debug_message(&id, "two".into()));
        assert_eq!(registry.lookup(&id).unwrap().debug_status.as_deref(), Some("two"));

        registry.remove(&id);
        assert!(!registry.set_debug_message(&id, "three".into()));
    }

    #[test]
    fn overview_reflects_entries() {
        let registry = Registry::new();
        let id = PeerId::random();
        let (e, _alive) = entry();
        registry.try_insert(id.clone(), e, None).unwrap();
        registry.set_debug_message(&id, "status".into());

        let overview = registry.overview();
        assert!(overview.ts > 0);
        let actor = overview.actors.get(&id).unwrap();
        assert_eq!(actor.id, id);
        assert_eq!(actor.debug.as_deref(), Some("status"));

        let json = serde_json::to_value(&overview).unwrap();
        assert!(json.get("TS").is_some());
        assert!(json["Actors"][id.as_str()].get("Coord").is_some());
    }
}
