//! Peer lifecycle: creation and deletion.

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use parking_lot::Mutex;
use rand_distr::{Distribution, Normal};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use meshsim_peer::{Behavior, Command, MeshApi, Metadata, PeerId, PeerRuntime, ScriptBehavior};
use meshsim_topology::GeoCoord;

use crate::error::{Error, Result};
use crate::registry::{PeerEntry, Registry};
use crate::sim::SimConfig;

/// Creates and destroys peers.
///
/// Creation is atomic all-or-nothing: validation and script compilation
/// happen before any identifier is allocated, so a failed request leaves no
/// registry entry and no runtime behind. Deletion clears the peer's alive
/// flag and drops its registry entry in one step; the runtime task then
/// drains its mailbox without delivering and exits on its own.
pub struct SessionManager {
    registry: Arc<Registry>,
    commands: mpsc::UnboundedSender<Command>,
    tasks: Mutex<HashMap<PeerId, JoinHandle<()>>>,
    max_peers: Option<usize>,
    script_ops: u64,
    spawn_jitter_deg: f64,
}

impl SessionManager {
    pub(crate) fn new(
        registry: Arc<Registry>,
        commands: mpsc::UnboundedSender<Command>,
        config: &SimConfig,
    ) -> Self {
        Self {
            registry,
            commands,
            tasks: Mutex::new(HashMap::new()),
            max_peers: config.max_peers,
            script_ops: config.script_ops,
            spawn_jitter_deg: config.spawn_jitter_deg,
        }
    }

    /// Create a peer from a behavior script.
    ///
    /// The script must parse; a syntax error rejects the whole request
    /// before any peer state exists.
    pub fn create_script_peer(
        &self,
        coord: GeoCoord,
        script: &str,
        metadata: Metadata,
    ) -> Result<PeerId> {
        let behavior = ScriptBehavior::compile(script, self.script_ops)?;
        self.create_peer(coord, Box::new(behavior), metadata)
    }

    /// Create a peer from a native behavior program.
    ///
    /// Returns the fresh identifier; by the time this returns, the peer is
    /// visible to `lookup`/`list_active` and will receive the next cycle's
    /// events. Its startup phase runs on the peer's own task.
    pub fn create_peer(
        &self,
        coord: GeoCoord,
        behavior: Box<dyn Behavior>,
        metadata: Metadata,
    ) -> Result<PeerId> {
        let coord = GeoCoord::checked(coord.lat, coord.lon)?;
        let coord = self.jitter(coord);

        let id = PeerId::random();
        let (mailbox_tx, mailbox_rx) = mpsc::unbounded_channel();
        let alive = Arc::new(AtomicBool::new(true));

        let entry = PeerEntry::new(coord, metadata, mailbox_tx, Arc::clone(&alive));
        self.registry.try_insert(id.clone(), entry, self.max_peers)?;

        let api = MeshApi::new(id.clone(), self.commands.clone());
        let handle = PeerRuntime::spawn(api, behavior, mailbox_rx, alive);
        self.tasks.lock().insert(id.clone(), handle);

        tracing::info!(peer = %id, %coord, "peer created");
        Ok(id)
    }

    /// Delete a peer.
    ///
    /// Safe to call concurrently with in-flight event delivery: the alive
    /// flag is cleared before the entry is removed, so anything still
    /// queued for the peer is drained without being delivered, and the
    /// runtime task exits once its mailbox closes.
    pub fn delete_peer(&self, id: &PeerId) -> Result<()> {
        self.registry
            .remove(id)
            .ok_or_else(|| Error::NotFound(id.clone()))?;
        // Dropping the entry closed the mailbox; the task winds down on its
        // own, so the handle is only detached here.
        self.tasks.lock().remove(id);
        tracing::info!(peer = %id, "peer deleted");
        Ok(())
    }

    /// Scatter the spawn position around the requested coordinate, as a
    /// physical deployment would. Disabled when the jitter is zero.
    fn jitter(&self, coord: GeoCoord) -> GeoCoord {
        if self.spawn_jitter_deg <= 0.0 {
            return coord;
        }
        let Ok(normal) = Normal::new(0.0, self.spawn_jitter_deg) else {
            return coord;
        };
        let mut rng = rand::thread_rng();
        let lat = coord.lat + normal.sample(&mut rng);
        let lon = coord.lon + normal.sample(&mut rng);
        // Jitter at the bounds could push the pair out of range; keep the
        // requested coordinate rather than violate the invariant.
        GeoCoord::checked(lat, lon).unwrap_or(coord)
    }
}
