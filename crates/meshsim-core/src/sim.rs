//! Simulator assembly.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use meshsim_peer::{Payload, PeerId};
use meshsim_topology::{ProximityOracle, ReachabilityOracle, DEFAULT_RANGE_M};

use crate::error::{Error, Result};
use crate::registry::{Overview, Registry};
use crate::router::{ControlMsg, EventRouter};
use crate::session::SessionManager;

/// Configuration for a simulator instance.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Length of one tick cycle.
    pub tick_interval: Duration,
    /// Communication range fed to the default proximity oracle, in meters.
    pub max_range_m: f64,
    /// Optional cap on the number of live peers.
    pub max_peers: Option<usize>,
    /// Operation limit per script evaluation; 0 disables the limit.
    pub script_ops: u64,
    /// Standard deviation, in degrees, of the scatter applied to spawn
    /// coordinates. Zero places peers exactly where requested.
    pub spawn_jitter_deg: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(100),
            max_range_m: DEFAULT_RANGE_M,
            max_peers: None,
            script_ops: 500_000,
            spawn_jitter_deg: 0.0,
        }
    }
}

/// A running mesh simulation: registry, session manager, and router task.
pub struct MeshSim {
    registry: Arc<Registry>,
    sessions: SessionManager,
    control: mpsc::UnboundedSender<ControlMsg>,
    router: JoinHandle<()>,
}

impl MeshSim {
    /// Start a simulator with the default proximity oracle.
    pub fn start(config: SimConfig) -> Self {
        let oracle = ProximityOracle::new(config.max_range_m);
        Self::with_oracle(config, Box::new(oracle))
    }

    /// Start a simulator with a custom reachability oracle.
    pub fn with_oracle(config: SimConfig, oracle: Box<dyn ReachabilityOracle>) -> Self {
        let registry = Arc::new(Registry::new());
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (control_tx, control_rx) = mpsc::unbounded_channel();

        let router = EventRouter::new(
            Arc::clone(&registry),
            oracle,
            command_rx,
            control_rx,
            config.tick_interval,
        );
        let router = tokio::spawn(router.run());

        let sessions = SessionManager::new(Arc::clone(&registry), command_tx, &config);

        Self {
            registry,
            sessions,
            control: control_tx,
            router,
        }
    }

    /// Peer lifecycle operations.
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// The live peer table.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Observer-facing snapshot of all live peers.
    pub fn overview(&self) -> Overview {
        self.registry.overview()
    }

    /// Inject a message on behalf of peer `from`.
    ///
    /// Empty `targets` broadcasts to the peer's current neighbors. Fails
    /// with `NotFound` if `from` is not a live peer.
    pub async fn send_message(
        &self,
        from: PeerId,
        targets: Vec<PeerId>,
        payload: Payload,
    ) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.control
            .send(ControlMsg::Inject {
                from,
                targets,
                payload,
                reply,
            })
            .map_err(|_| Error::Shutdown)?;
        response.await.map_err(|_| Error::Shutdown)?
    }

    /// Tear down every peer and stop the router.
    pub fn shutdown(&self) {
        for id in self.registry.list_active() {
            let _ = self.sessions.delete_peer(&id);
        }
        self.router.abort();
    }
}
