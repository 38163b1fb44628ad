//! Meshsim Core
//!
//! The peer session protocol and event-dispatch engine of the mesh peer
//! simulator.
//!
//! # Architecture
//!
//! - [`Registry`] is the single source of truth for peer identity and
//!   existence. Every mutation is one critical section, so lookups and
//!   listings are linearizable against creation and deletion.
//! - [`SessionManager`] creates and deletes peers. Creation validates the
//!   coordinate and compiles the behavior script before any state exists;
//!   deletion suppresses all further delivery the instant it returns.
//! - The event router (one task) drives tick cycles: it feeds peer
//!   positions to the reachability oracle, diffs the resulting edge set
//!   against the previous cycle, and emits appeared/disappeared transitions
//!   plus the tick. Peer-originated commands — message sends, debug-status
//!   and coordinate updates — are applied immediately in receipt order.
//! - Each peer's behavior program runs on its own task
//!   ([`meshsim_peer::PeerRuntime`]), one handler invocation at a time.
//!
//! [`MeshSim`] wires these together.

mod error;
mod registry;
mod router;
mod session;
mod sim;

pub use error::{Error, Result};
pub use registry::{Overview, OverviewEntry, PeerInfo, Registry};
pub use session::SessionManager;
pub use sim::{MeshSim, SimConfig};

pub use meshsim_peer::{
    Behavior, BehaviorError, MeshApi, Metadata, NetTime, Payload, PeerId, ScriptBehavior,
};
pub use meshsim_topology::{GeoCoord, InvalidCoordinate, ProximityOracle, ReachabilityOracle};
