//! Error types for meshsim-core.

use meshsim_peer::{PeerId, ScriptError};
use meshsim_topology::InvalidCoordinate;
use thiserror::Error;

/// Result type for meshsim-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to the control plane.
///
/// Handler faults are deliberately absent: a fault inside a peer's behavior
/// program is contained by the peer runtime and never reaches the caller of
/// create/delete.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested coordinate is not a finite in-range pair.
    #[error(transparent)]
    InvalidCoordinate(#[from] InvalidCoordinate),

    /// The behavior script was rejected at load time.
    #[error("invalid script: {0}")]
    InvalidScript(#[from] ScriptError),

    /// The identifier does not resolve to a live peer.
    #[error("peer not found: {0}")]
    NotFound(PeerId),

    /// The configured peer-count limit is reached.
    #[error("peer limit reached ({limit})")]
    ResourceExhausted { limit: usize },

    /// The simulator has been shut down.
    #[error("simulator is shut down")]
    Shutdown,
}
