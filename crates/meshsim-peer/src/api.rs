//! The control API exposed to behavior programs.

use tokio::sync::mpsc;

use crate::event::Command;
use crate::types::{Payload, PeerId};

/// Handle through which a behavior program interacts with the mesh.
///
/// Cloneable and cheap; every operation is non-blocking. Effects are
/// enqueued to the event router, so no call here can stall the caller's
/// dispatch loop or wait on another peer.
#[derive(Debug, Clone)]
pub struct MeshApi {
    id: PeerId,
    commands: mpsc::UnboundedSender<Command>,
}

impl MeshApi {
    pub fn new(id: PeerId, commands: mpsc::UnboundedSender<Command>) -> Self {
        Self { id, commands }
    }

    /// This peer's own identifier.
    pub fn id(&self) -> &PeerId {
        &self.id
    }

    /// Send a message to another peer, best-effort.
    ///
    /// Never blocks and never fails from the sender's perspective; delivery
    /// to an inactive destination is a silent no-op.
    pub fn send_message(&self, to: PeerId, payload: Payload) {
        let _ = self.commands.send(Command::SendMessage {
            from: self.id.clone(),
            to,
            payload,
        });
    }

    /// Overwrite this peer's debug status, visible to external observers.
    pub fn set_debug_message(&self, status: impl Into<String>) {
        let _ = self.commands.send(Command::SetDebugMessage {
            id: self.id.clone(),
            status: status.into(),
        });
    }

    /// Move this peer to a new coordinate.
    pub fn set_coordinate(&self, lat: f64, lon: f64) {
        let _ = self.commands.send(Command::SetCoordinate {
            id: self.id.clone(),
            lat,
            lon,
        });
    }

    /// Diagnostic side channel; no semantic effect on mesh state.
    pub fn log(&self, message: &str) {
        tracing::info!(target: "meshsim::peer", peer = %self.id, "{message}");
    }
}
