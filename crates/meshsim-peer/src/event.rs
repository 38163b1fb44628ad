//! Events delivered to peers and commands emitted by them.

use crate::types::{NetTime, Payload, PeerId};

/// An event delivered to a peer's behavior program.
///
/// Events for one peer are dispatched strictly in order, one handler
/// invocation at a time.
#[derive(Debug, Clone)]
pub enum PeerEvent {
    /// A message from another peer.
    Message { from: PeerId, payload: Payload },
    /// A neighbor came into range.
    PeerAppeared { id: PeerId },
    /// A neighbor went out of range.
    PeerDisappeared { id: PeerId },
    /// The periodic simulation clock tick.
    TimeTick { ts: NetTime },
}

/// A peer-originated effect.
///
/// All effects flow over one channel into the event router, which applies
/// them in receipt order. Sending is non-blocking; the emitting peer never
/// waits for a recipient's handler.
#[derive(Debug, Clone)]
pub enum Command {
    /// Deliver `payload` to `to`, best-effort. Dropped silently if the
    /// destination is not active at delivery time.
    SendMessage {
        from: PeerId,
        to: PeerId,
        payload: Payload,
    },
    /// Overwrite the peer's externally visible debug status.
    SetDebugMessage { id: PeerId, status: String },
    /// Move the peer. Rejected (and logged) if the pair is not finite.
    SetCoordinate { id: PeerId, lat: f64, lon: f64 },
}
