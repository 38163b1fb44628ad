//! The behavior-program abstraction.

use crate::api::MeshApi;
use crate::error::Result;
use crate::types::{NetTime, Payload, PeerId};

/// A peer's behavior program: four optional capability slots plus startup.
///
/// Default implementations are no-ops — a program that does not handle an
/// event class simply never sees those events, which is not an error. All
/// methods take `&mut self`; the runtime guarantees invocations for one
/// peer never overlap, so implementations can keep plain mutable state.
///
/// A returned error is a handler fault: the runtime logs it, abandons that
/// single invocation, and continues delivering future events.
pub trait Behavior: Send + 'static {
    /// Runs once before any event is delivered, on the peer's own task.
    fn on_start(&mut self, api: &MeshApi) -> Result<()> {
        let _ = api;
        Ok(())
    }

    /// A message arrived from `from`.
    fn on_message(&mut self, api: &MeshApi, from: PeerId, payload: Payload) -> Result<()> {
        let _ = (api, from, payload);
        Ok(())
    }

    /// Neighbor `id` came into range.
    fn on_peer_appeared(&mut self, api: &MeshApi, id: PeerId) -> Result<()> {
        let _ = (api, id);
        Ok(())
    }

    /// Neighbor `id` went out of range.
    fn on_peer_disappeared(&mut self, api: &MeshApi, id: PeerId) -> Result<()> {
        let _ = (api, id);
        Ok(())
    }

    /// The simulation clock ticked.
    fn on_time_tick(&mut self, api: &MeshApi, ts: NetTime) -> Result<()> {
        let _ = (api, ts);
        Ok(())
    }
}
