//! Per-peer event dispatch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::api::MeshApi;
use crate::behavior::Behavior;
use crate::event::PeerEvent;

/// The execution unit hosting one behavior program.
///
/// One tokio task per peer drains a FIFO mailbox, invoking exactly one
/// handler at a time; handlers for different peers run on different tasks
/// and may overlap freely. The `alive` flag is the deletion gate: once
/// cleared, every remaining and future mailbox entry is drained without
/// delivery, and the task exits as soon as the mailbox closes.
pub struct PeerRuntime;

impl PeerRuntime {
    /// Spawn the dispatch task for one peer.
    ///
    /// Runs the behavior's startup phase first, then the event loop. A
    /// handler fault (including a startup fault) is logged and contained;
    /// the peer stays alive for future events.
    pub fn spawn(
        api: MeshApi,
        mut behavior: Box<dyn Behavior>,
        mut events: mpsc::UnboundedReceiver<PeerEvent>,
        alive: Arc<AtomicBool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let peer = api.id().clone();

            if alive.load(Ordering::Acquire) {
                if let Err(e) = behavior.on_start(&api) {
                    tracing::warn!(peer = %peer, error = %e, "behavior startup fault");
                }
            }

            while let Some(event) = events.recv().await {
                if !alive.load(Ordering::Acquire) {
                    // Deleted mid-flight: drain without delivering.
                    continue;
                }
                let outcome = match event {
                    PeerEvent::Message { from, payload } => {
                        behavior.on_message(&api, from, payload)
                    }
                    PeerEvent::PeerAppeared { id } => behavior.on_peer_appeared(&api, id),
                    PeerEvent::PeerDisappeared { id } => behavior.on_peer_disappeared(&api, id),
                    PeerEvent::TimeTick { ts } => behavior.on_time_tick(&api, ts),
                };
                if let Err(e) = outcome {
                    tracing::warn!(peer = %peer, error = %e, "handler fault");
                }
            }

            tracing::debug!(peer = %peer, "peer runtime stopped");
        })
    }
}
