//! The event router: tick cycles, topology transitions, message delivery.
//!
//! One task owns the whole dispatch pipeline. Per tick cycle it advances the
//! simulation clock, asks the reachability oracle for the current edge set,
//! diffs it against the previous cycle's snapshot, and emits
//! appeared/disappeared transitions to both live endpoints followed by the
//! cycle's tick. Peer commands (message sends, debug/coordinate updates)
//! arrive over a channel and are applied immediately in receipt order.
//!
//! Because this is the only task that forwards into the per-peer FIFO
//! mailboxes, every ordering contract reduces to channel FIFO: transitions
//! for one neighbor reflect true topology order, ticks are strictly
//! increasing, and messages from one sender arrive in send order. Peer
//! handlers run elsewhere and can never block this task.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;

use meshsim_peer::{Command, NetTime, Payload, PeerEvent, PeerId};
use meshsim_topology::{diff_sets, GeoCoord, ReachabilityOracle};

use crate::error::{Error, Result};
use crate::registry::Registry;

/// The simulation clock. Advances one tick interval per cycle, so
/// timestamps are strictly increasing and a value is never repeated.
pub(crate) struct SimClock {
    now_ms: i64,
    step_ms: i64,
}

impl SimClock {
    pub(crate) fn new(step: Duration) -> Self {
        Self {
            now_ms: 0,
            step_ms: (step.as_millis() as i64).max(1),
        }
    }

    pub(crate) fn advance(&mut self) -> NetTime {
        self.now_ms += self.step_ms;
        NetTime::from_millis(self.now_ms)
    }
}

/// Control-plane requests handled by the router.
pub(crate) enum ControlMsg {
    /// Inject a message on behalf of an existing peer. Empty `targets`
    /// broadcasts to the peer's current neighbors.
    Inject {
        from: PeerId,
        targets: Vec<PeerId>,
        payload: Payload,
        reply: oneshot::Sender<Result<()>>,
    },
}

pub(crate) struct EventRouter {
    registry: Arc<Registry>,
    oracle: Box<dyn ReachabilityOracle>,
    commands: mpsc::UnboundedReceiver<Command>,
    control: mpsc::UnboundedReceiver<ControlMsg>,
    tick_interval: Duration,
    clock: SimClock,
    /// Previous cycle's neighbor sets, diffed to derive transitions.
    neighbors: HashMap<PeerId, HashSet<PeerId>>,
}

impl EventRouter {
    pub(crate) fn new(
        registry: Arc<Registry>,
        oracle: Box<dyn ReachabilityOracle>,
        commands: mpsc::UnboundedReceiver<Command>,
        control: mpsc::UnboundedReceiver<ControlMsg>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            registry,
            oracle,
            commands,
            control,
            tick_interval,
            clock: SimClock::new(tick_interval),
            neighbors: HashMap::new(),
        }
    }

    /// Drive the router until its channels close.
    pub(crate) async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => self.apply(cmd),
                    None => break,
                },
                msg = self.control.recv() => match msg {
                    Some(msg) => self.handle_control(msg),
                    None => break,
                },
                _ = ticker.tick() => self.cycle(),
            }
        }
        tracing::debug!("event router stopped");
    }

    /// Apply one peer-originated command.
    fn apply(&mut self, cmd: Command) {
        match cmd {
            Command::SendMessage { from, to, payload } => {
                // Inactive destination: silent drop, per best-effort
                // delivery semantics.
                if let Some(mailbox) = self.registry.mailbox(&to) {
                    let _ = mailbox.send(PeerEvent::Message { from, payload });
                }
            }
            Command::SetDebugMessage { id, status } => {
                self.registry.set_debug_message(&id, status);
            }
            Command::SetCoordinate { id, lat, lon } => match GeoCoord::checked(lat, lon) {
                Ok(coord) => {
                    self.registry.set_coordinate(&id, coord);
                }
                Err(e) => {
                    tracing::warn!(peer = %id, error = %e, "coordinate update rejected");
                }
            },
        }
    }

    fn handle_control(&mut self, msg: ControlMsg) {
        match msg {
            ControlMsg::Inject {
                from,
                targets,
                payload,
                reply,
            } => {
                let _ = reply.send(self.inject(from, targets, payload));
            }
        }
    }

    /// Deliver an externally injected message from `from` to `targets`,
    /// or to all of `from`'s current neighbors when `targets` is empty.
    fn inject(&mut self, from: PeerId, targets: Vec<PeerId>, payload: Payload) -> Result<()> {
        if self.registry.lookup(&from).is_none() {
            return Err(Error::NotFound(from));
        }
        let targets = if targets.is_empty() {
            let mut neighbors: Vec<PeerId> = self
                .neighbors
                .get(&from)
                .map(|set| set.iter().cloned().collect())
                .unwrap_or_default();
            neighbors.sort();
            neighbors
        } else {
            targets
        };
        for to in targets {
            if let Some(mailbox) = self.registry.mailbox(&to) {
                let _ = mailbox.send(PeerEvent::Message {
                    from: from.clone(),
                    payload: payload.clone(),
                });
            }
        }
        Ok(())
    }

    /// One tick cycle: recompute reachability, emit transitions, then tick.
    fn cycle(&mut self) {
        let ts = self.clock.advance();
        let snapshot = self.registry.active_snapshot();

        let coords: Vec<GeoCoord> = snapshot.iter().map(|p| p.coord).collect();
        let edges = self.oracle.edges(&coords);

        let mut current: HashMap<PeerId, HashSet<PeerId>> = snapshot
            .iter()
            .map(|p| (p.id.clone(), HashSet::new()))
            .collect();
        for (i, j) in edges {
            let a = snapshot[i].id.clone();
            let b = snapshot[j].id.clone();
            if let Some(set) = current.get_mut(&a) {
                set.insert(b.clone());
            }
            if let Some(set) = current.get_mut(&b) {
                set.insert(a);
            }
        }

        // Peers present only in the previous snapshot were deleted; their
        // sets drop here, and their absence from `current` is what makes
        // them disappear for everyone else.
        let mut previous = std::mem::take(&mut self.neighbors);
        for peer in &snapshot {
            let old = previous.remove(&peer.id).unwrap_or_default();
            let Some(new) = current.get(&peer.id) else {
                continue;
            };

            let (mut appeared, mut disappeared) = diff_sets(&old, new);
            appeared.sort();
            disappeared.sort();
            for id in appeared {
                let _ = peer.mailbox.send(PeerEvent::PeerAppeared { id });
            }
            for id in disappeared {
                let _ = peer.mailbox.send(PeerEvent::PeerDisappeared { id });
            }

            let mut neighbors: Vec<PeerId> = new.iter().cloned().collect();
            neighbors.sort();
            self.registry.set_neighbors(&peer.id, neighbors);
        }
        self.neighbors = current;

        for peer in &snapshot {
            let _ = peer.mailbox.send(PeerEvent::TimeTick { ts });
        }
    }
}
