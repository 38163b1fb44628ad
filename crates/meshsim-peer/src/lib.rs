//! Meshsim Peer Runtime
//!
//! Hosts one behavior program per simulated peer and dispatches mesh events
//! into it.
//!
//! # Contract
//!
//! A behavior program reacts to four event classes: message delivery,
//! neighbor appearance, neighbor disappearance, and time ticks. It interacts
//! with the mesh only through [`MeshApi`]: sending messages, publishing a
//! debug status string, moving itself, and diagnostic logging. All of these
//! are non-blocking; effects travel as [`Command`]s over a channel to the
//! event router.
//!
//! Each peer's events are dispatched by its own task ([`PeerRuntime`]),
//! strictly one handler invocation at a time, so a program never observes
//! interleaved mutations of its own state. Handler errors are contained:
//! logged, the invocation abandoned, the peer kept alive.
//!
//! Programs come in two forms: native [`Behavior`] implementations (used by
//! tests and embedders) and [`ScriptBehavior`], which runs a user-supplied
//! rhai script. A script registers handlers imperatively:
//!
//! ```rhai
//! let seen = 0;
//! register_message_handler(|from, data| {
//!     seen += 1;
//!     set_debug_message(`${seen} messages, last from ${from}`);
//! });
//! register_time_tick_handler(|ts| log("tick", ts));
//! ```

mod api;
mod behavior;
mod error;
mod event;
mod runtime;
mod script;
mod types;

pub use api::MeshApi;
pub use behavior::Behavior;
pub use error::{BehaviorError, Result, ScriptError};
pub use event::{Command, PeerEvent};
pub use runtime::PeerRuntime;
pub use script::ScriptBehavior;
pub use types::{Metadata, NetTime, Payload, PeerId};
