//! Script-driven behavior programs.
//!
//! A [`ScriptBehavior`] runs a user-supplied rhai script in its own engine
//! instance — no shared mutable state with any other peer's program. The
//! script's top level executes once at startup and registers handlers by
//! calling host functions; each registration replaces the previous handler
//! for that event class and may happen at any time, including from inside
//! a running handler.
//!
//! Host API visible to scripts:
//!
//! - `my_id()` — this peer's identifier as a string
//! - `send_message(to, payload)` — best-effort send, never blocks
//! - `set_debug_message(status)` — publish the debug status string
//! - `set_coordinate(lat, lon)` — move this peer
//! - `log(...)` — diagnostic output (1 to 3 arguments of any type)
//! - `register_message_handler(|from, payload| ...)`
//! - `register_peer_appeared_handler(|id| ...)`
//! - `register_peer_disappeared_handler(|id| ...)`
//! - `register_time_tick_handler(|ts| ...)`

use std::sync::Arc;

use parking_lot::Mutex;
use rhai::{Dynamic, Engine, FnPtr, AST};

use crate::api::MeshApi;
use crate::behavior::Behavior;
use crate::error::{Result, ScriptError};
use crate::types::{NetTime, Payload, PeerId};

#[derive(Default)]
struct HandlerSlots {
    message: Option<FnPtr>,
    appeared: Option<FnPtr>,
    disappeared: Option<FnPtr>,
    tick: Option<FnPtr>,
}

/// A behavior program compiled from a rhai script.
pub struct ScriptBehavior {
    ast: AST,
    ops_limit: u64,
    engine: Option<Engine>,
    slots: Arc<Mutex<HandlerSlots>>,
}

impl ScriptBehavior {
    /// Parse a script, rejecting syntax errors before any peer state exists.
    ///
    /// `ops_limit` bounds the number of operations any single evaluation
    /// (startup or one handler invocation) may perform; `0` means
    /// unlimited. The limit is what keeps a runaway script from pinning
    /// its task forever.
    pub fn compile(script: &str, ops_limit: u64) -> std::result::Result<Self, ScriptError> {
        if script.trim().is_empty() {
            return Err(ScriptError::Empty);
        }
        let ast = Engine::new().compile(script)?;
        Ok(Self {
            ast,
            ops_limit,
            engine: None,
            slots: Arc::new(Mutex::new(HandlerSlots::default())),
        })
    }

    fn build_engine(&self, api: &MeshApi) -> Engine {
        let mut engine = Engine::new();
        if self.ops_limit > 0 {
            engine.set_max_operations(self.ops_limit);
        }

        {
            let api = api.clone();
            engine.register_fn("my_id", move || api.id().to_string());
        }
        {
            let api = api.clone();
            engine.register_fn("send_message", move |to: &str, payload: &str| {
                api.send_message(PeerId::from(to), payload.to_string());
            });
        }
        {
            let api = api.clone();
            engine.register_fn("set_debug_message", move |status: &str| {
                api.set_debug_message(status);
            });
        }
        {
            let api = api.clone();
            engine.register_fn("set_coordinate", move |lat: f64, lon: f64| {
                api.set_coordinate(lat, lon);
            });
        }
        {
            let api = api.clone();
            engine.register_fn("log", move |a: Dynamic| api.log(&a.to_string()));
        }
        {
            let api = api.clone();
            engine.register_fn("log", move |a: Dynamic, b: Dynamic| {
                api.log(&format!("{a} {b}"));
            });
        }
        {
            let api = api.clone();
            engine.register_fn("log", move |a: Dynamic, b: Dynamic, c: Dynamic| {
                api.log(&format!("{a} {b} {c}"));
            });
        }

        {
            let slots = Arc::clone(&self.slots);
            engine.register_fn("register_message_handler", move |f: FnPtr| {
                slots.lock().message = Some(f);
            });
        }
        {
            let slots = Arc::clone(&self.slots);
            engine.register_fn("register_peer_appeared_handler", move |f: FnPtr| {
                slots.lock().appeared = Some(f);
            });
        }
        {
            let slots = Arc::clone(&self.slots);
            engine.register_fn("register_peer_disappeared_handler", move |f: FnPtr| {
                slots.lock().disappeared = Some(f);
            });
        }
        {
            let slots = Arc::clone(&self.slots);
            engine.register_fn("register_time_tick_handler", move |f: FnPtr| {
                slots.lock().tick = Some(f);
            });
        }

        engine
    }

    fn invoke(&self, handler: FnPtr, args: impl rhai::FuncArgs) -> Result<()> {
        // `engine` is set in on_start before any event can arrive.
        let Some(engine) = self.engine.as_ref() else {
            return Ok(());
        };
        let _: Dynamic = handler.call(engine, &self.ast, args)?;
        Ok(())
    }

    fn slot<F>(&self, pick: F) -> Option<FnPtr>
    where
        F: FnOnce(&HandlerSlots) -> &Option<FnPtr>,
    {
        pick(&self.slots.lock()).clone()
    }
}

impl Behavior for ScriptBehavior {
    fn on_start(&mut self, api: &MeshApi) -> Result<()> {
        let engine = self.build_engine(api);
        let outcome = engine.run_ast(&self.ast);
        self.engine = Some(engine);
        outcome?;
        Ok(())
    }

    fn on_message(&mut self, _api: &MeshApi, from: PeerId, payload: Payload) -> Result<()> {
        match self.slot(|s| &s.message) {
            Some(handler) => self.invoke(handler, (from.to_string(), payload)),
            None => Ok(()),
        }
    }

    fn on_peer_appeared(&mut self, _api: &MeshApi, id: PeerId) -> Result<()> {
        match self.slot(|s| &s.appeared) {
            Some(handler) => self.invoke(handler, (id.to_string(),)),
            None => Ok(()),
        }
    }

    fn on_peer_disappeared(&mut self, _api: &MeshApi, id: PeerId) -> Result<()> {
        match self.slot(|s| &s.disappeared) {
            Some(handler) => self.invoke(handler, (id.to_string(),)),
            None => Ok(()),
        }
    }

    fn on_time_tick(&mut self, _api: &MeshApi, ts: NetTime) -> Result<()> {
        match self.slot(|s| &s.tick) {
            Some(handler) => self.invoke(handler, (ts.as_millis(),)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Command;
    use tokio::sync::mpsc;

    fn started(script: &str) -> (ScriptBehavior, MeshApi, mpsc::UnboundedReceiver<Command>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let api = MeshApi::new(PeerId::from("self-id"), tx);
        let mut b = ScriptBehavior::compile(script, 100_000).expect("script should parse");
        b.on_start(&api).expect("startup should succeed");
        (b, api, rx)
    }

    #[test]
    fn syntax_error_is_rejected_at_compile() {
        assert!(ScriptBehavior::compile("let x = ;", 0).is_err());
        assert!(ScriptBehavior::compile("fn broken(", 0).is_err());
    }

    #[test]
    fn empty_script_is_rejected() {
        assert!(matches!(
            ScriptBehavior::compile("", 0),
            Err(ScriptError::Empty)
        ));
        assert!(matches!(
            ScriptBehavior::compile("   \n\t", 0),
            Err(ScriptError::Empty)
        ));
    }

    #[test]
    fn inert_script_compiles_and_handles_nothing() {
        let (mut b, api, mut rx) = started("let unused = 0;");
        b.on_message(&api, PeerId::from("x"), "hi".to_string())
            .expect("unhandled message is not an error");
        b.on_time_tick(&api, NetTime::from_millis(1)).expect("unhandled tick");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn message_handler_sees_sender_and_payload() {
        let script = r#"
            register_message_handler(|from, data| {
                set_debug_message(`${from}:${data}`);
            });
        "#;
        let (mut b, api, mut rx) = started(script);
        b.on_message(&api, PeerId::from("p1"), "hello".to_string()).unwrap();
        match rx.try_recv().unwrap() {
            Command::SetDebugMessage { id, status } => {
                assert_eq!(id, PeerId::from("self-id"));
                assert_eq!(status, "p1:hello");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn startup_can_query_identity_and_send() {
        let script = r#"
            let me = my_id();
            send_message("target", `hi from ${me}`);
        "#;
        let (_b, _api, mut rx) = started(script);
        match rx.try_recv().unwrap() {
            Command::SendMessage { from, to, payload } => {
                assert_eq!(from, PeerId::from("self-id"));
                assert_eq!(to, PeerId::from("target"));
                assert_eq!(payload, "hi from self-id");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn reregistration_replaces_previous_handler() {
        let script = r#"
            register_time_tick_handler(|ts| set_debug_message("first"));
            register_time_tick_handler(|ts| set_debug_message("second"));
        "#;
        let (mut b, api, mut rx) = started(script);
        b.on_time_tick(&api, NetTime::from_millis(5)).unwrap();
        match rx.try_recv().unwrap() {
            Command::SetDebugMessage { status, .. } => assert_eq!(status, "second"),
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(rx.try_recv().is_err(), "only the replacement handler runs");
    }

    #[test]
    fn handler_can_reregister_itself() {
        let script = r#"
            register_time_tick_handler(|ts| {
                set_debug_message("armed");
                register_time_tick_handler(|ts| set_debug_message("rearmed"));
            });
        "#;
        let (mut b, api, mut rx) = started(script);
        b.on_time_tick(&api, NetTime::from_millis(1)).unwrap();
        b.on_time_tick(&api, NetTime::from_millis(2)).unwrap();
        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        match (first, second) {
            (
                Command::SetDebugMessage { status: a, .. },
                Command::SetDebugMessage { status: b, .. },
            ) => {
                assert_eq!(a, "armed");
                assert_eq!(b, "rearmed");
            }
            other => panic!("unexpected commands: {other:?}"),
        }
    }

    #[test]
    fn handler_fault_is_an_error_but_not_fatal() {
        let script = r#"
            register_message_handler(|from, data| {
                this_function_does_not_exist();
            });
            register_time_tick_handler(|ts| set_debug_message("alive"));
        "#;
        let (mut b, api, mut rx) = started(script);
        assert!(b.on_message(&api, PeerId::from("x"), "hi".to_string()).is_err());
        // The peer remains usable after the fault.
        b.on_time_tick(&api, NetTime::from_millis(1)).unwrap();
        match rx.try_recv().unwrap() {
            Command::SetDebugMessage { status, .. } => assert_eq!(status, "alive"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn script_state_persists_across_invocations() {
        let script = r#"
            let count = 0;
            register_message_handler(|from, data| {
                count += 1;
                set_debug_message(`${count}`);
            });
        "#;
        let (mut b, api, mut rx) = started(script);
        for _ in 0..3 {
            b.on_message(&api, PeerId::from("x"), "m".to_string()).unwrap();
        }
        let mut last = String::new();
        while let Ok(Command::SetDebugMessage { status, .. }) = rx.try_recv() {
            last = status;
        }
        assert_eq!(last, "3");
    }

    #[test]
    fn runaway_startup_hits_operation_limit() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let api = MeshApi::new(PeerId::from("self-id"), tx);
        let mut b =
            ScriptBehavior::compile("let n = 0; while true { n += 1; }", 10_000).unwrap();
        assert!(b.on_start(&api).is_err());
    }

    #[test]
    fn sends_preserve_order() {
        let script = r#"
            register_time_tick_handler(|ts| {
                send_message("t", "one");
                send_message("t", "two");
                send_message("t", "three");
            });
        "#;
        let (mut b, api, mut rx) = started(script);
        b.on_time_tick(&api, NetTime::from_millis(1)).unwrap();
        let mut payloads = Vec::new();
        while let Ok(Command::SendMessage { payload, .. }) = rx.try_recv() {
            payloads.push(payload);
        }
        assert_eq!(payloads, vec!["one", "two", "three"]);
    }
}
