//! Error types for the peer runtime.

use thiserror::Error;

/// Result type for behavior handler invocations.
pub type Result<T> = std::result::Result<T, BehaviorError>;

/// A behavior script was rejected at load time.
///
/// Surfaced synchronously to the creating client; a peer with an invalid
/// script is never instantiated.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The script body is empty.
    #[error("script is empty")]
    Empty,

    /// The script failed to parse.
    #[error("parse error: {0}")]
    Parse(#[from] rhai::ParseError),
}

/// A fault inside a single behavior handler invocation.
///
/// Never surfaced to the control plane: the runtime logs it, abandons the
/// invocation, and keeps the peer alive for future events.
#[derive(Debug, Error)]
pub enum BehaviorError {
    /// Script evaluation failed (runtime error or operation limit).
    #[error("script evaluation failed: {0}")]
    Eval(#[from] Box<rhai::EvalAltResult>),

    /// A native behavior reported a fault.
    #[error("{0}")]
    Other(String),
}

impl BehaviorError {
    /// Construct a fault from a plain message.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}
