//! Error types for graph construction, compilation, and execution.
//!
//! All errors implement `std::error::Error` via `thiserror`. The variants
//! mirror the flat error-kind list of the engine's design: every error
//! carries a human-readable message and, where applicable, the offending
//! node id or port.

use thiserror::Error;

/// Convenience result type using [`EngineError`].
pub type Result<T> = std::result::Result<T, EngineError>;

/// All errors that can occur while building, compiling, or evaluating a
/// graph.
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    /// Malformed JSON or a node missing required fields.
    #[error("schema error: {0}")]
    Schema(String),

    /// A node id collided with one already present in the graph.
    #[error("duplicate node id '{0}'")]
    DuplicateNode(String),

    /// A port reference names a node id that does not exist in the graph.
    #[error("unknown node '{0}'")]
    UnknownNode(String),

    /// An operation node names an operation absent from the registry.
    #[error("unknown operation '{0}'")]
    UnknownOperation(String),

    /// An output index was out of range, or an input read past the end of
    /// a producer's actual output vector.
    #[error("bad port '{port}': {reason}")]
    BadPort {
        /// The offending port, formatted as `"id"` or `"id:k"`.
        port: String,
        /// Why the port reference is invalid.
        reason: String,
    },

    /// The reachable subgraph from an evaluation target contains a cycle.
    #[error("cycle detected at node '{0}'")]
    CycleDetected(String),

    /// A placeholder reached during evaluation had no entry in the feed.
    #[error("missing feed value for placeholder '{0}'")]
    MissingFeed(String),

    /// An operation's constants were malformed (non-numeric where a number
    /// is required, a negative count, a fill string longer than one
    /// character, etc).
    #[error("invalid argument for operation '{op}': {reason}")]
    InvalidArgument {
        /// Name of the operation that rejected its constants.
        op: String,
        /// Description of what was wrong.
        reason: String,
    },

    /// A foreign-callback operation's executor returned an error.
    #[error("operation '{op}' failed: {reason}")]
    OperationFailure {
        /// Name of the operation that failed.
        op: String,
        /// The error message the callback raised.
        reason: String,
    },

    /// `register` was called with `replace = false` for a name already in
    /// the registry.
    #[error("operation '{0}' is already registered")]
    DuplicateOperation(String),
}

impl EngineError {
    /// Build a [`EngineError::BadPort`] for a port given as `"id"` / `"id:k"`.
    pub fn bad_port(port: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BadPort { port: port.into(), reason: reason.into() }
    }

    /// Build a [`EngineError::InvalidArgument`].
    pub fn invalid_argument(op: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument { op: op.into(), reason: reason.into() }
    }

    /// Build a [`EngineError::OperationFailure`].
    pub fn operation_failure(op: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::OperationFailure { op: op.into(), reason: reason.into() }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        Self::Schema(e.to_string())
    }
}
