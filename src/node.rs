//! Node definitions — the tagged variant at the heart of the graph model.
//!
//! Rather than an inheritance hierarchy of node "classes", a [`Node`] is a
//! single struct carrying an `id` and a [`NodeKind`] tag; the executor
//! dispatches on the tag (see `compiled::execution`).

use crate::port::PortRef;

/// The four node kinds a graph can contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A fixed value supplied at definition time.
    Constant {
        /// The node's value.
        value: String,
    },
    /// A runtime input bound via the evaluation feed.
    Placeholder,
    /// Equivalent to `Constant` until a mutation operation is introduced
    /// (see the engine's open-question log) — no built-in or user op
    /// mutates a variable's stored value.
    Variable {
        /// The node's initial (and, today, only) value.
        value: String,
    },
    /// A computed node: an operation applied to resolved input ports and
    /// literal constants.
    Operation {
        /// Name of the operation in the registry.
        op_name: String,
        /// Ordered input port references, as written in the graph (not yet
        /// resolved to indices — that happens at compile time).
        inputs: Vec<PortRef>,
        /// Ordered literal string parameters passed to the operation
        /// alongside its resolved inputs.
        constants: Vec<String>,
    },
}

/// A single vertex in a [`crate::graph::Graph`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Unique (within its graph) node identifier.
    pub id: String,
    /// What kind of node this is and the data it carries.
    pub kind: NodeKind,
}

impl Node {
    /// A short discriminator string for diagnostics (`"constant"`,
    /// `"placeholder"`, `"variable"`, `"operation"`).
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::Constant { .. } => "constant",
            NodeKind::Placeholder => "placeholder",
            NodeKind::Variable { .. } => "variable",
            NodeKind::Operation { .. } => "operation",
        }
    }
}
