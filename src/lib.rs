//! `stringflow` — an embeddable string dataflow engine.
//!
//! Callers describe a computation over strings as a directed acyclic graph
//! of typed nodes ([`Graph`]), then ask for the value at any node's output
//! port. The engine resolves dependencies, runs built-in and
//! user-registered operations (including operations with several named
//! outputs), and can compile a graph into a reusable [`CompiledGraph`] so
//! repeated evaluations skip re-resolution.
//!
//! ```
//! use stringflow::Graph;
//!
//! let mut graph = Graph::new();
//! let greeting = graph.constant_with_id("x", "hello").unwrap();
//! let upper = graph.op_with_id("u", "to_upper", vec![greeting.into()], vec![]).unwrap();
//! graph.op_with_id("r", "reverse", vec![upper.into()], vec![]).unwrap();
//!
//! let result = graph.run("r", &Default::default()).unwrap();
//! assert_eq!(result, "OLLEH");
//! ```
//!
//! # Values are strings only
//!
//! This is not a general scalar/tensor compute engine — every node produces
//! one or more `String` values and nothing else. It does not persist
//! graphs across process lifetimes and does not parallelize operation
//! execution within a single evaluation; see [`registry`] for the
//! concurrency discipline that does apply, to the process-wide operation
//! table.

pub mod builtins;
mod compiled;
pub mod error;
pub mod graph;
mod json;
pub mod node;
pub mod port;
pub mod registry;

pub use compiled::CompiledGraph;
pub use error::{EngineError, Result};
pub use graph::{Feed, Graph, NodeRef};
pub use node::{Node, NodeKind};
pub use port::PortRef;
pub use registry::{
    default_registry, has_operation, list_operations, register_operation, OpError, OperationEntry,
    OperationExecutor, OperationKind, OperationRegistry, OutputArity,
};
