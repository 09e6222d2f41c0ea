//! The compiled-graph module: port resolution and operation capture
//! (`graph`) plus the executor that walks the result (`execution`).

pub(crate) mod execution;
pub(crate) mod graph;

pub use graph::CompiledGraph;
