//! The graph builder — an insertion-ordered collection of node definitions.
//!
//! A [`Graph`] is mutated only by appending nodes; existing nodes are never
//! edited in place. Every successful append bumps `revision`, which is how
//! a cached [`CompiledGraph`] notices it has gone stale (§4.4).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::compiled::CompiledGraph;
use crate::error::{EngineError, Result};
use crate::json;
use crate::node::{Node, NodeKind};
use crate::port::PortRef;
use crate::registry::{default_registry, OperationRegistry};

/// A placeholder-id → value binding supplied at evaluation time.
pub type Feed = HashMap<String, String>;

/// A handle to a node just added to a [`Graph`]. Also doubles as the
/// "multi-output node" surface described in the engine's design notes:
/// indexing a specific output never needs a distinct wrapper type, since
/// every node id can address any of its outputs via [`NodeRef::output`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRef {
    id: String,
}

impl NodeRef {
    fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// This node's id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Output 0 of this node, as a [`PortRef`].
    pub fn port(&self) -> PortRef {
        PortRef::new(self.id.clone())
    }

    /// Output `k` of this node, as a [`PortRef`].
    pub fn output(&self, k: usize) -> PortRef {
        PortRef::with_index(self.id.clone(), k)
    }
}

impl From<&NodeRef> for PortRef {
    fn from(node: &NodeRef) -> Self {
        node.port()
    }
}

impl From<NodeRef> for PortRef {
    fn from(node: NodeRef) -> Self {
        PortRef::new(node.id)
    }
}

/// An insertion-ordered collection of [`Node`]s plus an id → index lookup.
pub struct Graph {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    revision: u64,
    next_auto_id: usize,
    default_target: Option<PortRef>,
    optimized_cache: Mutex<Option<(u64, Arc<CompiledGraph>)>>,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("nodes", &self.nodes)
            .field("revision", &self.revision)
            .field("default_target", &self.default_target)
            .finish_non_exhaustive()
    }
}

impl Graph {
    /// An empty graph.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            revision: 0,
            next_auto_id: 0,
            default_target: None,
            optimized_cache: Mutex::new(None),
        }
    }

    fn auto_id(&mut self) -> String {
        let id = format!("node_{}", self.next_auto_id);
        self.next_auto_id += 1;
        id
    }

    /// The graph's current revision, bumped on every successful append.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Append `node`, failing with [`EngineError::DuplicateNode`] if its id
    /// is already present. Invalidates any `run_optimized` cache.
    pub fn add_node(&mut self, node: Node) -> Result<NodeRef> {
        if self.index.contains_key(&node.id) {
            return Err(EngineError::DuplicateNode(node.id));
        }
        let id = node.id.clone();
        self.index.insert(id.clone(), self.nodes.len());
        self.nodes.push(node);
        self.revision += 1;
        Ok(NodeRef::new(id))
    }

    /// The index of the node with id `id`, if present.
    pub fn node_by_id(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// All nodes, in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The default evaluation target recorded by [`Graph::from_json`], if
    /// the document carried a top-level `target_node`.
    pub fn default_target(&self) -> Option<&PortRef> {
        self.default_target.as_ref()
    }

    /// Declare a constant node with an auto-generated id.
    pub fn constant(&mut self, value: impl Into<String>) -> Result<NodeRef> {
        let id = self.auto_id();
        self.constant_with_id(id, value)
    }

    /// Declare a constant node with an explicit id.
    pub fn constant_with_id(&mut self, id: impl Into<String>, value: impl Into<String>) -> Result<NodeRef> {
        self.add_node(Node { id: id.into(), kind: NodeKind::Constant { value: value.into() } })
    }

    /// Declare a placeholder node with an auto-generated id.
    pub fn placeholder(&mut self) -> Result<NodeRef> {
        let id = self.auto_id();
        self.placeholder_with_id(id)
    }

    /// Declare a placeholder node with an explicit id.
    pub fn placeholder_with_id(&mut self, id: impl Into<String>) -> Result<NodeRef> {
        self.add_node(Node { id: id.into(), kind: NodeKind::Placeholder })
    }

    /// Declare a variable node with an auto-generated id.
    pub fn variable(&mut self, value: impl Into<String>) -> Result<NodeRef> {
        let id = self.auto_id();
        self.variable_with_id(id, value)
    }

    /// Declare a variable node with an explicit id.
    pub fn variable_with_id(&mut self, id: impl Into<String>, value: impl Into<String>) -> Result<NodeRef> {
        self.add_node(Node { id: id.into(), kind: NodeKind::Variable { value: value.into() } })
    }

    /// Declare an operation node with an auto-generated id.
    pub fn op(
        &mut self,
        name: impl Into<String>,
        inputs: Vec<PortRef>,
        constants: Vec<String>,
    ) -> Result<NodeRef> {
        let id = self.auto_id();
        self.op_with_id(id, name, inputs, constants)
    }

    /// Declare an operation node with an explicit id. Operation existence
    /// and arity are not checked here — resolution happens at compile time
    /// (§4.3), so a graph under construction may temporarily reference
    /// operations or nodes added later, as long as they exist by the time
    /// it is compiled.
    pub fn op_with_id(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        inputs: Vec<PortRef>,
        constants: Vec<String>,
    ) -> Result<NodeRef> {
        self.add_node(Node {
            id: id.into(),
            kind: NodeKind::Operation { op_name: name.into(), inputs, constants },
        })
    }

    /// Serialise to the JSON interchange schema (§4.2), in insertion order.
    pub fn to_json(&self) -> Result<String> {
        json::to_json(self)
    }

    /// Parse the JSON interchange schema (§4.2) into a fresh `Graph`.
    pub fn from_json(text: &str) -> Result<Self> {
        json::from_json(text)
    }

    /// Compile against the process-wide operation registry. Always
    /// recompiles; the returned handle is owned by the caller and is not
    /// cached on the `Graph` itself (the façade's own `run_optimized`
    /// cache is separate — see [`Graph::run_optimized`]).
    pub fn compile(&self) -> Arc<CompiledGraph> {
        self.compile_with_registry(default_registry())
    }

    /// Compile against an explicit registry, bypassing the process-wide
    /// default — mainly useful for tests that want an isolated set of
    /// operations.
    pub fn compile_with_registry(&self, registry: &OperationRegistry) -> Arc<CompiledGraph> {
        Arc::new(CompiledGraph::compile(self, registry))
    }

    /// Evaluate `target`. Reuses a previously-cached `run_optimized`
    /// compile if one is still current for this revision; otherwise
    /// serialises through JSON and executes a throwaway compile without
    /// caching it (§4.5 strategies).
    pub fn run(&self, target: impl Into<PortRef>, feed: &Feed) -> Result<String> {
        let target = target.into();
        if let Some(compiled) = self.cached_if_current() {
            return compiled.run(target, feed);
        }
        tracing::debug!(revision = self.revision, "no current cache; falling back to JSON round-trip");
        let json = self.to_json()?;
        let reparsed = Graph::from_json(&json)?;
        let compiled = reparsed.compile_with_registry(default_registry());
        compiled.run(target, feed)
    }

    /// Evaluate `target` using [`Graph::default_target`].
    pub fn run_default(&self, feed: &Feed) -> Result<String> {
        let target = self
            .default_target
            .clone()
            .ok_or_else(|| EngineError::Schema("no default target_node set on this graph".into()))?;
        self.run(target, feed)
    }

    /// Evaluate `target`, building and caching a `CompiledGraph` on first
    /// use (or after the cache has gone stale) and reusing it thereafter.
    pub fn run_optimized(&self, target: impl Into<PortRef>, feed: &Feed) -> Result<String> {
        let target = target.into();
        let compiled = self.cached_or_recompile();
        compiled.run(target, feed)
    }

    fn cached_if_current(&self) -> Option<Arc<CompiledGraph>> {
        let guard = self.optimized_cache.lock().expect("optimized cache mutex poisoned");
        match guard.as_ref() {
            Some((rev, compiled)) if *rev == self.revision => Some(compiled.clone()),
            _ => None,
        }
    }

    fn cached_or_recompile(&self) -> Arc<CompiledGraph> {
        if let Some(compiled) = self.cached_if_current() {
            return compiled;
        }
        let compiled = self.compile();
        *self.optimized_cache.lock().expect("optimized cache mutex poisoned") =
            Some((self.revision, compiled.clone()));
        compiled
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn set_default_target(graph: &mut Graph, target: Option<PortRef>) {
    graph.default_target = target;
}
