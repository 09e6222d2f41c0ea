//! The compiler (§4.3) and the `CompiledGraph` it produces (§3, §4.4).
//!
//! Compiling resolves every textual [`PortRef`] to a `(node_index,
//! output_index)` pair and captures a shared reference to each operation
//! node's registry entry, so that later registry mutation or `Graph`
//! mutation never reaches back into an already-compiled graph. Topological
//! ordering and cycle detection are deferred to first evaluation per
//! target (§4.5) and memoised from then on.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{EngineError, Result};
use crate::graph::Graph;
use crate::node::NodeKind;
use crate::port::PortRef;
use crate::registry::{OperationEntry, OperationRegistry, OutputArity};

/// A node after port resolution and operation lookup.
#[derive(Debug)]
pub(crate) enum CompiledNodeKind {
    Constant { value: String },
    Placeholder,
    Variable { value: String },
    Operation {
        entry: Arc<OperationEntry>,
        inputs: Vec<(usize, usize)>,
        constants: Vec<String>,
    },
}

#[derive(Debug)]
pub(crate) struct CompiledNode {
    pub(crate) id: String,
    pub(crate) kind: CompiledNodeKind,
}

/// An immutable, resolved snapshot of a [`Graph`], ready for repeated
/// evaluation (§3).
pub struct CompiledGraph {
    pub(crate) nodes: Vec<CompiledNode>,
    pub(crate) index: HashMap<String, usize>,
    revision: u64,
    valid: bool,
    error: Option<EngineError>,
    topo_cache: Mutex<HashMap<usize, Arc<Vec<usize>>>>,
}

impl std::fmt::Debug for CompiledGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledGraph")
            .field("revision", &self.revision)
            .field("valid", &self.valid)
            .field("node_count", &self.nodes.len())
            .finish_non_exhaustive()
    }
}

impl CompiledGraph {
    /// Whether compilation succeeded (§4.3). A `false` result means every
    /// `run`/`run_auto` call on this handle returns the same retained
    /// error.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Build a `CompiledGraph` from `graph` against `registry` (§4.3
    /// steps 1-4). Cycle detection is deferred to evaluation (step 5).
    pub fn compile(graph: &Graph, registry: &OperationRegistry) -> Self {
        match compile_inner(graph, registry) {
            Ok(nodes) => {
                let index = graph
                    .nodes()
                    .iter()
                    .enumerate()
                    .map(|(i, n)| (n.id.clone(), i))
                    .collect();
                tracing::debug!(revision = graph.revision(), nodes = nodes.len(), "compiled graph");
                Self {
                    nodes,
                    index,
                    revision: graph.revision(),
                    valid: true,
                    error: None,
                    topo_cache: Mutex::new(HashMap::new()),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "compilation failed");
                Self {
                    nodes: Vec::new(),
                    index: HashMap::new(),
                    revision: graph.revision(),
                    valid: false,
                    error: Some(e),
                    topo_cache: Mutex::new(HashMap::new()),
                }
            }
        }
    }

    pub(crate) fn first_error(&self) -> Option<&EngineError> {
        self.error.as_ref()
    }

    pub(crate) fn stamped_revision(&self) -> u64 {
        self.revision
    }

    /// Resolve `target` to a node index, failing with `UnknownNode`.
    pub(crate) fn resolve(&self, target: &PortRef) -> Result<usize> {
        self.index
            .get(&target.node_id)
            .copied()
            .ok_or_else(|| EngineError::UnknownNode(target.node_id.clone()))
    }

    /// The reverse-postorder of nodes transitively reachable from
    /// `target_index`, built and memoised on first request (§4.5 step 2).
    pub(crate) fn reverse_postorder(&self, target_index: usize) -> Result<Arc<Vec<usize>>> {
        if let Some(cached) = self.topo_cache.lock().expect("topo cache mutex poisoned").get(&target_index) {
            return Ok(cached.clone());
        }
        let order = Arc::new(self.build_reverse_postorder(target_index)?);
        self.topo_cache
            .lock()
            .expect("topo cache mutex poisoned")
            .insert(target_index, order.clone());
        Ok(order)
    }

    fn build_reverse_postorder(&self, target_index: usize) -> Result<Vec<usize>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            InProgress,
            Done,
        }
        let mut marks = vec![Mark::Unvisited; self.nodes.len()];
        let mut order = Vec::new();
        let mut stack = vec![(target_index, false)];
        while let Some((idx, expanded)) = stack.pop() {
            if expanded {
                marks[idx] = Mark::Done;
                order.push(idx);
                continue;
            }
            match marks[idx] {
                Mark::Done => continue,
                Mark::InProgress => {
                    return Err(EngineError::CycleDetected(self.nodes[idx].id.clone()));
                }
                Mark::Unvisited => {}
            }
            marks[idx] = Mark::InProgress;
            stack.push((idx, true));
            if let CompiledNodeKind::Operation { inputs, .. } = &self.nodes[idx].kind {
                for &(src, _) in inputs {
                    match marks[src] {
                        Mark::Unvisited => stack.push((src, false)),
                        Mark::InProgress => {
                            return Err(EngineError::CycleDetected(self.nodes[src].id.clone()));
                        }
                        Mark::Done => {}
                    }
                }
            }
        }
        Ok(order)
    }
}

fn compile_inner(graph: &Graph, registry: &OperationRegistry) -> Result<Vec<CompiledNode>> {
    let index: HashMap<&str, usize> = graph
        .nodes()
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();

    let arity_of = |producer_index: usize| -> OutputArity {
        match &graph.nodes()[producer_index].kind {
            NodeKind::Operation { op_name, .. } => {
                registry.lookup(op_name).map(|e| e.output_arity).unwrap_or(OutputArity::Fixed(1))
            }
            _ => OutputArity::Fixed(1),
        }
    };

    let mut compiled = Vec::with_capacity(graph.nodes().len());
    for node in graph.nodes() {
        let kind = match &node.kind {
            NodeKind::Constant { value } => CompiledNodeKind::Constant { value: value.clone() },
            NodeKind::Placeholder => CompiledNodeKind::Placeholder,
            NodeKind::Variable { value } => CompiledNodeKind::Variable { value: value.clone() },
            NodeKind::Operation { op_name, inputs, constants } => {
                let entry = registry
                    .lookup(op_name)
                    .ok_or_else(|| EngineError::UnknownOperation(op_name.clone()))?;
                let mut resolved = Vec::with_capacity(inputs.len());
                for port in inputs {
                    let producer_index = *index
                        .get(port.node_id.as_str())
                        .ok_or_else(|| EngineError::UnknownNode(port.node_id.clone()))?;
                    if let OutputArity::Fixed(k) = arity_of(producer_index) {
                        if port.output_index >= k {
                            return Err(EngineError::bad_port(
                                port.to_string(),
                                format!("output index {} out of range for arity {k}", port.output_index),
                            ));
                        }
                    }
                    resolved.push((producer_index, port.output_index));
                }
                CompiledNodeKind::Operation { entry, inputs: resolved, constants: constants.clone() }
            }
        };
        compiled.push(CompiledNode { id: node.id.clone(), kind });
    }
    Ok(compiled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::OperationRegistry;

    #[test]
    fn unknown_node_reference_fails_compile() {
        let mut g = Graph::new();
        g.op_with_id("r", "reverse", vec![PortRef::new("missing")], vec![]).unwrap();
        let compiled = CompiledGraph::compile(&g, &OperationRegistry::new());
        assert!(!compiled.is_valid());
        assert!(matches!(compiled.first_error(), Some(EngineError::UnknownNode(_))));
    }

    #[test]
    fn unknown_operation_fails_compile() {
        let mut g = Graph::new();
        let x = g.constant_with_id("x", "a").unwrap();
        g.op_with_id("r", "no_such_op", vec![x.into()], vec![]).unwrap();
        let compiled = CompiledGraph::compile(&g, &OperationRegistry::new());
        assert!(!compiled.is_valid());
        assert!(matches!(compiled.first_error(), Some(EngineError::UnknownOperation(_))));
    }

    #[test]
    fn out_of_range_fixed_arity_port_fails_compile() {
        let mut g = Graph::new();
        let x = g.constant_with_id("x", "a").unwrap();
        g.op_with_id("r", "to_upper", vec![x.output(1)], vec![]).unwrap();
        let compiled = CompiledGraph::compile(&g, &OperationRegistry::new());
        assert!(!compiled.is_valid());
        assert!(matches!(compiled.first_error(), Some(EngineError::BadPort { .. })));
    }

    #[test]
    fn cycle_is_detected_on_first_evaluation() {
        let mut g = Graph::new();
        g.op_with_id("a", "identity", vec![PortRef::new("b")], vec![]).unwrap();
        g.op_with_id("b", "identity", vec![PortRef::new("a")], vec![]).unwrap();
        let compiled = CompiledGraph::compile(&g, &OperationRegistry::new());
        assert!(compiled.is_valid());
        let idx = compiled.resolve(&PortRef::new("a")).unwrap();
        assert!(matches!(compiled.reverse_postorder(idx), Err(EngineError::CycleDetected(_))));
    }
}
