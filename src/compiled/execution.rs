//! The executor (§4.5): walks a `CompiledGraph`'s reverse-postorder for a
//! target, dispatching each node by kind and memoising its output vector
//! for the duration of a single evaluation.

use crate::compiled::graph::{CompiledGraph, CompiledNodeKind};
use crate::error::{EngineError, Result};
use crate::graph::Feed;
use crate::port::PortRef;

impl CompiledGraph {
    /// Evaluate `target` against `feed`. Fails immediately with the
    /// retained compile error if this handle is invalid.
    pub fn run(&self, target: impl Into<PortRef>, feed: &Feed) -> Result<String> {
        if !self.is_valid() {
            return Err(self
                .first_error()
                .cloned()
                .unwrap_or_else(|| EngineError::Schema("compiled graph is invalid".into())));
        }
        let target = target.into();
        let node_index = self.resolve(&target)?;
        let order = self.reverse_postorder(node_index)?;

        let mut buffer: Vec<Option<Vec<String>>> = vec![None; self.nodes.len()];
        for &idx in order.iter() {
            let node = &self.nodes[idx];
            let outputs = match &node.kind {
                CompiledNodeKind::Constant { value } | CompiledNodeKind::Variable { value } => {
                    vec![value.clone()]
                }
                CompiledNodeKind::Placeholder => {
                    let value = feed
                        .get(&node.id)
                        .ok_or_else(|| EngineError::MissingFeed(node.id.clone()))?;
                    vec![value.clone()]
                }
                CompiledNodeKind::Operation { entry, inputs, constants } => {
                    let mut gathered = Vec::with_capacity(inputs.len());
                    for &(src, k) in inputs {
                        let produced = buffer[src]
                            .as_ref()
                            .expect("topological order guarantees producer already evaluated");
                        let value = produced.get(k).ok_or_else(|| {
                            EngineError::bad_port(
                                format!("{}:{k}", self.nodes[src].id),
                                format!("producer yielded {} output(s)", produced.len()),
                            )
                        })?;
                        gathered.push(value.clone());
                    }
                    tracing::trace!(node = %node.id, op = %entry.name, "invoking operation");
                    entry.invoke(&gathered, constants)?
                }
            };
            buffer[idx] = Some(outputs);
        }

        let produced = buffer[node_index].take().expect("target node was in its own reverse-postorder");
        produced.get(target.output_index).cloned().ok_or_else(|| {
            EngineError::bad_port(target.to_string(), format!("producer yielded {} output(s)", produced.len()))
        })
    }

    /// Identical to [`CompiledGraph::run`] today; reserved for future
    /// heuristic dispatch between evaluation strategies (§4.5, §9).
    pub fn run_auto(&self, target: impl Into<PortRef>, feed: &Feed) -> Result<String> {
        self.run(target, feed)
    }
}
