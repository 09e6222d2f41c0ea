//! The JSON interchange format (§4.2, §6).
//!
//! Parsing goes through `serde_json::Value` rather than a single derived
//! struct so that the "exactly one of `type`+`value` or `op`+`inputs`" rule,
//! and the bare-`value` backward-compatibility case, produce precise
//! `EngineError::Schema` messages instead of a generic deserialize failure.

use serde_json::{json, Map, Value};

use crate::error::{EngineError, Result};
use crate::graph::{set_default_target, Graph};
use crate::node::{Node, NodeKind};
use crate::port::PortRef;

/// Serialise `graph` to the schema verbatim, in insertion order.
pub fn to_json(graph: &Graph) -> Result<String> {
    let nodes: Vec<Value> = graph.nodes().iter().map(node_to_json).collect();
    let mut doc = Map::new();
    doc.insert("nodes".to_string(), Value::Array(nodes));
    if let Some(target) = graph.default_target() {
        doc.insert("target_node".to_string(), Value::String(target.to_string()));
    }
    serde_json::to_string_pretty(&Value::Object(doc)).map_err(EngineError::from)
}

fn node_to_json(node: &Node) -> Value {
    let mut obj = Map::new();
    obj.insert("id".to_string(), json!(node.id));
    match &node.kind {
        NodeKind::Constant { value } => {
            obj.insert("type".to_string(), json!("constant"));
            obj.insert("value".to_string(), json!(value));
        }
        NodeKind::Placeholder => {
            obj.insert("type".to_string(), json!("placeholder"));
        }
        NodeKind::Variable { value } => {
            obj.insert("type".to_string(), json!("variable"));
            obj.insert("value".to_string(), json!(value));
        }
        NodeKind::Operation { op_name, inputs, constants } => {
            obj.insert("op".to_string(), json!(op_name));
            obj.insert("inputs".to_string(), json!(inputs.iter().map(|p| p.to_string()).collect::<Vec<_>>()));
            if !constants.is_empty() {
                obj.insert("constants".to_string(), json!(constants));
            }
        }
    }
    Value::Object(obj)
}

/// Parse the schema into a fresh `Graph`, preserving node order as
/// insertion order.
pub fn from_json(text: &str) -> Result<Graph> {
    let doc: Value = serde_json::from_str(text)?;
    let obj = doc.as_object().ok_or_else(|| EngineError::Schema("top-level document must be an object".into()))?;
    let nodes = obj
        .get("nodes")
        .and_then(Value::as_array)
        .ok_or_else(|| EngineError::Schema("missing required array field 'nodes'".into()))?;

    let mut graph = Graph::new();
    for (i, raw) in nodes.iter().enumerate() {
        let node = parse_node(raw).map_err(|reason| EngineError::Schema(format!("nodes[{i}]: {reason}")))?;
        graph.add_node(node)?;
    }

    if let Some(target) = obj.get("target_node") {
        let target = target
            .as_str()
            .ok_or_else(|| EngineError::Schema("'target_node' must be a string".into()))?;
        set_default_target(&mut graph, Some(PortRef::from(target)));
    }

    Ok(graph)
}

fn parse_node(raw: &Value) -> std::result::Result<Node, String> {
    let obj = raw.as_object().ok_or("node must be an object")?;
    let id = obj
        .get("id")
        .and_then(Value::as_str)
        .ok_or("missing required field 'id'")?
        .to_string();

    let has_type = obj.contains_key("type");
    let has_op = obj.contains_key("op");

    if has_type && has_op {
        return Err(format!("node '{id}' has both 'type' and 'op'; exactly one is allowed"));
    }

    let kind = if has_op {
        let op_name = obj.get("op").and_then(Value::as_str).ok_or("'op' must be a string")?.to_string();
        let inputs = obj
            .get("inputs")
            .and_then(Value::as_array)
            .ok_or("operation node requires array field 'inputs'")?
            .iter()
            .map(|v| v.as_str().map(PortRef::from).ok_or_else(|| "'inputs' entries must be strings".to_string()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let constants = match obj.get("constants") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| v.as_str().map(str::to_string).ok_or_else(|| "'constants' entries must be strings".to_string()))
                .collect::<std::result::Result<Vec<_>, _>>()?,
            Some(_) => return Err("'constants' must be an array of strings".to_string()),
            None => Vec::new(),
        };
        NodeKind::Operation { op_name, inputs, constants }
    } else if has_type {
        let type_name = obj.get("type").and_then(Value::as_str).ok_or("'type' must be a string")?;
        match type_name {
            "constant" => NodeKind::Constant { value: required_value(obj, &id)? },
            "variable" => NodeKind::Variable { value: required_value(obj, &id)? },
            "placeholder" => {
                if obj.contains_key("value") {
                    return Err(format!("node '{id}': placeholder nodes must not have a 'value' field"));
                }
                NodeKind::Placeholder
            }
            other => return Err(format!("node '{id}': unknown type '{other}'")),
        }
    } else if let Some(value) = obj.get("value").and_then(Value::as_str) {
        // Backward compatibility: bare `value` with no `type`/`op` is a constant.
        NodeKind::Constant { value: value.to_string() }
    } else {
        return Err(format!("node '{id}' has neither 'type' nor 'op' nor a bare 'value'"));
    };

    Ok(Node { id, kind })
}

fn required_value(obj: &Map<String, Value>, id: &str) -> std::result::Result<String, String> {
    obj.get("value")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| format!("node '{id}': missing required field 'value'"))
}
