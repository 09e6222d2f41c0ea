//! Integration tests for complete graph workflows.
//!
//! These exercise the public façade end to end — JSON parsing, compilation,
//! and evaluation together — in the concrete scenarios the engine is
//! expected to handle.

use std::sync::Arc;

use stringflow::{
    EngineError, Feed, Graph, OpError, OperationExecutor, OperationKind, OperationRegistry,
    OutputArity,
};

#[test]
fn basic_chain_from_json() {
    let text = r#"{
        "nodes": [
            {"id": "x", "value": "hello"},
            {"id": "u", "op": "to_upper", "inputs": ["x"]},
            {"id": "r", "op": "reverse", "inputs": ["u"]}
        ]
    }"#;
    let graph = Graph::from_json(text).unwrap();
    assert_eq!(graph.run("r", &Feed::new()).unwrap(), "OLLEH");
}

#[test]
fn placeholder_is_reused_across_feeds() {
    let mut graph = Graph::new();
    let t = graph.placeholder_with_id("t").unwrap();
    let u = graph.op_with_id("u", "to_upper", vec![t.into()], vec![]).unwrap();
    graph.op_with_id("y", "reverse", vec![u.into()], vec![]).unwrap();

    let mut feed = Feed::new();
    feed.insert("t".to_string(), "hello".to_string());
    assert_eq!(graph.run("y", &feed).unwrap(), "OLLEH");

    feed.insert("t".to_string(), "world".to_string());
    assert_eq!(graph.run("y", &feed).unwrap(), "DLROW");
}

#[test]
fn multi_output_split_target_and_out_of_range() {
    let mut graph = Graph::new();
    let s = graph.constant_with_id("s", "the quick brown fox").unwrap();
    graph.op_with_id("parts", "split", vec![s.into()], vec![" ".to_string()]).unwrap();

    let feed = Feed::new();
    assert_eq!(graph.run("parts:3", &feed).unwrap(), "fox");
    assert!(matches!(graph.run("parts:5", &feed), Err(EngineError::BadPort { .. })));
}

#[test]
fn concat_with_mixed_node_kinds() {
    let mut graph = Graph::new();
    let hello = graph.constant_with_id("hello", "Hello").unwrap();
    let space = graph.constant_with_id("space", " ").unwrap();
    let name = graph.placeholder_with_id("name").unwrap();
    let bang = graph.constant_with_id("bang", "!").unwrap();
    graph
        .op_with_id("greeting", "concat", vec![hello.into(), space.into(), name.into(), bang.into()], vec![])
        .unwrap();

    let mut feed = Feed::new();
    feed.insert("name".to_string(), "Python".to_string());
    assert_eq!(graph.run("greeting", &feed).unwrap(), "Hello Python!");
}

#[test]
fn replace_then_substring() {
    let mut graph = Graph::new();
    let input = graph.constant_with_id("input", "hello world").unwrap();
    let replaced =
        graph.op_with_id("replaced", "replace", vec![input.into()], vec!["world".into(), "python".into()]).unwrap();
    graph.op_with_id("out", "substring", vec![replaced.into()], vec!["6".into(), "5".into()]).unwrap();
    assert_eq!(graph.run("out", &Feed::new()).unwrap(), "python");
}

#[test]
fn missing_feed_names_the_placeholder() {
    let mut graph = Graph::new();
    graph.placeholder_with_id("t").unwrap();
    let err = graph.run("t", &Feed::new()).unwrap_err();
    assert!(matches!(err, EngineError::MissingFeed(id) if id == "t"));
}

#[test]
fn three_strategies_agree_and_json_round_trips() {
    let mut graph = Graph::new();
    let x = graph.constant_with_id("x", "hello").unwrap();
    let u = graph.op_with_id("u", "to_upper", vec![x.into()], vec![]).unwrap();
    graph.op_with_id("r", "reverse", vec![u.into()], vec![]).unwrap();
    let feed = Feed::new();

    let via_run = graph.run("r", &feed).unwrap();
    let via_optimized = graph.run_optimized("r", &feed).unwrap();
    let via_compile = graph.compile().run("r", &feed).unwrap();
    assert_eq!(via_run, via_optimized);
    assert_eq!(via_run, via_compile);

    let round_tripped = Graph::from_json(&graph.to_json().unwrap()).unwrap();
    assert_eq!(round_tripped.run("r", &feed).unwrap(), via_run);
}

#[test]
fn cycle_is_rejected_with_no_partial_result() {
    let mut graph = Graph::new();
    graph.op_with_id("a", "identity", vec!["b".into()], vec![]).unwrap();
    graph.op_with_id("b", "identity", vec!["a".into()], vec![]).unwrap();
    let err = graph.run("a", &Feed::new()).unwrap_err();
    assert!(matches!(err, EngineError::CycleDetected(_)));
}

#[test]
fn appending_unrelated_nodes_after_run_optimized_does_not_break_original_target() {
    let mut graph = Graph::new();
    let x = graph.constant_with_id("x", "hello").unwrap();
    graph.op_with_id("u", "to_upper", vec![x.into()], vec![]).unwrap();

    let feed = Feed::new();
    assert_eq!(graph.run_optimized("u", &feed).unwrap(), "HELLO");

    graph.constant_with_id("unrelated", "noise").unwrap();
    assert_eq!(graph.run_optimized("u", &feed).unwrap(), "HELLO");
    assert_eq!(graph.run("u", &feed).unwrap(), "HELLO");
}

#[test]
fn duplicate_node_id_is_rejected_at_construction() {
    let mut graph = Graph::new();
    graph.constant_with_id("x", "a").unwrap();
    let err = graph.constant_with_id("x", "b").unwrap_err();
    assert!(matches!(err, EngineError::DuplicateNode(id) if id == "x"));
}

#[test]
fn unknown_operation_surfaces_at_compile_time() {
    let mut graph = Graph::new();
    let x = graph.constant_with_id("x", "a").unwrap();
    graph.op_with_id("bad", "not_a_real_op", vec![x.into()], vec![]).unwrap();
    let compiled = graph.compile();
    assert!(!compiled.is_valid());
    assert!(matches!(compiled.run("bad", &Feed::new()), Err(EngineError::UnknownOperation(_))));
}

#[test]
fn user_registered_foreign_operation_participates_in_a_graph() {
    let registry = OperationRegistry::new();
    let shout: OperationExecutor =
        Arc::new(|inputs, _constants| Ok(vec![format!("{}!!!", inputs[0])]));
    registry
        .register("shout", shout, OutputArity::Fixed(1), 1, OperationKind::Foreign, false)
        .unwrap();

    let mut graph = Graph::new();
    let x = graph.constant_with_id("x", "hello").unwrap();
    graph.op_with_id("y", "shout", vec![x.into()], vec![]).unwrap();

    let compiled = graph.compile_with_registry(&registry);
    assert_eq!(compiled.run("y", &Feed::new()).unwrap(), "hello!!!");
}

#[test]
fn foreign_operation_failure_surfaces_as_operation_failure() {
    let registry = OperationRegistry::new();
    let explode: OperationExecutor =
        Arc::new(|_inputs, _constants| Err(OpError::failure("callback raised")));
    registry.register("explode", explode, OutputArity::Fixed(1), 1, OperationKind::Foreign, false).unwrap();

    let mut graph = Graph::new();
    let x = graph.constant_with_id("x", "hello").unwrap();
    graph.op_with_id("y", "explode", vec![x.into()], vec![]).unwrap();

    let compiled = graph.compile_with_registry(&registry);
    let err = compiled.run("y", &Feed::new()).unwrap_err();
    assert!(matches!(err, EngineError::OperationFailure { op, .. } if op == "explode"));
}

#[test]
fn dynamic_multi_output_user_operation_can_report_zero_outputs() {
    let registry = OperationRegistry::new();
    let empty_split: OperationExecutor = Arc::new(|_inputs, _constants| Ok(vec![]));
    registry
        .register("empty_split", empty_split, OutputArity::Dynamic, 1, OperationKind::Native, false)
        .unwrap();

    let mut graph = Graph::new();
    let x = graph.constant_with_id("x", "hello").unwrap();
    graph.op_with_id("y", "empty_split", vec![x.into()], vec![]).unwrap();

    let compiled = graph.compile_with_registry(&registry);
    let err = compiled.run("y:0", &Feed::new()).unwrap_err();
    assert!(matches!(err, EngineError::BadPort { .. }));
}

#[test]
fn registering_duplicate_operation_name_without_replace_fails() {
    let registry = OperationRegistry::new();
    let noop: OperationExecutor = Arc::new(|inputs, _| Ok(vec![inputs[0].clone()]));
    let err = registry
        .register("reverse", noop, OutputArity::Fixed(1), 1, OperationKind::Native, false)
        .unwrap_err();
    assert!(matches!(err, EngineError::DuplicateOperation(name) if name == "reverse"));
}

#[test]
fn operation_node_built_with_too_few_inputs_fails_with_bad_port_not_a_panic() {
    let mut graph = Graph::new();
    graph.op_with_id("u", "to_upper", vec![], vec![]).unwrap();
    let compiled = graph.compile();
    assert!(compiled.is_valid());
    let err = compiled.run("u", &Feed::new()).unwrap_err();
    assert!(matches!(err, EngineError::BadPort { .. }));
}

#[test]
fn target_node_from_json_drives_run_default() {
    let text = r#"{
        "nodes": [{"id": "x", "value": "hi"}],
        "target_node": "x"
    }"#;
    let graph = Graph::from_json(text).unwrap();
    assert_eq!(graph.run_default(&Feed::new()).unwrap(), "hi");
}
