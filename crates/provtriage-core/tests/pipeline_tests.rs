//! Integration tests for the operation tree and solver query pipeline
//!
//! Graphs are loaded from the instrumenter's JSON exports under tests/fixtures/.

use std::fs;
use std::path::Path;

use insta::assert_json_snapshot;
use provtriage_core::classify::SinkKind;
use provtriage_core::error::{ErrorKind, GraphError, TriageError};
use provtriage_core::{ConstraintSynthesizer, OperationTreeBuilder, ProvenanceGraph};

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn read_fixture(name: &str) -> String {
    let path = Path::new(FIXTURES_DIR).join(name);
    fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e))
}

fn load_graph(name: &str) -> ProvenanceGraph {
    ProvenanceGraph::from_json(&read_fixture(name)).expect("fixture should load")
}

#[test]
fn flows_to_inverts_flows_from() {
    let graph = load_graph("exec_graph.json");

    for node in graph.nodes() {
        for parent in &node.flows_from {
            assert!(graph.flows_to(*parent).contains(&node.id));
        }
        for child in graph.flows_to(node.id) {
            let consumer = graph.get(*child).unwrap();
            assert!(consumer.flows_from.contains(&node.id));
        }
    }
}

#[test]
fn dangling_edge_is_a_load_error() {
    let err = ProvenanceGraph::from_json(&read_fixture("dangling_edge.json")).unwrap_err();
    assert!(matches!(
        err,
        GraphError::DanglingEdge { node: 1, parent: 9 }
    ));
}

#[test]
fn exec_tree_serializes_in_operand_order() {
    let graph = load_graph("exec_graph.json");
    let tree = OperationTreeBuilder::new(&graph)
        .build_from_root()
        .unwrap()
        .unwrap();

    assert_json_snapshot!(tree, @r#"
    {
      "exec": {
        "op0": {
          "concat": {
            "op0": {
              "constant": "ls "
            },
            "op1": {
              "base": {
                "op0": {
                  "input": "dir"
                },
                "op1": {
                  "constant": "-"
                }
              }
            }
          }
        }
      }
    }
    "#);
}

#[test]
fn exec_query_asserts_shell_payload() {
    let graph = load_graph("exec_graph.json");
    let tree = OperationTreeBuilder::new(&graph)
        .build_from_root()
        .unwrap()
        .unwrap();
    let query = ConstraintSynthesizer::synthesize(&tree).unwrap();

    assert_eq!(query.sink, SinkKind::Exec);
    assert_eq!(
        query.to_smtlib(),
        "(declare-const input0 String)\n\
         (assert (str.contains (str.++ \"ls \" input0) \"$(touch success);#\"))\n\
         (check-sat)\n\
         (get-model)"
    );
}

#[test]
fn eval_query_escapes_constants_and_follows_tainted_field() {
    let graph = load_graph("eval_graph.json");
    let tree = OperationTreeBuilder::new(&graph)
        .build_from_root()
        .unwrap()
        .unwrap();
    let query = ConstraintSynthesizer::synthesize(&tree).unwrap();

    assert_eq!(query.sink, SinkKind::Eval);
    assert_eq!(query.input_count, 1);
    assert_eq!(query.term, r#"(str.++ "obj[""" input0 """] = 1")"#);
    assert!(query.to_smtlib().contains("\"__proto__+global.CTF();//\""));
    assert!(!query.to_smtlib().contains("touch success"));
}

#[test]
fn query_on_non_sink_root_is_unsupported() {
    let graph = ProvenanceGraph::from_json(
        r#"{
            "1": { "operation": "+", "flows_from": ["2"], "tainted": true },
            "2": { "operation": "Tainted", "flows_from": [], "value": "x", "tainted": true }
        }"#,
    )
    .unwrap();
    let tree = OperationTreeBuilder::new(&graph)
        .build_from_root()
        .unwrap()
        .unwrap();

    let err = ConstraintSynthesizer::synthesize(&tree).unwrap_err();
    assert_eq!(err, TriageError::UnsupportedQuery { kind: "concat" });
    assert_eq!(err.kind(), ErrorKind::UnsupportedQuery);
}

#[test]
fn pruned_sink_argument_surfaces_as_missing_operand() {
    let graph = ProvenanceGraph::from_json(
        r#"{
            "1": { "operation": "call:eval", "flows_from": ["2"], "tainted": true },
            "2": { "operation": "object.Binary", "flows_from": [], "tainted": true }
        }"#,
    )
    .unwrap();
    let tree = OperationTreeBuilder::new(&graph)
        .build_from_root()
        .unwrap()
        .unwrap();

    assert_eq!(
        ConstraintSynthesizer::synthesize(&tree).unwrap_err(),
        TriageError::MissingOperand { kind: "eval" }
    );
}

#[test]
fn sink_type_of_fixture_roots() {
    let exec = load_graph("exec_graph.json");
    let eval = load_graph("eval_graph.json");

    assert_eq!(
        SinkKind::from_root_operation(&exec.get(1).unwrap().operation).unwrap(),
        SinkKind::Exec
    );
    assert_eq!(
        SinkKind::from_root_operation(&eval.get(1).unwrap().operation).unwrap(),
        SinkKind::Eval
    );
}

#[test]
fn cyclic_graph_fails_reduction_with_typed_error() {
    let graph = load_graph("cyclic_graph.json");

    let err = OperationTreeBuilder::new(&graph)
        .build_from_root()
        .unwrap_err();

    assert_eq!(err, TriageError::CyclicReduction { node: 2 });
    assert_eq!(err.kind(), ErrorKind::MalformedGraph);
}
