// Tests for graph report rendering

use linkmap_core::model::{CardGraph, Graph, GraphEdge, GraphNode, LinkEdge, NodeRole};
use linkmap_core::report::{ReportFormat, render_card, render_graph, save_report};
use tempfile::TempDir;

fn node(id: i64, role: NodeRole) -> GraphNode {
    GraphNode {
        id,
        label: format!("https://n{}.example/", id),
        title: format!("Node {}", id),
        role,
        weight: 5,
    }
}

fn sample_graph() -> Graph {
    Graph {
        nodes: vec![
            node(1, NodeRole::Seed),
            node(2, NodeRole::Neighbor),
            node(9, NodeRole::Isolated),
        ],
        edges: vec![
            GraphEdge::link(LinkEdge {
                from: 1,
                to: 2,
                weight: 8,
            }),
            GraphEdge::layout_loop(9),
        ],
    }
}

#[test]
fn test_text_report_lists_nodes_and_edges() {
    let report = render_graph(&sample_graph(), ReportFormat::Text).unwrap();

    assert!(report.contains("Nodes: 3"));
    assert!(report.contains("Edges: 1"));
    assert!(report.contains("https://n1.example/"));
    assert!(report.contains("seed"));
    assert!(report.contains("neighbor"));
    assert!(report.contains("isolated"));
    assert!(report.contains("weight 8"));
    assert!(!report.contains("CARD ORDER"));
}

#[test]
fn test_json_report_round_trips() {
    let graph = sample_graph();
    let report = render_graph(&graph, ReportFormat::Json).unwrap();

    let parsed: Graph = serde_json::from_str(&report).unwrap();
    assert_eq!(parsed, graph);
}

#[test]
fn test_json_report_uses_snake_case_roles() {
    let report = render_graph(&sample_graph(), ReportFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&report).unwrap();

    assert_eq!(value["nodes"][0]["role"], "seed");
    assert_eq!(value["edges"][1]["kind"], "layout_loop");
}

#[test]
fn test_dot_report() {
    let report = render_graph(&sample_graph(), ReportFormat::Dot).unwrap();

    assert!(report.starts_with("digraph {"));
    assert!(report.contains("1 https://n1.example/"));
    assert!(report.contains("0 -> 1"));
    // The layout loop of node 9 is a self edge on its index
    assert!(report.contains("2 -> 2"));
}

#[test]
fn test_card_text_report_keeps_authoring_order() {
    let graph = sample_graph();
    let card = CardGraph {
        nodes_list: vec![graph.nodes[2].clone(), graph.nodes[0].clone()],
        graph,
    };
    let report = render_card(&card, ReportFormat::Text).unwrap();

    let order = report.split("CARD ORDER").nth(1).unwrap();
    let nine = order.find("n9.example").unwrap();
    let one = order.find("n1.example").unwrap();
    assert!(nine < one);
}

#[test]
fn test_card_json_report_has_nodes_list() {
    let graph = sample_graph();
    let card = CardGraph {
        nodes_list: vec![graph.nodes[0].clone()],
        graph,
    };
    let report = render_card(&card, ReportFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&report).unwrap();

    assert_eq!(value["nodes_list"].as_array().unwrap().len(), 1);
    assert_eq!(value["nodes"].as_array().unwrap().len(), 3);
}

#[test]
fn test_save_report() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("graph.dot");

    let report = render_graph(&sample_graph(), ReportFormat::Dot).unwrap();
    save_report(&report, &path).unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), report);
}

#[test]
fn test_empty_graph_renders() {
    let report = render_graph(&Graph::default(), ReportFormat::Text).unwrap();
    assert!(report.contains("Nodes: 0"));
}
