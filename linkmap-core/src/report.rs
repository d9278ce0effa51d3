// Graph rendering for the command line: text, JSON and Graphviz DOT

use crate::error::Result;
use crate::model::{CardGraph, Graph, GraphNode};
use petgraph::dot::Dot;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Dot,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "dot" | "graphviz" => Some(ReportFormat::Dot),
            _ => None,
        }
    }
}

pub fn render_graph(graph: &Graph, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(text_report(graph, None)),
        ReportFormat::Json => Ok(serde_json::to_string_pretty(graph)?),
        ReportFormat::Dot => Ok(dot_report(graph)),
    }
}

/// Like [`render_graph`], but the text form also lists the card's nodes in
/// authoring order.
pub fn render_card(card: &CardGraph, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(text_report(&card.graph, Some(&card.nodes_list))),
        ReportFormat::Json => Ok(serde_json::to_string_pretty(card)?),
        ReportFormat::Dot => Ok(dot_report(&card.graph)),
    }
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

fn text_report(graph: &Graph, nodes_list: Option<&[GraphNode]>) -> String {
    let mut report = String::new();

    report.push_str(&format!(
        "Nodes: {}    Edges: {}\n\n",
        graph.nodes.len(),
        graph.edges.iter().filter(|e| !e.is_layout_loop()).count()
    ));

    report.push_str("NODES\n");
    report.push_str("────────────────────────────────────────────────────────────────────────────────\n");
    for node in &graph.nodes {
        report.push_str(&format!(
            "{:>8}  {:<9} {:>6}  {}\n",
            node.id,
            node.role.as_str(),
            node.weight,
            node.label
        ));
        if node.title != node.label {
            report.push_str(&format!("{:>33}{}\n", "", node.title));
        }
    }
    report.push('\n');

    report.push_str("EDGES\n");
    report.push_str("────────────────────────────────────────────────────────────────────────────────\n");
    for edge in &graph.edges {
        if edge.is_layout_loop() {
            report.push_str(&format!("{:>8} ↺ (isolated)\n", edge.from));
        } else {
            report.push_str(&format!(
                "{:>8} → {:<8} weight {}\n",
                edge.from, edge.to, edge.weight
            ));
        }
    }

    if let Some(list) = nodes_list {
        report.push_str("\nCARD ORDER\n");
        report.push_str("────────────────────────────────────────────────────────────────────────────────\n");
        for (idx, node) in list.iter().enumerate() {
            report.push_str(&format!("{:>4}. {} ({})\n", idx + 1, node.label, node.id));
        }
    }

    report
}

fn dot_report(graph: &Graph) -> String {
    let mut g = petgraph::Graph::<String, i32>::new();
    let mut index: HashMap<i64, NodeIndex> = HashMap::new();

    for node in &graph.nodes {
        let idx = g.add_node(format!("{} {}", node.id, node.label));
        index.insert(node.id, idx);
    }
    for edge in &graph.edges {
        if let (Some(&from), Some(&to)) = (index.get(&edge.from), index.get(&edge.to)) {
            g.add_edge(from, to, edge.weight);
        }
    }

    format!("{}", Dot::new(&g))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_format_from_str() {
        assert_eq!(ReportFormat::from_str("TEXT"), Some(ReportFormat::Text));
        assert_eq!(ReportFormat::from_str("json"), Some(ReportFormat::Json));
        assert_eq!(ReportFormat::from_str("graphviz"), Some(ReportFormat::Dot));
        assert_eq!(ReportFormat::from_str("html"), None);
    }
}
