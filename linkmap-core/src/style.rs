//! Role to presentation lookup.
//!
//! The assembler only assigns roles. Colors live here as data so a
//! deployment can swap the palette (see [`RoleStyles::from_json`]) without
//! touching graph assembly. [`StyledGraph`] is the vis-network shaped wire
//! form that renderers consume.

use crate::error::Result;
use crate::model::{CardGraph, EdgeKind, Graph, GraphEdge, GraphNode, NodeRole};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorPair {
    pub background: String,
    pub border: String,
}

impl ColorPair {
    fn new(background: &str, border: &str) -> Self {
        Self {
            background: background.to_string(),
            border: border.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeStyle {
    pub background: String,
    pub border: String,
    pub highlight: ColorPair,
    pub hover: ColorPair,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleStyles {
    pub seed: NodeStyle,
    pub neighbor: NodeStyle,
    pub isolated: NodeStyle,
    #[serde(rename = "match")]
    pub matched: NodeStyle,
}

impl Default for RoleStyles {
    fn default() -> Self {
        let selected = ColorPair::new("rgb(187, 163, 217)", "rgb(187, 163, 217)");
        Self {
            seed: NodeStyle {
                background: "rgba(8, 217, 174, 0.9)".to_string(),
                border: "rgba(96, 169, 191, 0.8)".to_string(),
                highlight: selected.clone(),
                hover: ColorPair::new("rgba(8, 217, 174, 0.9)", "rgb(211, 114, 214)"),
            },
            neighbor: NodeStyle {
                background: "rgba(252, 213, 173, 0.9)".to_string(),
                border: "rgb(252, 213, 173)".to_string(),
                highlight: selected.clone(),
                hover: ColorPair::new("rgba(252, 213, 173, 0.9)", "rgb(211, 114, 214)"),
            },
            isolated: NodeStyle {
                background: "rgba(155, 168, 171, 0.9)".to_string(),
                border: "rgba(155, 168, 171, 0.9)".to_string(),
                highlight: ColorPair::new("rgba(155, 168, 171, 0.9)", "rgba(155, 168, 171, 0.9)"),
                hover: ColorPair::new("rgba(8, 217, 174, 0.9)", "rgb(211, 114, 214)"),
            },
            matched: NodeStyle {
                background: "#e04141".to_string(),
                border: "#e04141".to_string(),
                highlight: selected,
                hover: ColorPair::new("#e04141", "rgb(211, 114, 214)"),
            },
        }
    }
}

impl RoleStyles {
    pub fn style_for(&self, role: NodeRole) -> &NodeStyle {
        match role {
            NodeRole::Seed => &self.seed,
            NodeRole::Neighbor => &self.neighbor,
            NodeRole::Isolated => &self.isolated,
            NodeRole::Match => &self.matched,
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn style_node(&self, node: &GraphNode) -> StyledNode {
        StyledNode {
            id: node.id,
            title: node.label.clone(),
            label: node.title.clone(),
            color: self.style_for(node.role).clone(),
            value: node.weight,
        }
    }

    pub fn style_graph(&self, graph: &Graph) -> StyledGraph {
        StyledGraph {
            nodes: graph.nodes.iter().map(|n| self.style_node(n)).collect(),
            edges: graph.edges.iter().map(StyledEdge::from).collect(),
            nodes_list: None,
        }
    }

    pub fn style_card(&self, card: &CardGraph) -> StyledGraph {
        let mut styled = self.style_graph(&card.graph);
        styled.nodes_list = Some(card.nodes_list.iter().map(|n| self.style_node(n)).collect());
        styled
    }
}

/// Node as sent to renderers. `title` carries the url and `label` the
/// page title, which is the layout vis-network expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyledNode {
    pub id: i64,
    pub title: String,
    pub label: String,
    pub color: NodeStyle,
    pub value: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyledEdge {
    pub from: i64,
    pub to: i64,
    /// Stored links are dashed; the layout loop of an isolated seed is solid.
    pub dashes: bool,
}

impl From<&GraphEdge> for StyledEdge {
    fn from(edge: &GraphEdge) -> Self {
        Self {
            from: edge.from,
            to: edge.to,
            dashes: edge.kind == EdgeKind::Link,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyledGraph {
    pub nodes: Vec<StyledNode>,
    pub edges: Vec<StyledEdge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes_list: Option<Vec<StyledNode>>,
}
