use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum link weight for an edge to be materialized.
pub const SIGNIFICANCE_THRESHOLD: i32 = 5;

/// One crawler sighting of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeObservation {
    pub node_id: i64,
    pub label: String,
    pub weight: i32,
}

impl NodeObservation {
    pub fn new(node_id: i64, label: impl Into<String>, weight: i32) -> Self {
        Self {
            node_id,
            label: label.into(),
            weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedNode {
    pub node_id: i64,
    pub label: String,
    pub total_weight: i32,
}

/// A row of the page table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageNode {
    pub id: i64,
    pub url: String,
    /// Falls back to the url when the page has no title.
    pub title: String,
    pub weight: i32,
}

/// A row of the link table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEdge {
    pub from: i64,
    pub to: i64,
    pub weight: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    Seed,
    Neighbor,
    Isolated,
    /// Snapshot node whose label equals the current search term.
    Match,
}

impl NodeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeRole::Seed => "seed",
            NodeRole::Neighbor => "neighbor",
            NodeRole::Isolated => "isolated",
            NodeRole::Match => "match",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: i64,
    pub label: String,
    pub title: String,
    pub role: NodeRole,
    pub weight: i32,
}

impl GraphNode {
    pub fn from_page(page: PageNode, role: NodeRole) -> Self {
        Self {
            id: page.id,
            label: page.url,
            title: page.title,
            role,
            weight: page.weight,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// A stored link at or above the significance threshold.
    Link,
    /// Self-loop synthesized for an isolated seed so renderers have
    /// something to lay out. Not a relationship.
    LayoutLoop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: i64,
    pub to: i64,
    pub weight: i32,
    pub kind: EdgeKind,
}

impl GraphEdge {
    pub fn link(edge: LinkEdge) -> Self {
        Self {
            from: edge.from,
            to: edge.to,
            weight: edge.weight,
            kind: EdgeKind::Link,
        }
    }

    pub fn layout_loop(node_id: i64) -> Self {
        Self {
            from: node_id,
            to: node_id,
            weight: 0,
            kind: EdgeKind::LayoutLoop,
        }
    }

    pub fn is_layout_loop(&self) -> bool {
        self.kind == EdgeKind::LayoutLoop
    }
}

/// Nodes are unique by id; every edge endpoint is present in `nodes`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl Graph {
    pub fn node(&self, id: i64) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn contains_node(&self, id: i64) -> bool {
        self.node(id).is_some()
    }
}

/// Graph recalled from a card, plus the members in authoring order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardGraph {
    #[serde(flatten)]
    pub graph: Graph,
    pub nodes_list: Vec<GraphNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seed {
    Url(String),
    Id(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardMember {
    pub node_id: i64,
    pub ordinal: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCard {
    pub card_id: Uuid,
    pub description: String,
    pub members: Vec<CardMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphCardSummary {
    pub card_id: Uuid,
    pub member_count: i64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: i64,
    pub url: String,
    pub title: String,
}
