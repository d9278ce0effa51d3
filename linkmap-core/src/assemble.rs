//! Neighborhood graph assembly.
//!
//! A query names one seed (by url or id) or an ordered member list from a
//! card. The assembler fetches the qualifying outgoing links of every seed,
//! pulls in the pages on the far end as neighbors, and annotates each node
//! with its role. Seeds that have no qualifying link are rendered as
//! `Isolated` and get a synthetic layout loop.

use crate::error::{GraphError, Result};
use crate::model::{
    CardGraph, Graph, GraphEdge, GraphNode, LinkEdge, NodeRole, PageNode, SIGNIFICANCE_THRESHOLD,
    Seed,
};
use crate::source::LinkSource;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, warn};

pub struct GraphAssembler<'a, S: LinkSource + ?Sized> {
    source: &'a S,
    threshold: i32,
}

impl<'a, S: LinkSource + ?Sized> GraphAssembler<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            threshold: SIGNIFICANCE_THRESHOLD,
        }
    }

    // Not exposed to callers of the transport yet
    pub fn with_threshold(mut self, threshold: i32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> i32 {
        self.threshold
    }

    pub fn resolve_seed(&self, seed: &Seed) -> Result<PageNode> {
        let page = match seed {
            Seed::Url(url) => self.source.node_by_label(url)?,
            Seed::Id(id) => self.source.node_by_id(*id)?,
        };
        page.ok_or_else(|| match seed {
            Seed::Url(url) => GraphError::NotFound(format!("node with url {}", url)),
            Seed::Id(id) => GraphError::NotFound(format!("node {}", id)),
        })
    }

    /// Expands a single seed into its one-hop neighborhood.
    pub fn expand(&self, seed: &Seed) -> Result<Graph> {
        let page = self.resolve_seed(seed)?;
        Ok(self.expand_pages(vec![page])?.graph)
    }

    /// Expands an ordered member list. `nodes_list` keeps the members in
    /// the given order, duplicates included.
    pub fn expand_members(&self, member_ids: &[i64]) -> Result<CardGraph> {
        if member_ids.is_empty() {
            return Err(GraphError::InvalidInput("member list is empty".to_string()));
        }

        let unique: Vec<i64> = member_ids
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let found: HashMap<i64, PageNode> = self
            .source
            .nodes_by_ids(&unique)?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut ordered = Vec::with_capacity(member_ids.len());
        for id in member_ids {
            let page = found
                .get(id)
                .cloned()
                .ok_or_else(|| GraphError::NotFound(format!("node {}", id)))?;
            ordered.push(page);
        }

        self.expand_pages(ordered)
    }

    fn expand_pages(&self, seeds: Vec<PageNode>) -> Result<CardGraph> {
        let mut seed_ids: Vec<i64> = Vec::with_capacity(seeds.len());
        let mut seed_set: HashSet<i64> = HashSet::with_capacity(seeds.len());
        for page in &seeds {
            if seed_set.insert(page.id) {
                seed_ids.push(page.id);
            }
        }

        let mut links: Vec<LinkEdge> = self
            .source
            .edges_from(&seed_ids, self.threshold)?
            .into_iter()
            .filter(|e| e.weight >= self.threshold && seed_set.contains(&e.from))
            .collect();

        let neighbor_ids: Vec<i64> = links
            .iter()
            .map(|e| e.to)
            .filter(|id| !seed_set.contains(id))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let neighbors = if neighbor_ids.is_empty() {
            Vec::new()
        } else {
            self.source.nodes_by_ids(&neighbor_ids)?
        };

        let known: HashSet<i64> = seed_set
            .iter()
            .copied()
            .chain(neighbors.iter().map(|n| n.id))
            .collect();
        links.retain(|e| {
            let keep = known.contains(&e.to);
            if !keep {
                warn!("Dropping link {} -> {}: target page is missing", e.from, e.to);
            }
            keep
        });
        links.sort_by_key(|e| (e.from, e.to));
        links.dedup_by_key(|e| (e.from, e.to));

        let linked: HashSet<i64> = links.iter().map(|e| e.from).collect();
        let role_of = |id: i64| {
            if linked.contains(&id) {
                NodeRole::Seed
            } else {
                NodeRole::Isolated
            }
        };

        let nodes_list: Vec<GraphNode> = seeds
            .into_iter()
            .map(|page| {
                let role = role_of(page.id);
                GraphNode::from_page(page, role)
            })
            .collect();

        let mut nodes: Vec<GraphNode> = Vec::with_capacity(seed_ids.len() + neighbors.len());
        let mut emitted: HashSet<i64> = HashSet::new();
        for node in &nodes_list {
            if emitted.insert(node.id) {
                nodes.push(node.clone());
            }
        }
        for page in neighbors {
            if emitted.insert(page.id) {
                nodes.push(GraphNode::from_page(page, NodeRole::Neighbor));
            }
        }

        let mut edges: Vec<GraphEdge> = links.into_iter().map(GraphEdge::link).collect();
        for id in &seed_ids {
            if !linked.contains(id) {
                edges.push(GraphEdge::layout_loop(*id));
            }
        }

        debug!(
            "Assembled graph: {} seeds, {} nodes, {} edges",
            seed_ids.len(),
            nodes.len(),
            edges.len()
        );

        Ok(CardGraph {
            graph: Graph { nodes, edges },
            nodes_list,
        })
    }

    /// Every link at or above the threshold, with all of its endpoints.
    pub fn full_graph(&self) -> Result<Graph> {
        let mut links: Vec<LinkEdge> = self
            .source
            .all_edges(self.threshold)?
            .into_iter()
            .filter(|e| e.weight >= self.threshold)
            .collect();

        let ids: Vec<i64> = links
            .iter()
            .flat_map(|e| [e.from, e.to])
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let pages = if ids.is_empty() {
            Vec::new()
        } else {
            self.source.nodes_by_ids(&ids)?
        };

        let known: HashSet<i64> = pages.iter().map(|p| p.id).collect();
        links.retain(|e| known.contains(&e.from) && known.contains(&e.to));

        let nodes = pages
            .into_iter()
            .map(|p| GraphNode::from_page(p, NodeRole::Neighbor))
            .collect();
        let edges = links.into_iter().map(GraphEdge::link).collect();

        Ok(Graph { nodes, edges })
    }
}
