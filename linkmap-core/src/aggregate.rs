// In-memory aggregation of crawler node observations

use crate::model::{AggregatedNode, GraphNode, NodeObservation, NodeRole};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::trace;

/// Concurrent map from node id to its accumulated weight.
///
/// Every operation runs inside one store-wide critical section, so a
/// reader never observes a half-applied merge. Construct one per process
/// and share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct AggregationStore {
    nodes: Mutex<HashMap<i64, AggregatedNode>>,
}

impl AggregationStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave a merge half-written,
    // so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<i64, AggregatedNode>> {
        self.nodes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts the node or adds the observed weight to it. The label of
    /// the first observation is kept.
    pub fn upsert(&self, observation: NodeObservation) {
        let mut nodes = self.lock();
        match nodes.get_mut(&observation.node_id) {
            Some(existing) => {
                existing.total_weight = existing.total_weight.saturating_add(observation.weight);
                trace!(
                    "Merged node {} (+{} = {})",
                    observation.node_id, observation.weight, existing.total_weight
                );
            }
            None => {
                trace!(
                    "New node {} with weight {}",
                    observation.node_id, observation.weight
                );
                nodes.insert(
                    observation.node_id,
                    AggregatedNode {
                        node_id: observation.node_id,
                        label: observation.label,
                        total_weight: observation.weight,
                    },
                );
            }
        }
    }

    pub fn get(&self, node_id: i64) -> Option<AggregatedNode> {
        self.lock().get(&node_id).cloned()
    }

    /// Materializes every node. Nodes whose label equals `highlight` get
    /// the `Match` role, all others `Neighbor`. Order is unspecified.
    pub fn snapshot(&self, highlight: Option<&str>) -> Vec<GraphNode> {
        self.lock()
            .values()
            .map(|node| {
                let role = match highlight {
                    Some(query) if node.label == query => NodeRole::Match,
                    _ => NodeRole::Neighbor,
                };
                GraphNode {
                    id: node.node_id,
                    label: node.label.clone(),
                    title: node.label.clone(),
                    role,
                    weight: node.total_weight,
                }
            })
            .collect()
    }

    /// Copies out every aggregated node, sorted by id.
    pub fn entries(&self) -> Vec<AggregatedNode> {
        let mut entries: Vec<AggregatedNode> = self.lock().values().cloned().collect();
        entries.sort_by_key(|n| n.node_id);
        entries
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
