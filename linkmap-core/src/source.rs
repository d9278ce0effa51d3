use crate::error::Result;
use crate::model::{LinkEdge, PageNode, SearchHit};

/// Read-side query contract over the stored link graph.
///
/// `Database` answers these from SQLite; tests answer them from memory.
pub trait LinkSource {
    fn node_by_label(&self, label: &str) -> Result<Option<PageNode>>;

    fn node_by_id(&self, id: i64) -> Result<Option<PageNode>>;

    /// Pages for the given ids, in ascending id order. Unknown ids are skipped.
    fn nodes_by_ids(&self, ids: &[i64]) -> Result<Vec<PageNode>>;

    /// Links whose `from` endpoint is one of `ids` and whose weight is at
    /// least `min_weight`.
    fn edges_from(&self, ids: &[i64], min_weight: i32) -> Result<Vec<LinkEdge>>;

    fn all_edges(&self, min_weight: i32) -> Result<Vec<LinkEdge>>;

    /// Case-insensitive containment match on the searchable field,
    /// ascending id, at most `limit` rows.
    fn search_nodes(&self, needle: &str, limit: usize) -> Result<Vec<SearchHit>>;
}
