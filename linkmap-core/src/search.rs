use crate::error::Result;
use crate::model::SearchHit;
use crate::source::LinkSource;
use tracing::debug;

/// Maximum number of hits a search returns.
pub const SEARCH_LIMIT: usize = 5;

/// Bounded substring lookup over page search fields.
pub struct SearchIndex<'a, S: LinkSource + ?Sized> {
    source: &'a S,
    limit: usize,
}

impl<'a, S: LinkSource + ?Sized> SearchIndex<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            limit: SEARCH_LIMIT,
        }
    }

    /// Case-insensitive containment match, ascending id, capped at five.
    /// The text is matched as given, whitespace included. No match is an
    /// empty list.
    pub fn search(&self, text: &str) -> Result<Vec<SearchHit>> {
        let mut hits = self.source.search_nodes(text, self.limit)?;
        hits.sort_by_key(|h| h.id);
        hits.truncate(self.limit);
        debug!("Search {:?} returned {} hits", text, hits.len());
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::tests::MemorySource;

    #[test]
    fn test_search_caps_results_and_orders_by_id() {
        let mut source = MemorySource::default();
        for id in (1..=12).rev() {
            source = source.page(id, &format!("https://x{}.example", id), 1);
        }

        let hits = SearchIndex::new(&source).search("x").unwrap();
        assert_eq!(hits.len(), SEARCH_LIMIT);
        let ids: Vec<i64> = hits.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_search_no_match_is_empty() {
        let source = MemorySource::default().page(1, "https://a.example", 1);
        let hits = SearchIndex::new(&source).search("zzz").unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_search_keeps_surrounding_whitespace() {
        let source = MemorySource::default()
            .page(1, "https://renews.example", 1)
            .page(2, "https://daily news.example", 1);

        let hits = SearchIndex::new(&source).search(" news").unwrap();
        let ids: Vec<i64> = hits.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![2]);
    }
}
