use crate::error::{IngestError, Result};
use linkmap_core::AggregationStore;
use linkmap_core::model::NodeObservation;
use serde::{Deserialize, Serialize};

/// One link sighting reported by a crawler: page `url_from` links to
/// `url_to`, seen `cnt` times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkObservation {
    pub url_from: String,
    pub url_from_id: i64,
    pub url_to: String,
    pub url_to_id: i64,
    pub cnt: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_to: Option<String>,
}

impl LinkObservation {
    pub fn parse(line: usize, text: &str) -> Result<Self> {
        let observation: LinkObservation =
            serde_json::from_str(text).map_err(|source| IngestError::Parse { line, source })?;
        observation.validate(line)?;
        Ok(observation)
    }

    pub fn validate(&self, line: usize) -> Result<()> {
        let reason = if self.cnt < 0 {
            Some(format!("negative count {}", self.cnt))
        } else if self.url_from_id <= 0 || self.url_to_id <= 0 {
            Some(format!(
                "node ids must be positive ({} -> {})",
                self.url_from_id, self.url_to_id
            ))
        } else if self.url_from.trim().is_empty() || self.url_to.trim().is_empty() {
            Some("empty url".to_string())
        } else {
            None
        };

        match reason {
            Some(reason) => Err(IngestError::InvalidObservation { line, reason }),
            None => Ok(()),
        }
    }

    /// The target gains the link count; the source is only registered.
    pub fn node_observations(&self) -> [NodeObservation; 2] {
        [
            NodeObservation::new(self.url_to_id, self.url_to.clone(), self.cnt),
            NodeObservation::new(self.url_from_id, self.url_from.clone(), 0),
        ]
    }

    pub fn fold_into(&self, store: &AggregationStore) {
        for observation in self.node_observations() {
            store.upsert(observation);
        }
    }
}
