use crate::error::{IngestError, Result};
use crate::observation::LinkObservation;
use futures::future::try_join_all;
use linkmap_core::AggregationStore;
use linkmap_core::data::{Database, PageRecord};
use linkmap_core::model::LinkEdge;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Called with the worker id and the target url of each accepted line.
pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

type WorkQueue = Mutex<VecDeque<(usize, String)>>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub accepted: usize,
    pub rejected: usize,
    pub nodes: usize,
    pub edges: usize,
}

/// Aggregated result of one feed, ready to be stored.
#[derive(Debug, Clone, Default)]
pub struct IngestOutcome {
    pub summary: IngestSummary,
    pub pages: Vec<PageRecord>,
    pub edges: Vec<LinkEdge>,
}

impl IngestOutcome {
    pub fn persist(&self, db: &Database) -> Result<()> {
        db.apply_ingest(&self.pages, &self.edges)?;
        Ok(())
    }
}

/// Folds link observations into an [`AggregationStore`] and an additive
/// edge accumulator using a fixed pool of tokio workers.
pub struct IngestPipeline {
    store: Arc<AggregationStore>,
    edges: Arc<Mutex<HashMap<(i64, i64), i32>>>,
    titles: Arc<Mutex<HashMap<i64, String>>>,
    accepted: Arc<AtomicUsize>,
    rejected: Arc<AtomicUsize>,
    progress_callback: Option<ProgressCallback>,
}

impl IngestPipeline {
    pub fn new() -> Self {
        Self {
            store: Arc::new(AggregationStore::new()),
            edges: Arc::new(Mutex::new(HashMap::new())),
            titles: Arc::new(Mutex::new(HashMap::new())),
            accepted: Arc::new(AtomicUsize::new(0)),
            rejected: Arc::new(AtomicUsize::new(0)),
            progress_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn store(&self) -> Arc<AggregationStore> {
        self.store.clone()
    }

    pub async fn ingest_file(&self, path: &Path, workers: usize) -> Result<IngestOutcome> {
        let file = File::open(path).await?;
        let mut reader = BufReader::new(file).lines();
        let mut lines = Vec::new();
        while let Some(line) = reader.next_line().await? {
            lines.push(line);
        }
        info!("Read {} lines from {}", lines.len(), path.display());
        self.ingest_lines(lines, workers).await
    }

    pub async fn ingest_lines(&self, lines: Vec<String>, workers: usize) -> Result<IngestOutcome> {
        let workers = workers.max(1);
        info!("Ingesting {} lines with {} workers", lines.len(), workers);

        // Line numbers are 1-based; blank lines are skipped but still counted
        let worker_queues: Arc<Vec<WorkQueue>> =
            Arc::new((0..workers).map(|_| Mutex::new(VecDeque::new())).collect());
        let mut target_worker = 0;
        for (idx, line) in lines.into_iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            worker_queues[target_worker]
                .lock()
                .await
                .push_back((idx + 1, line));
            target_worker = (target_worker + 1) % workers;
        }

        let mut worker_handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let queues = worker_queues.clone();
            let store = self.store.clone();
            let edges = self.edges.clone();
            let titles = self.titles.clone();
            let accepted = self.accepted.clone();
            let rejected = self.rejected.clone();
            let progress_cb = self.progress_callback.clone();

            worker_handles.push(tokio::spawn(async move {
                debug!("Worker {} started", worker_id);
                loop {
                    let work_item = queues[worker_id].lock().await.pop_front();
                    let Some((line_no, text)) = work_item else {
                        break;
                    };

                    let observation = match LinkObservation::parse(line_no, &text) {
                        Ok(observation) => observation,
                        Err(e) => {
                            warn!("{}", e);
                            rejected.fetch_add(1, Ordering::Relaxed);
                            continue;
                        }
                    };

                    observation.fold_into(&store);
                    {
                        let mut edges = edges.lock().await;
                        let weight = edges
                            .entry((observation.url_from_id, observation.url_to_id))
                            .or_insert(0);
                        *weight = weight.saturating_add(observation.cnt);
                    }
                    if let Some(title) = observation.title_to.as_ref().filter(|t| !t.trim().is_empty()) {
                        titles
                            .lock()
                            .await
                            .entry(observation.url_to_id)
                            .or_insert_with(|| title.clone());
                    }
                    accepted.fetch_add(1, Ordering::Relaxed);

                    if let Some(ref callback) = progress_cb {
                        callback(worker_id, observation.url_to.clone());
                    }
                }
                debug!("Worker {} finished", worker_id);
            }));
        }

        try_join_all(worker_handles).await.map_err(IngestError::Join)?;

        let outcome = self.outcome().await;
        info!(
            "Ingest complete: {} accepted, {} rejected, {} nodes, {} edges",
            outcome.summary.accepted,
            outcome.summary.rejected,
            outcome.summary.nodes,
            outcome.summary.edges
        );
        Ok(outcome)
    }

    async fn outcome(&self) -> IngestOutcome {
        let titles = self.titles.lock().await;
        let pages: Vec<PageRecord> = self
            .store
            .entries()
            .into_iter()
            .map(|node| PageRecord {
                id: node.node_id,
                title: titles.get(&node.node_id).cloned(),
                url: node.label,
                weight: node.total_weight,
            })
            .collect();

        let mut edges: Vec<LinkEdge> = self
            .edges
            .lock()
            .await
            .iter()
            .map(|(&(from, to), &weight)| LinkEdge { from, to, weight })
            .collect();
        edges.sort_by_key(|e| (e.from, e.to));

        IngestOutcome {
            summary: IngestSummary {
                accepted: self.accepted.load(Ordering::Relaxed),
                rejected: self.rejected.load(Ordering::Relaxed),
                nodes: pages.len(),
                edges: edges.len(),
            },
            pages,
            edges,
        }
    }
}

impl Default for IngestPipeline {
    fn default() -> Self {
        Self::new()
    }
}
