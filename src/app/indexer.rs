// src/app/indexer.rs
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use crate::app::fetch::MetadataFetcher;
use crate::app::search::SearchIndex;
use crate::app::types::{IndexMsg, Item};

/// Only this many items (in manifest order) are ever prefetched for search.
pub const INDEX_PREFIX: usize = 200;
/// Pause after each successful fetch.
pub const INDEX_PACE: Duration = Duration::from_millis(100);
/// Delay between the collection becoming ready and the first indexing pass.
pub const INDEX_START_DELAY: Duration = Duration::from_secs(2);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IndexSummary {
    pub fetched: usize,
    pub failed: usize,
}

/// Items of the capped prefix that are not indexed yet.
pub fn index_candidates(items: &[Item], index: &SearchIndex) -> Vec<Item> {
    items
        .iter()
        .take(INDEX_PREFIX)
        .filter(|item| !index.is_indexed(item.id))
        .cloned()
        .collect()
}

/// Fetch candidates strictly one after another, in order. A failed fetch is
/// logged and skipped; the pass always runs to the end of `candidates` and
/// finishes with `IndexMsg::Done`.
pub fn run_index_pass<F>(
    candidates: &[Item],
    fetcher: &dyn MetadataFetcher,
    pace: Duration,
    mut emit: F,
) -> IndexSummary
where
    F: FnMut(IndexMsg),
{
    let mut summary = IndexSummary::default();
    for item in candidates {
        match fetcher.fetch(item) {
            Ok(metadata) => {
                summary.fetched += 1;
                emit(IndexMsg::Indexed {
                    id: item.id,
                    metadata,
                });
                if !pace.is_zero() {
                    thread::sleep(pace);
                }
            }
            Err(err) => {
                summary.failed += 1;
                warn!("Error indexing item {}: {err}", item.id);
                emit(IndexMsg::Failed {
                    id: item.id,
                    error: err.to_string(),
                });
            }
        }
    }
    emit(IndexMsg::Done(summary));
    summary
}

/// Single-run guard around a paced indexing thread. Starting while a pass is
/// still running is a no-op, not a queue.
#[derive(Default)]
pub struct BackgroundIndexer {
    is_indexing: bool,
    rx: Option<Receiver<IndexMsg>>,
}

impl BackgroundIndexer {
    pub fn is_indexing(&self) -> bool {
        self.is_indexing
    }

    pub fn start(&mut self, candidates: Vec<Item>, fetcher: Arc<dyn MetadataFetcher>) -> bool {
        self.start_paced(candidates, fetcher, INDEX_PACE)
    }

    pub fn start_paced(
        &mut self,
        candidates: Vec<Item>,
        fetcher: Arc<dyn MetadataFetcher>,
        pace: Duration,
    ) -> bool {
        if self.is_indexing {
            return false;
        }
        self.is_indexing = true;
        info!("Starting background indexing for {} items", candidates.len());

        let (tx, rx) = mpsc::channel::<IndexMsg>();
        self.rx = Some(rx);
        thread::spawn(move || {
            run_index_pass(&candidates, fetcher.as_ref(), pace, |msg| {
                let _ = tx.send(msg);
            });
        });
        true
    }

    /// Drain up to `max` finished items. Clears the guard when the pass ends.
    pub fn drain(&mut self, max: usize) -> Vec<IndexMsg> {
        let mut out = Vec::new();
        while out.len() < max {
            let Some(rx) = &self.rx else {
                break;
            };
            match rx.try_recv() {
                Ok(IndexMsg::Done(summary)) => {
                    self.finish();
                    out.push(IndexMsg::Done(summary));
                }
                Ok(msg) => out.push(msg),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("Indexing thread ended without a summary");
                    self.finish();
                }
            }
        }
        out
    }

    fn finish(&mut self) {
        self.is_indexing = false;
        self.rx = None;
    }
}
