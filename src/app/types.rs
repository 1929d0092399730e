// src/app/types.rs
use std::path::PathBuf;
use std::time::Instant;

use crate::app::indexer::IndexSummary;
use crate::app::metadata::MetadataDocument;

// ---- collection data ----

/// One collection entry: row `id` of the images manifest joined with row `id`
/// of the metadata manifest. Never mutated after the manifest load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    pub id: usize,
    pub name: String,
    pub image_url: String,
    pub metadata_url: String,
}

/// Items are kept in ascending id order (ids may have gaps where rows were dropped).
pub fn item_by_id(items: &[Item], id: usize) -> Option<&Item> {
    items
        .binary_search_by_key(&id, |it| it.id)
        .ok()
        .map(|pos| &items[pos])
}

// ---- cross-thread messages ----
pub enum ManifestMsg {
    Info(String),
    Done(Vec<Item>),
    Error(String),
}

pub enum IndexMsg {
    Indexed { id: usize, metadata: MetadataDocument },
    Failed { id: usize, error: String },
    Done(IndexSummary),
}

pub struct OverlayFetched {
    pub id: usize,
    pub result: Result<MetadataDocument, String>,
}

pub struct ThumbDone {
    pub key: String,
    pub result: Result<PathBuf, String>,
}

// ---- app phases / states ----
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootPhase {
    Loading,
    Ready,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThumbState {
    Pending, // queued or downloading
    Cached,  // file present on disk (ready to upload)
    Ready,   // texture uploaded
    Failed,  // permanent failure for this run
}

/// Short-lived status line (overlay fetch failures).
pub struct Toast {
    pub text: String,
    pub until: Instant,
}

impl Toast {
    pub fn is_live(&self, now: Instant) -> bool {
        now < self.until
    }
}
