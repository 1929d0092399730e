// src/app/gallery.rs
use std::sync::Arc;

use rand::Rng;
use tracing::info;

use crate::app::metadata::{MetadataDocument, MetadataStore};
use crate::app::search::SearchIndex;
use crate::app::types::{item_by_id, IndexMsg, Item};
use crate::app::view::{Filter, Overlay, ViewState};

/// Result of a grid click on the overlay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemClick {
    /// The overlay moved to its next state.
    Applied(Overlay),
    /// The poem stage needs this item's metadata first.
    NeedsMetadata(usize),
}

/// The application context: the immutable item list plus the two caches and
/// the view state derived from them. Passed explicitly; there is no global.
pub struct Gallery {
    items: Arc<[Item]>,
    pub metadata: MetadataStore,
    pub index: SearchIndex,
    pub view: ViewState,
}

impl Default for Gallery {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Gallery {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items: Arc::from(items),
            metadata: MetadataStore::default(),
            index: SearchIndex::default(),
            view: ViewState::default(),
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item(&self, id: usize) -> Option<&Item> {
        item_by_id(&self.items, id)
    }

    /// Cache a fetched document and index it. Safe to repeat for the same id.
    pub fn ingest_metadata(&mut self, id: usize, doc: MetadataDocument) {
        self.index.index_one(id, &doc);
        self.metadata.insert(id, doc);
    }

    pub fn apply_index_msg(&mut self, msg: IndexMsg) {
        match msg {
            IndexMsg::Indexed { id, metadata } => self.ingest_metadata(id, metadata),
            IndexMsg::Failed { .. } => {}
            IndexMsg::Done(summary) => info!(
                "Background indexing complete: {} fetched, {} failed, {} items searchable",
                summary.fetched,
                summary.failed,
                self.index.len()
            ),
        }
    }

    pub fn render_next_page<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        self.view.render_next_page(&self.items, &self.index, rng)
    }

    /// New search term: reset pagination and paint the first page.
    pub fn apply_search<R: Rng + ?Sized>(&mut self, raw: &str, rng: &mut R) -> bool {
        if !self.view.set_search_term(raw) {
            return false;
        }
        self.render_next_page(rng);
        true
    }

    pub fn apply_filter<R: Rng + ?Sized>(&mut self, filter: Filter, rng: &mut R) -> bool {
        if !self.view.set_filter(filter) {
            return false;
        }
        self.render_next_page(rng);
        true
    }

    /// "Load more": no-op while something is loading or nothing is left.
    pub fn load_more<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if !self.view.can_load_more() {
            return false;
        }
        self.render_next_page(rng);
        true
    }

    pub fn click_item(&mut self, id: usize) -> ItemClick {
        let next = self.view.overlay().after_item_click(id);
        if let Overlay::Poem(target) = next {
            if !self.metadata.contains(target) {
                return ItemClick::NeedsMetadata(target);
            }
        }
        self.view.set_overlay(next);
        ItemClick::Applied(next)
    }

    /// Metadata for a pending poem arrived.
    pub fn open_poem(&mut self, id: usize, doc: MetadataDocument) {
        self.ingest_metadata(id, doc);
        self.view.set_overlay(Overlay::Poem(id));
    }

    pub fn click_poem_surface(&mut self) {
        let next = self.view.overlay().after_poem_click();
        self.view.set_overlay(next);
    }

    pub fn click_image_surface(&mut self) {
        let next = self.view.overlay().after_image_click();
        self.view.set_overlay(next);
    }

    pub fn close_overlay(&mut self) {
        self.view.close_overlay();
    }
}
