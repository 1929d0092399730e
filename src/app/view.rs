// src/app/view.rs
//! What is visible right now: filter + search term decide the filtered set,
//! the page cursor decides how much of it has been rendered, and the overlay
//! tracks which item (if any) is open and at which stage.
use rand::seq::SliceRandom;
use rand::Rng;

use crate::app::search::SearchIndex;
use crate::app::types::Item;

pub const PAGE_SIZE: usize = 50;
pub const RANDOM_SAMPLE_MAX: usize = 100;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Filter {
    #[default]
    All,
    Random,
}

impl Filter {
    pub const ALL: [Self; 2] = [Self::All, Self::Random];

    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Random => "Random 100",
        }
    }
}

/// Overlay stage. The open variants carry the current item, so "open iff an
/// item is selected" cannot be violated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Overlay {
    #[default]
    Closed,
    Poem(usize),
    Image(usize),
}

impl Overlay {
    pub const fn current_item(self) -> Option<usize> {
        match self {
            Self::Closed => None,
            Self::Poem(id) | Self::Image(id) => Some(id),
        }
    }

    /// Grid click: the same item cycles poem -> image -> closed; any other
    /// item (re)starts at its poem.
    pub fn after_item_click(self, id: usize) -> Self {
        match self {
            Self::Poem(cur) if cur == id => Self::Image(id),
            Self::Image(cur) if cur == id => Self::Closed,
            _ => Self::Poem(id),
        }
    }

    pub fn after_poem_click(self) -> Self {
        match self {
            Self::Poem(id) => Self::Image(id),
            other => other,
        }
    }

    pub fn after_image_click(self) -> Self {
        match self {
            Self::Image(_) => Self::Closed,
            other => other,
        }
    }
}

/// Name or id match first; the search index only decides for items it has
/// already seen. `term` is lowercased and non-empty.
pub fn matches_search(item: &Item, index: &SearchIndex, term: &str) -> bool {
    item.name.to_lowercase().contains(term)
        || item.id.to_string().contains(term)
        || index.contains(item.id, term)
}

/// Ids of the items the current filter/search admits, in display order.
/// `Random` reshuffles on every call.
pub fn filtered_items<R: Rng + ?Sized>(
    items: &[Item],
    index: &SearchIndex,
    filter: Filter,
    term: &str,
    rng: &mut R,
) -> Vec<usize> {
    let mut ids: Vec<usize> = if term.is_empty() {
        items.iter().map(|it| it.id).collect()
    } else {
        items
            .iter()
            .filter(|it| matches_search(it, index, term))
            .map(|it| it.id)
            .collect()
    };

    if filter == Filter::Random {
        ids.shuffle(rng);
        ids.truncate(RANDOM_SAMPLE_MAX);
    }
    ids
}

#[derive(Default)]
pub struct ViewState {
    filter: Filter,
    search_term: String,
    page_cursor: usize,
    visible: Vec<usize>,
    total: usize,
    // Filtered ids frozen when the session (filter/search) started; every
    // page is cut from it.
    session: Option<Vec<usize>>,
    loading: bool,
    overlay: Overlay,
}

impl ViewState {
    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn page_cursor(&self) -> usize {
        self.page_cursor
    }

    /// Ids rendered so far, in order.
    pub fn visible(&self) -> &[usize] {
        &self.visible
    }

    /// Size of the filtered set as of the last rendered page.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn has_more(&self) -> bool {
        self.visible.len() < self.total
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn can_load_more(&self) -> bool {
        !self.loading && self.has_more()
    }

    pub fn overlay(&self) -> Overlay {
        self.overlay
    }

    pub fn set_overlay(&mut self, overlay: Overlay) {
        self.overlay = overlay;
    }

    pub fn close_overlay(&mut self) {
        self.overlay = Overlay::Closed;
    }

    /// Applies a raw search string (trimmed + lowercased). Returns true when
    /// the term changed and pagination was reset.
    pub fn set_search_term(&mut self, raw: &str) -> bool {
        let term = raw.trim().to_lowercase();
        if term == self.search_term {
            return false;
        }
        self.search_term = term;
        self.reset_pages();
        true
    }

    pub fn set_filter(&mut self, filter: Filter) -> bool {
        if filter == self.filter {
            return false;
        }
        self.filter = filter;
        self.reset_pages();
        true
    }

    fn reset_pages(&mut self) {
        self.page_cursor = 0;
        self.visible.clear();
        self.total = 0;
        self.session = None;
    }

    /// Append the page at the cursor to the visible set and advance the cursor.
    /// Returns how many ids were appended.
    pub fn render_page(&mut self, filtered: &[usize]) -> usize {
        if self.page_cursor == 0 {
            self.visible.clear();
        }
        let start = (self.page_cursor * PAGE_SIZE).min(filtered.len());
        let end = (start + PAGE_SIZE).min(filtered.len());
        self.visible.extend_from_slice(&filtered[start..end]);
        self.page_cursor += 1;
        self.total = filtered.len();
        end - start
    }

    /// Render the next page of the session's filtered set, computing (and
    /// freezing) that set on the first page.
    pub fn render_next_page<R: Rng + ?Sized>(
        &mut self,
        items: &[Item],
        index: &SearchIndex,
        rng: &mut R,
    ) -> usize {
        let filtered = match self.session.take() {
            Some(ids) => ids,
            None => filtered_items(items, index, self.filter, &self.search_term, rng),
        };
        let added = self.render_page(&filtered);
        self.session = Some(filtered);
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::metadata::MetadataDocument;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;
    use std::collections::HashSet;

    fn items(n: usize) -> Vec<Item> {
        (0..n)
            .map(|id| Item {
                id,
                name: format!("#{}", id + 1),
                image_url: format!("https://x/{id}.png"),
                metadata_url: format!("https://x/{id}.json"),
            })
            .collect()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn search_hits_name_id_or_index_only() {
        let items = items(300);
        let mut index = SearchIndex::default();
        index.index_one(
            250,
            &MetadataDocument::new(json!({
                "attributes": [{"trait_type": "Background", "value": "Gold"}]
            })),
        );

        let gold = filtered_items(&items, &index, Filter::All, "gold", &mut rng());
        assert_eq!(gold, vec![250]);

        // "#12" by name; ids containing "12" by id string
        let twelve = filtered_items(&items, &index, Filter::All, "12", &mut rng());
        for id in &twelve {
            let it = &items[*id];
            assert!(it.name.contains("12") || it.id.to_string().contains("12"));
        }
        assert!(twelve.contains(&11)); // name "#12"
        assert!(twelve.contains(&12)); // id "12"
        assert!(twelve.contains(&120));

        // unindexed + no name/id match => excluded
        assert!(filtered_items(&items, &index, Filter::All, "silver", &mut rng()).is_empty());
    }

    #[test]
    fn empty_term_keeps_everything_in_order() {
        let items = items(7);
        let ids = filtered_items(&items, &SearchIndex::default(), Filter::All, "", &mut rng());
        assert_eq!(ids, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn random_filter_is_a_bounded_subset() {
        let index = SearchIndex::default();
        let big = items(430);
        let sample = filtered_items(&big, &index, Filter::Random, "", &mut rng());
        assert_eq!(sample.len(), RANDOM_SAMPLE_MAX);
        let unique: HashSet<_> = sample.iter().collect();
        assert_eq!(unique.len(), RANDOM_SAMPLE_MAX);
        assert!(sample.iter().all(|id| *id < 430));

        let small = items(30);
        let sample = filtered_items(&small, &index, Filter::Random, "", &mut rng());
        assert_eq!(sample.len(), 30);

        let pre_cut: HashSet<usize> = filtered_items(&big, &index, Filter::All, "1", &mut rng())
            .into_iter()
            .collect();
        let cut = filtered_items(&big, &index, Filter::Random, "1", &mut rng());
        assert_eq!(cut.len(), pre_cut.len().min(RANDOM_SAMPLE_MAX));
        assert!(cut.iter().all(|id| pre_cut.contains(id)));
    }

    #[test]
    fn pages_concatenate_to_the_filtered_set() {
        let items = items(137);
        let index = SearchIndex::default();
        let mut view = ViewState::default();
        let mut r = rng();

        assert_eq!(view.render_next_page(&items, &index, &mut r), 50);
        assert!(view.has_more());
        assert_eq!(view.render_next_page(&items, &index, &mut r), 50);
        assert_eq!(view.render_next_page(&items, &index, &mut r), 37);
        assert!(!view.has_more());
        assert_eq!(view.page_cursor(), 3);
        assert_eq!(view.visible(), (0..137).collect::<Vec<_>>().as_slice());
        assert_eq!(view.total(), 137);
    }

    #[test]
    fn random_session_pages_never_repeat() {
        let items = items(500);
        let index = SearchIndex::default();
        let mut view = ViewState::default();
        let mut r = rng();
        view.set_filter(Filter::Random);
        view.render_next_page(&items, &index, &mut r);
        view.render_next_page(&items, &index, &mut r);
        assert_eq!(view.visible().len(), RANDOM_SAMPLE_MAX);
        let unique: HashSet<_> = view.visible().iter().collect();
        assert_eq!(unique.len(), RANDOM_SAMPLE_MAX);
        assert!(!view.has_more());
    }

    #[test]
    fn search_or_filter_change_resets_cursor() {
        let items = items(120);
        let index = SearchIndex::default();
        let mut view = ViewState::default();
        let mut r = rng();
        view.render_next_page(&items, &index, &mut r);
        view.render_next_page(&items, &index, &mut r);
        assert_eq!(view.page_cursor(), 2);

        assert!(view.set_search_term("  #1 "));
        assert_eq!(view.search_term(), "#1");
        assert_eq!(view.page_cursor(), 0);
        assert!(view.visible().is_empty());
        assert!(!view.set_search_term("#1"));

        view.render_next_page(&items, &index, &mut r);
        assert!(view.set_filter(Filter::Random));
        assert_eq!(view.page_cursor(), 0);
        assert!(view.visible().is_empty());
        assert!(!view.set_filter(Filter::Random));
    }

    #[test]
    fn load_more_is_blocked_while_loading() {
        let items = items(60);
        let index = SearchIndex::default();
        let mut view = ViewState::default();
        view.render_next_page(&items, &index, &mut rng());
        assert!(view.can_load_more());
        view.set_loading(true);
        assert!(!view.can_load_more());
    }

    #[test]
    fn overlay_click_cycle() {
        let o = Overlay::Closed;
        let o = o.after_item_click(3);
        assert_eq!(o, Overlay::Poem(3));
        let o = o.after_item_click(3);
        assert_eq!(o, Overlay::Image(3));
        let o = o.after_item_click(3);
        assert_eq!(o, Overlay::Closed);
        assert_eq!(o.current_item(), None);

        assert_eq!(Overlay::Poem(3).after_item_click(4), Overlay::Poem(4));
        assert_eq!(Overlay::Image(3).after_item_click(4), Overlay::Poem(4));
    }

    #[test]
    fn overlay_surface_clicks() {
        assert_eq!(Overlay::Poem(1).after_poem_click(), Overlay::Image(1));
        assert_eq!(Overlay::Image(1).after_poem_click(), Overlay::Image(1));
        assert_eq!(Overlay::Image(1).after_image_click(), Overlay::Closed);
        assert_eq!(Overlay::Poem(1).after_image_click(), Overlay::Poem(1));
        assert_eq!(Overlay::Closed.after_poem_click(), Overlay::Closed);
    }
}
