// src/app/render.rs
//! Plain data the egui layer draws from. Nothing here touches egui, so the
//! grid/overlay contract can be checked without a window.
use crate::app::metadata::{MetadataStore, EMOJI_SONG_PLACEHOLDER, LORE_POEM_PLACEHOLDER};
use crate::app::types::{item_by_id, Item};
use crate::app::view::{Overlay, ViewState};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell<'a> {
    pub item: &'a Item,
    /// The overlay is currently showing this item.
    pub selected: bool,
}

/// One cell per rendered id, in display order.
pub fn visible_cells<'a>(view: &ViewState, items: &'a [Item]) -> Vec<Cell<'a>> {
    let current = view.overlay().current_item();
    view.visible()
        .iter()
        .filter_map(|id| item_by_id(items, *id))
        .map(|item| Cell {
            item,
            selected: current == Some(item.id),
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OverlayContent<'a> {
    Poem {
        item: &'a Item,
        emoji_song: String,
        lore_poem: String,
    },
    Image {
        item: &'a Item,
    },
}

/// What the overlay shows right now, or `None` when it is closed.
pub fn overlay_content<'a>(
    view: &ViewState,
    items: &'a [Item],
    store: &MetadataStore,
) -> Option<OverlayContent<'a>> {
    match view.overlay() {
        Overlay::Closed => None,
        Overlay::Poem(id) => {
            let item = item_by_id(items, id)?;
            let (emoji_song, lore_poem) = match store.get(id) {
                Some(doc) => (doc.emoji_song(), doc.lore_poem()),
                None => (
                    EMOJI_SONG_PLACEHOLDER.to_string(),
                    LORE_POEM_PLACEHOLDER.to_string(),
                ),
            };
            Some(OverlayContent::Poem {
                item,
                emoji_song,
                lore_poem,
            })
        }
        Overlay::Image(id) => item_by_id(items, id).map(|item| OverlayContent::Image { item }),
    }
}

pub fn count_label(view: &ViewState) -> String {
    format!("Showing {} of {}", view.visible().len(), view.total())
}

/// `None` once everything in the filtered set is on screen.
pub fn load_more_label(view: &ViewState) -> Option<String> {
    view.has_more()
        .then(|| format!("Load More ({}/{})", view.visible().len(), view.total()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::gallery::Gallery;
    use crate::app::indexer::tests::items;
    use crate::app::metadata::MetadataDocument;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    #[test]
    fn cells_follow_visible_order_and_mark_selection() {
        let mut g = Gallery::new(items(60));
        let mut r = StdRng::seed_from_u64(0);
        g.render_next_page(&mut r);
        g.open_poem(4, MetadataDocument::new(json!({})));

        let cells = visible_cells(&g.view, g.items());
        assert_eq!(cells.len(), 50);
        assert_eq!(cells[0].item.name, "#1");
        let selected: Vec<usize> = cells
            .iter()
            .filter(|c| c.selected)
            .map(|c| c.item.id)
            .collect();
        assert_eq!(selected, vec![4]);
    }

    #[test]
    fn poem_stage_uses_traits_or_placeholders() {
        let mut g = Gallery::new(items(3));
        g.open_poem(
            1,
            MetadataDocument::new(json!({
                "attributes": [
                    {"trait_type": "Lore Poem", "value": "Under the moon"},
                    {"trait_type": "Emoji Song", "value": "🌕🎶"}
                ]
            })),
        );
        assert_eq!(
            overlay_content(&g.view, g.items(), &g.metadata),
            Some(OverlayContent::Poem {
                item: &g.items()[1],
                emoji_song: "🌕🎶".into(),
                lore_poem: "Under the moon".into(),
            })
        );

        g.open_poem(2, MetadataDocument::new(json!({"attributes": []})));
        match overlay_content(&g.view, g.items(), &g.metadata) {
            Some(OverlayContent::Poem {
                emoji_song,
                lore_poem,
                ..
            }) => {
                assert_eq!(emoji_song, EMOJI_SONG_PLACEHOLDER);
                assert_eq!(lore_poem, LORE_POEM_PLACEHOLDER);
            }
            other => panic!("unexpected overlay {other:?}"),
        }

        g.click_poem_surface();
        assert_eq!(
            overlay_content(&g.view, g.items(), &g.metadata),
            Some(OverlayContent::Image {
                item: &g.items()[2]
            })
        );
        g.close_overlay();
        assert_eq!(overlay_content(&g.view, g.items(), &g.metadata), None);
    }

    #[test]
    fn counters_track_pagination() {
        let mut g = Gallery::new(items(75));
        let mut r = StdRng::seed_from_u64(0);
        g.render_next_page(&mut r);
        assert_eq!(count_label(&g.view), "Showing 50 of 75");
        assert_eq!(load_more_label(&g.view).as_deref(), Some("Load More (50/75)"));
        g.load_more(&mut r);
        assert_eq!(count_label(&g.view), "Showing 75 of 75");
        assert_eq!(load_more_label(&g.view), None);
    }
}
