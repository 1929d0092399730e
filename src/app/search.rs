// src/app/search.rs
use std::collections::HashMap;

use tracing::{debug, warn};

use crate::app::metadata::MetadataDocument;
use crate::error::GalleryError;

pub struct SearchIndexEntry {
    pub id: usize,
    pub searchable_text: String,
    pub metadata: MetadataDocument,
}

/// Lowercased blob per item: attribute trait/value pairs in document order,
/// then the name, then the description, joined by single spaces.
pub fn searchable_text(doc: &MetadataDocument) -> Result<String, GalleryError> {
    let mut parts: Vec<String> = Vec::new();
    for attr in doc.attributes()? {
        parts.push(attr.trait_type.to_lowercase());
        parts.push(attr.value.to_lowercase());
    }
    if let Some(name) = doc.name()? {
        parts.push(name.to_lowercase());
    }
    if let Some(description) = doc.description()? {
        parts.push(description.to_lowercase());
    }
    Ok(parts.join(" ").trim().to_string())
}

/// Client-side substring index. A missing entry means "not indexed yet",
/// never "no match".
#[derive(Default)]
pub struct SearchIndex {
    entries: HashMap<usize, SearchIndexEntry>,
}

impl SearchIndex {
    /// Index (or re-index) one item. Malformed metadata is logged and the item
    /// stays unindexed; the caller never sees the error.
    pub fn index_one(&mut self, id: usize, metadata: &MetadataDocument) -> bool {
        match searchable_text(metadata) {
            Ok(text) => {
                debug!("indexed item {id} ({} chars)", text.len());
                self.entries.insert(
                    id,
                    SearchIndexEntry {
                        id,
                        searchable_text: text,
                        metadata: metadata.clone(),
                    },
                );
                true
            }
            Err(err) => {
                warn!("Error indexing metadata for item {id}: {err}");
                false
            }
        }
    }

    pub fn is_indexed(&self, id: usize) -> bool {
        self.entries.contains_key(&id)
    }

    /// `term` must already be lowercased.
    pub fn contains(&self, id: usize, term: &str) -> bool {
        self.entries
            .get(&id)
            .is_some_and(|entry| entry.searchable_text.contains(term))
    }

    pub fn entry(&self, id: usize) -> Option<&SearchIndexEntry> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: serde_json::Value) -> MetadataDocument {
        MetadataDocument::new(v)
    }

    #[test]
    fn blob_order_is_attributes_then_name_then_description() {
        let d = doc(json!({
            "description": "Born at MIDNIGHT",
            "name": "Midnight Ape #7",
            "attributes": [
                {"trait_type": "Background", "value": "Gold"},
                {"trait_type": "Level", "value": 3}
            ]
        }));
        assert_eq!(
            searchable_text(&d).unwrap(),
            "background gold level 3 midnight ape #7 born at midnight"
        );
    }

    #[test]
    fn indexing_twice_gives_identical_text() {
        let d = doc(json!({
            "name": "Ape",
            "attributes": [{"trait_type": "Fur", "value": "Silver"}]
        }));
        let mut index = SearchIndex::default();
        assert!(index.index_one(1, &d));
        let first = index.entry(1).unwrap().searchable_text.clone();
        assert!(index.index_one(1, &d));
        assert_eq!(index.entry(1).unwrap().searchable_text, first);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn contains_matches_substrings_of_indexed_items_only() {
        let mut index = SearchIndex::default();
        index.index_one(
            2,
            &doc(json!({"attributes": [{"trait_type": "Background", "value": "Gold"}]})),
        );
        assert!(index.contains(2, "gold"));
        assert!(index.contains(2, "ground go"));
        assert!(!index.contains(2, "silver"));
        assert!(!index.contains(3, "gold"));
        assert!(!index.is_indexed(3));
    }

    #[test]
    fn malformed_metadata_leaves_item_unindexed() {
        let mut index = SearchIndex::default();
        assert!(!index.index_one(9, &doc(json!({"attributes": 17}))));
        assert!(!index.index_one(9, &doc(json!({"description": ["x"]}))));
        assert!(!index.is_indexed(9));
        assert!(index.is_empty());
    }

    #[test]
    fn empty_document_indexes_to_empty_blob() {
        let mut index = SearchIndex::default();
        assert!(index.index_one(0, &doc(json!({}))));
        assert_eq!(index.entry(0).unwrap().searchable_text, "");
        assert!(index.contains(0, ""));
    }

    #[test]
    fn zero_and_false_traits_stay_out_of_the_blob() {
        let d = doc(json!({
            "attributes": [
                {"trait_type": "Level", "value": 0},
                {"trait_type": "Rare", "value": false}
            ]
        }));
        assert_eq!(searchable_text(&d).unwrap(), "");
        let mut index = SearchIndex::default();
        assert!(index.index_one(5, &d));
        assert!(!index.contains(5, "level"));
    }
}
