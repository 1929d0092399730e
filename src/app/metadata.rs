// src/app/metadata.rs
use std::collections::HashMap;

use serde_json::Value;

use crate::error::GalleryError;

pub const LORE_POEM_TRAIT: &str = "Lore Poem";
pub const EMOJI_SONG_TRAIT: &str = "Emoji Song";
pub const LORE_POEM_PLACEHOLDER: &str = "No lore poem available for this Midnight Ape.";
pub const EMOJI_SONG_PLACEHOLDER: &str = "🌑🦧✨";

/// Per-item metadata JSON as served by the content store. Kept opaque; the
/// accessors below only look at `name`, `description` and `attributes`.
#[derive(Clone, Debug, PartialEq)]
pub struct MetadataDocument(Value);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub trait_type: String,
    pub value: String,
}

impl MetadataDocument {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes).map(Self)
    }

    fn root(&self) -> Result<&serde_json::Map<String, Value>, GalleryError> {
        self.0
            .as_object()
            .ok_or_else(|| GalleryError::Malformed("document root is not an object".into()))
    }

    fn text_field(&self, key: &str) -> Result<Option<&str>, GalleryError> {
        match self.root()?.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(GalleryError::Malformed(format!(
                "`{key}` is not a string: {other}"
            ))),
        }
    }

    pub fn name(&self) -> Result<Option<&str>, GalleryError> {
        self.text_field("name")
    }

    pub fn description(&self) -> Result<Option<&str>, GalleryError> {
        self.text_field("description")
    }

    /// Attributes in document order, keeping only those where both the trait
    /// name and the value are present.
    pub fn attributes(&self) -> Result<Vec<Attribute>, GalleryError> {
        let list = match self.root()?.get("attributes") {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Array(list)) => list,
            Some(_) => return Err(GalleryError::Malformed("`attributes` is not a list".into())),
        };

        let mut out = Vec::with_capacity(list.len());
        for (pos, entry) in list.iter().enumerate() {
            let Some(obj) = entry.as_object() else {
                return Err(GalleryError::Malformed(format!(
                    "attribute #{pos} is not an object"
                )));
            };
            let trait_type = match obj.get("trait_type") {
                None | Some(Value::Null) => continue,
                Some(Value::String(s)) if s.is_empty() => continue,
                Some(Value::String(s)) => s.clone(),
                Some(other) => {
                    return Err(GalleryError::Malformed(format!(
                        "attribute #{pos} trait_type is not a string: {other}"
                    )))
                }
            };
            let Some(value) = obj.get("value").and_then(scalar_text) else {
                continue;
            };
            out.push(Attribute { trait_type, value });
        }
        Ok(out)
    }

    /// First value for `trait_type`, read leniently (overlay display never fails).
    pub fn trait_value(&self, trait_type: &str) -> Option<String> {
        self.0
            .get("attributes")?
            .as_array()?
            .iter()
            .find(|attr| attr.get("trait_type").and_then(Value::as_str) == Some(trait_type))
            .and_then(|attr| attr.get("value"))
            .and_then(scalar_text)
    }

    pub fn lore_poem(&self) -> String {
        self.trait_value(LORE_POEM_TRAIT)
            .unwrap_or_else(|| LORE_POEM_PLACEHOLDER.to_string())
    }

    pub fn emoji_song(&self) -> String {
        self.trait_value(EMOJI_SONG_TRAIT)
            .unwrap_or_else(|| EMOJI_SONG_PLACEHOLDER.to_string())
    }
}

/// Falsy values (null, "", 0, false) count as absent.
fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

/// Append-only cache of fetched documents keyed by item id. No eviction: the
/// collection is immutable, so a cached document never goes stale.
#[derive(Default)]
pub struct MetadataStore {
    docs: HashMap<usize, MetadataDocument>,
}

impl MetadataStore {
    pub fn get(&self, id: usize) -> Option<&MetadataDocument> {
        self.docs.get(&id)
    }

    pub fn contains(&self, id: usize) -> bool {
        self.docs.contains_key(&id)
    }

    /// Last write wins; returns true when the id was not cached before.
    pub fn insert(&mut self, id: usize, doc: MetadataDocument) -> bool {
        self.docs.insert(id, doc).is_none()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_poem_and_song() {
        let doc = MetadataDocument::new(json!({
            "name": "Midnight Ape #12",
            "attributes": [
                {"trait_type": "Background", "value": "Gold"},
                {"trait_type": "Lore Poem", "value": "Under a moonless sky"},
                {"trait_type": "Emoji Song", "value": "🌙🎶"}
            ]
        }));
        assert_eq!(doc.lore_poem(), "Under a moonless sky");
        assert_eq!(doc.emoji_song(), "🌙🎶");
    }

    #[test]
    fn placeholders_when_traits_missing() {
        let doc = MetadataDocument::new(json!({"name": "Midnight Ape #3"}));
        assert_eq!(doc.lore_poem(), LORE_POEM_PLACEHOLDER);
        assert_eq!(doc.emoji_song(), EMOJI_SONG_PLACEHOLDER);

        let odd = MetadataDocument::new(json!({"attributes": "not a list"}));
        assert_eq!(odd.lore_poem(), LORE_POEM_PLACEHOLDER);
    }

    #[test]
    fn attributes_keep_order_and_skip_incomplete_entries() {
        let doc = MetadataDocument::new(json!({
            "attributes": [
                {"trait_type": "Fur", "value": "Black"},
                {"trait_type": "Eyes"},
                {"value": "orphan"},
                {"trait_type": "Level", "value": 7},
                {"trait_type": "Hat", "value": ""}
            ]
        }));
        let attrs = doc.attributes().unwrap();
        let pairs: Vec<(&str, &str)> = attrs
            .iter()
            .map(|a| (a.trait_type.as_str(), a.value.as_str()))
            .collect();
        assert_eq!(pairs, vec![("Fur", "Black"), ("Level", "7")]);
    }

    #[test]
    fn zero_and_false_count_as_missing() {
        let doc = MetadataDocument::new(json!({
            "attributes": [
                {"trait_type": "Lore Poem", "value": 0},
                {"trait_type": "Emoji Song", "value": false},
                {"trait_type": "Level", "value": 0},
                {"trait_type": "Rare", "value": true},
                {"trait_type": "Weight", "value": 0.5}
            ]
        }));
        assert_eq!(doc.lore_poem(), LORE_POEM_PLACEHOLDER);
        assert_eq!(doc.emoji_song(), EMOJI_SONG_PLACEHOLDER);

        let attrs = doc.attributes().unwrap();
        let pairs: Vec<(&str, &str)> = attrs
            .iter()
            .map(|a| (a.trait_type.as_str(), a.value.as_str()))
            .collect();
        assert_eq!(pairs, vec![("Rare", "true"), ("Weight", "0.5")]);
    }

    #[test]
    fn malformed_shapes_are_reported() {
        assert!(MetadataDocument::new(json!({"attributes": {"a": 1}}))
            .attributes()
            .is_err());
        assert!(MetadataDocument::new(json!({"attributes": [null]}))
            .attributes()
            .is_err());
        assert!(MetadataDocument::new(json!({"name": 42})).name().is_err());
        assert!(MetadataDocument::new(json!([1, 2, 3])).name().is_err());
    }

    #[test]
    fn store_insert_is_idempotent_per_id() {
        let mut store = MetadataStore::default();
        let doc = MetadataDocument::new(json!({"name": "a"}));
        assert!(store.insert(4, doc.clone()));
        assert!(!store.insert(4, doc.clone()));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(4), Some(&doc));
        assert!(!store.contains(5));
    }
}
