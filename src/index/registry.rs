//! Metadata registry - ordered document entries parallel to the vector index

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::corpus::DocEntry;

/// Ordered registry of indexed documents.
///
/// Entry `i` describes the vector at position `i` in the index; the two are
/// only ever written together by a rebuild. Serialized as a JSON object with
/// a single `items` key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataRegistry {
    items: Vec<DocEntry>,
}

impl MetadataRegistry {
    pub fn new(items: Vec<DocEntry>) -> Self {
        Self { items }
    }

    /// Load the registry from a JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let registry: MetadataRegistry = serde_json::from_str(&content)?;
        Ok(registry)
    }

    /// Save the registry, replacing any previous file atomically
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, content)?;
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Get the entry at a vector position
    pub fn get(&self, position: usize) -> Option<&DocEntry> {
        self.items.get(position)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str) -> DocEntry {
        DocEntry {
            id: Some(id.to_string()),
            case_id: None,
            source_file: Some(format!("{id}.png")),
            snippet: format!("snippet for {id}"),
        }
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.json");

        let registry = MetadataRegistry::new(vec![entry("a"), entry("b")]);
        registry.save(&path).unwrap();

        let loaded = MetadataRegistry::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get(0).unwrap().id.as_deref(), Some("a"));
        assert_eq!(loaded.get(1).unwrap().source_file.as_deref(), Some("b.png"));
        assert!(loaded.get(2).is_none());
    }

    #[test]
    fn test_serialized_under_items_key_with_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.json");

        MetadataRegistry::new(vec![entry("a")]).save(&path).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let items = raw.get("items").unwrap().as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0].get("sourceFile").is_some());
        assert!(items[0].get("caseId").is_some());
    }

    #[test]
    fn test_empty_registry_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.json");

        MetadataRegistry::default().save(&path).unwrap();
        let loaded = MetadataRegistry::load(&path).unwrap();
        assert!(loaded.is_empty());
    }
}
