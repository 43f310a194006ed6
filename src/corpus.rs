//! Corpus scanner - enumerate extraction records eligible for indexing

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

/// Maximum snippet length stored in the registry, in characters.
pub const SNIPPET_CHARS: usize = 400;

/// An extraction record as written by the upstream OCR/NER pipeline.
///
/// Only the fields the index cares about are modeled; anything else in the
/// JSON (entities, confidence, timestamps) is ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRecord {
    /// Explicit record-kind tag. Newer pipelines write `"extraction"`;
    /// older ones omit the field entirely.
    #[serde(default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub case_id: Option<String>,

    #[serde(default)]
    pub source_file: Option<String>,

    #[serde(default)]
    pub extracted_text: Option<String>,

    #[serde(default)]
    pub redacted_text: Option<String>,
}

impl ExtractionRecord {
    /// Whether this record is an extraction document at all.
    ///
    /// A `kind` tag is authoritative when present; untagged records fall
    /// back to the presence of `extractedText`, which is what distinguishes
    /// them from other record kinds sharing the output directory.
    fn is_extraction(&self) -> bool {
        match self.kind.as_deref() {
            Some("extraction") => true,
            Some(_) => false,
            None => self.extracted_text.is_some(),
        }
    }

    /// Resolve the text used for embedding: redacted text when non-empty,
    /// otherwise the raw extracted text.
    fn resolve_text(&self) -> Option<&str> {
        match self.redacted_text.as_deref() {
            Some(redacted) if !redacted.is_empty() => Some(redacted),
            _ => self.extracted_text.as_deref(),
        }
    }
}

/// Registry entry resolving a vector position back to a displayable result.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocEntry {
    pub id: Option<String>,
    pub case_id: Option<String>,
    pub source_file: Option<String>,
    pub snippet: String,
}

/// A document eligible for indexing: the text to embed plus its registry entry.
#[derive(Debug, Clone)]
pub struct IndexedDocument {
    pub text: String,
    pub entry: DocEntry,
}

impl IndexedDocument {
    fn from_record(record: ExtractionRecord) -> Option<Self> {
        if !record.is_extraction() {
            return None;
        }

        let text = record.resolve_text()?.to_string();
        if text.trim().is_empty() {
            return None;
        }

        let snippet: String = text.chars().take(SNIPPET_CHARS).collect();

        Some(Self {
            entry: DocEntry {
                id: record.id,
                case_id: record.case_id,
                source_file: record.source_file,
                snippet,
            },
            text,
        })
    }
}

/// Scan a corpus directory for extraction records.
///
/// Looks only at files directly inside `dir` (no recursion) ending in
/// `.json`. Files that fail to parse, belong to another record kind, or
/// resolve to empty text are skipped; a single bad file never aborts the
/// scan. Entries are sorted by file name so repeated scans of an unchanged
/// directory yield the same document order.
pub fn scan_corpus(dir: &Path) -> anyhow::Result<Vec<IndexedDocument>> {
    let mut paths = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        paths.push(path);
    }

    paths.sort();

    let mut docs = Vec::with_capacity(paths.len());

    for path in &paths {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Skipping unreadable file {:?}: {}", path, e);
                continue;
            }
        };

        let record: ExtractionRecord = match serde_json::from_str(&content) {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping unparseable record {:?}: {}", path, e);
                continue;
            }
        };

        match IndexedDocument::from_record(record) {
            Some(doc) => docs.push(doc),
            None => debug!("Skipping ineligible record {:?}", path),
        }
    }

    Ok(docs)
}
