use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The externally visible unit of every catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub filename: String,
    pub name: String,
    pub category: String,
    /// Short type code ("W", "V", ...) for archives, mode display name for DSL files.
    #[serde(rename = "type")]
    pub kind: String,
    pub source: String,
    pub description: String,
    pub tags: Vec<String>,
    /// Relative download URL.
    pub url: String,
    /// Graph statistics, only present for DSL workflows.
    #[serde(flatten)]
    pub details: Option<WorkflowDetails>,
    /// Where the file lives on disk.
    #[serde(skip)]
    pub path: PathBuf,
    /// Draft revision the item was built from (0 when unknown).
    #[serde(skip)]
    pub revision: u64,
}

impl CatalogItem {
    /// Case-insensitive substring match over name, description and tags.
    /// `needle` must already be lowercased.
    pub fn matches_text(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(needle))
    }
}

/// Metadata extracted from a workflow DSL document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDetails {
    pub icon: String,
    pub mode: String,
    pub mode_display: String,
    pub node_count: usize,
    pub edge_count: usize,
    pub llm_count: usize,
    pub code_count: usize,
    pub node_types: Vec<String>,
    pub models_used: Vec<String>,
}

/// A category as exposed by `categories()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// Why a file was left out of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// The filename does not follow any recognized convention.
    Unparseable,
    /// The file could not be read.
    Io(String),
    /// The file was read but its contents could not be decoded.
    InvalidDocument(String),
    /// The file decoded to nothing.
    EmptyDocument,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Unparseable => write!(f, "unrecognized filename"),
            SkipReason::Io(e) => write!(f, "io error: {e}"),
            SkipReason::InvalidDocument(e) => write!(f, "invalid document: {e}"),
            SkipReason::EmptyDocument => write!(f, "empty document"),
        }
    }
}

/// A file dropped during a scan, with its diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub filename: String,
    pub reason: SkipReason,
}

/// Result of one full scan pass over a catalog source.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub items: Vec<CatalogItem>,
    pub skipped: Vec<SkippedFile>,
    /// Number of candidate files looked at.
    pub scanned: usize,
}

impl ScanReport {
    pub fn skip(&mut self, filename: impl Into<String>, reason: SkipReason) {
        self.skipped.push(SkippedFile {
            filename: filename.into(),
            reason,
        });
    }
}
