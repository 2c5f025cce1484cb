//! Archive catalogs: `Workflow-X<code>...-draft-<rev>.zip` files resolved
//! against a reference table.

use flowdex_core::{CatalogItem, ScanReport, SkipReason};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::dedup::{dedup, group_key};
use crate::enrich::display_text;
use crate::mapping::MappingTable;
use crate::parser::{self, draft_revision};
use crate::source::{CatalogSource, download_url};

/// A file discovered in the archive directory.
#[derive(Debug, Clone)]
pub struct RawFile {
    pub filename: String,
    pub path: PathBuf,
}

/// Source over one directory of workflow archives.
pub struct ArchiveSource {
    name: String,
    dir: PathBuf,
    mapping: MappingTable,
}

impl ArchiveSource {
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>, mapping: MappingTable) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
            mapping,
        }
    }

    /// Run parse → resolve → dedup over already-listed files.
    pub fn build(&self, files: impl IntoIterator<Item = RawFile>) -> ScanReport {
        let mut report = ScanReport::default();
        let mut candidates = Vec::new();

        for file in files {
            report.scanned += 1;
            let Some(parsed) = parser::parse(&file.filename) else {
                debug!(filename = %file.filename, "unrecognized archive name, skipping");
                report.skip(file.filename, SkipReason::Unparseable);
                continue;
            };

            let resolution = self.mapping.resolve(&parsed, &file.filename);
            let text = display_text(&parsed, &resolution, &file.filename);
            let category = resolution.entry.category.clone();

            let item = CatalogItem {
                id: resolution.id().to_string(),
                url: download_url(&self.name, &file.filename),
                filename: file.filename.clone(),
                name: text.name,
                tags: vec![category.clone(), "Coze".into(), "AI".into()],
                category,
                kind: resolution.entry.type_code.clone(),
                source: "community".into(),
                description: text.description,
                details: None,
                path: file.path,
                revision: draft_revision(&file.filename),
            };
            candidates.push((group_key(&file.filename, &parsed), item));
        }

        report.items = dedup(candidates);
        report
    }

    /// List `*.zip` files, in the order the filesystem returns them.
    fn list(&self, report: &mut ScanReport) -> Vec<RawFile> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(catalog = %self.name, dir = %self.dir.display(), error = %e, "archive directory unreadable");
                return Vec::new();
            }
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(catalog = %self.name, error = %e, "failed to read directory entry");
                    report.skip(self.dir.display().to_string(), SkipReason::Io(e.to_string()));
                    continue;
                }
            };
            let path = entry.path();
            if !path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
            {
                continue;
            }
            let filename = entry.file_name().to_string_lossy().into_owned();
            match entry.metadata() {
                Ok(meta) if meta.is_file() => files.push(RawFile { filename, path }),
                Ok(_) => continue,
                Err(e) => {
                    warn!(catalog = %self.name, filename = %filename, error = %e, "failed to stat archive");
                    report.scanned += 1;
                    report.skip(filename, SkipReason::Io(e.to_string()));
                }
            }
        }
        files
    }
}

impl CatalogSource for ArchiveSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "archive"
    }

    fn scan(&self) -> ScanReport {
        let mut listing = ScanReport::default();
        let files = self.list(&mut listing);
        let mut report = self.build(files);
        report.scanned += listing.scanned;
        listing.skipped.append(&mut report.skipped);
        report.skipped = listing.skipped;

        info!(
            catalog = %self.name,
            scanned = report.scanned,
            items = report.items.len(),
            skipped = report.skipped.len(),
            "archive scan complete"
        );
        report
    }

    fn stats(&self, items: &[CatalogItem]) -> serde_json::Value {
        let categories = items
            .iter()
            .map(|i| &i.category)
            .collect::<std::collections::BTreeSet<_>>();
        serde_json::json!({
            "total": items.len(),
            "categories": categories.len(),
            "official": 0,
            "community": items.len(),
        })
    }

    /// Any archive in the directory is downloadable, including revisions the
    /// deduplicator dropped.
    fn locate(&self, filename: &str, _items: &[CatalogItem]) -> Option<PathBuf> {
        let path = self.dir.join(filename);
        path.is_file().then_some(path)
    }
}
