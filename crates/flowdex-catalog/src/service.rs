//! Catalog snapshots, swapped whole on refresh.

use chrono::{DateTime, Utc};
use flowdex_core::{CatalogItem, Category, FlowdexError, Result, SkippedFile};
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

use crate::query::{ListPage, ListQuery, paginate};
use crate::source::CatalogSource;

/// The result of one full scan. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    /// Increments on every rebuild, starting at 1.
    pub generation: u64,
    pub items: Vec<CatalogItem>,
    pub skipped: Vec<SkippedFile>,
    pub scanned: usize,
    pub built_at: DateTime<Utc>,
}

/// Cached, queryable view over one catalog source.
///
/// The first query builds the snapshot; `refresh` swaps in a new one. Callers
/// holding an `Arc<CatalogSnapshot>` keep the version they were handed.
pub struct CatalogService {
    source: Arc<dyn CatalogSource>,
    current: RwLock<Option<Arc<CatalogSnapshot>>>,
    generation: AtomicU64,
}

impl CatalogService {
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self {
            source,
            current: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        self.source.name()
    }

    pub fn kind(&self) -> &'static str {
        self.source.kind()
    }

    pub fn is_loaded(&self) -> bool {
        self.current.read().is_some()
    }

    /// Current snapshot, scanning on first access.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        if let Some(snapshot) = self.current.read().as_ref() {
            return Arc::clone(snapshot);
        }
        debug!(catalog = %self.name(), "no snapshot yet, scanning");
        self.refresh()
    }

    /// Rescan the source and swap in the result.
    pub fn refresh(&self) -> Arc<CatalogSnapshot> {
        let report = self.source.scan();
        let snapshot = Arc::new(CatalogSnapshot {
            generation: self.generation.fetch_add(1, Ordering::SeqCst) + 1,
            items: report.items,
            skipped: report.skipped,
            scanned: report.scanned,
            built_at: Utc::now(),
        });
        info!(
            catalog = %self.name(),
            generation = snapshot.generation,
            total = snapshot.items.len(),
            skipped = snapshot.skipped.len(),
            "catalog rebuilt"
        );
        *self.current.write() = Some(Arc::clone(&snapshot));
        snapshot
    }

    pub fn list(&self, query: &ListQuery) -> ListPage {
        paginate(&self.snapshot().items, query)
    }

    pub fn categories(&self) -> Vec<Category> {
        self.source.categories(&self.snapshot().items)
    }

    pub fn category_counts(&self) -> Vec<(String, usize)> {
        self.source.category_counts(&self.snapshot().items)
    }

    pub fn stats(&self) -> serde_json::Value {
        self.source.stats(&self.snapshot().items)
    }

    /// Detail view of one item, looked up by filename, then by id.
    pub fn get(&self, id: &str) -> Result<serde_json::Value> {
        let snapshot = self.snapshot();
        let item = snapshot
            .items
            .iter()
            .find(|i| i.filename == id)
            .or_else(|| snapshot.items.iter().find(|i| i.id == id))
            .ok_or_else(|| FlowdexError::NotFound(format!("workflow '{}' in catalog '{}'", id, self.name())))?;
        self.source.detail(item)
    }

    /// Path of a downloadable file. Names that could leave the catalog
    /// directory are rejected.
    pub fn locate(&self, filename: &str) -> Result<PathBuf> {
        validate_filename(filename)?;
        self.source
            .locate(filename, &self.snapshot().items)
            .ok_or_else(|| FlowdexError::NotFound(format!("file '{}' in catalog '{}'", filename, self.name())))
    }

    pub fn download(&self, filename: &str) -> Result<Vec<u8>> {
        let path = self.locate(filename)?;
        Ok(std::fs::read(path)?)
    }
}

fn validate_filename(filename: &str) -> Result<()> {
    if filename.is_empty() || filename.contains(['/', '\\']) || filename.contains("..") {
        return Err(FlowdexError::InvalidQuery(format!("invalid filename '{}'", filename)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowdex_core::{ScanReport, SkipReason};
    use std::sync::atomic::AtomicUsize;

    struct Fixed {
        scans: AtomicUsize,
    }

    impl CatalogSource for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }
        fn kind(&self) -> &'static str {
            "test"
        }
        fn scan(&self) -> ScanReport {
            let n = self.scans.fetch_add(1, Ordering::SeqCst);
            let mut report = ScanReport::default();
            for i in 0..=n {
                report.items.push(CatalogItem {
                    id: i.to_string(),
                    filename: format!("w{}.zip", i),
                    name: format!("w{}", i),
                    category: "c".into(),
                    kind: "W".into(),
                    source: "community".into(),
                    description: String::new(),
                    tags: vec![],
                    url: String::new(),
                    details: None,
                    path: PathBuf::new(),
                    revision: 0,
                });
            }
            report.scanned = n + 2;
            report.skip("junk.zip", SkipReason::Unparseable);
            report
        }
    }

    fn service() -> CatalogService {
        CatalogService::new(Arc::new(Fixed {
            scans: AtomicUsize::new(0),
        }))
    }

    #[test]
    fn snapshot_is_built_once() {
        let svc = service();
        assert!(!svc.is_loaded());
        let a = svc.snapshot();
        let b = svc.snapshot();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.generation, 1);
        assert_eq!(a.skipped.len(), 1);
        assert!(svc.is_loaded());
    }

    #[test]
    fn refresh_swaps_without_touching_old() {
        let svc = service();
        let old = svc.snapshot();
        let new = svc.refresh();
        assert_eq!(old.items.len(), 1);
        assert_eq!(new.items.len(), 2);
        assert_eq!(new.generation, 2);
        assert_eq!(svc.list(&ListQuery::default()).total, 2);
    }

    #[test]
    fn get_by_filename_or_id() {
        let svc = service();
        assert_eq!(svc.get("w0.zip").unwrap()["name"], "w0");
        assert_eq!(svc.get("0").unwrap()["filename"], "w0.zip");
        assert!(matches!(svc.get("nope"), Err(FlowdexError::NotFound(_))));
    }

    #[test]
    fn locate_rejects_traversal() {
        let svc = service();
        for bad in ["", "../etc/passwd", "a/b.zip", "a\\b.zip", ".."] {
            assert!(matches!(svc.locate(bad), Err(FlowdexError::InvalidQuery(_))), "{}", bad);
        }
        assert!(matches!(svc.locate("missing.zip"), Err(FlowdexError::NotFound(_))));
    }
}
