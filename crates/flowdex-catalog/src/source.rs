//! The seam between the catalog service and the on-disk formats.

use flowdex_core::{CatalogItem, Category, ScanReport};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// A directory-backed workflow collection.
///
/// `scan` is a full, synchronous pass over the inputs; every other method
/// answers from a list of items produced by an earlier scan.
pub trait CatalogSource: Send + Sync {
    /// Catalog name, used in URLs and logs.
    fn name(&self) -> &str;

    /// Short kind label ("archive", "dsl").
    fn kind(&self) -> &'static str;

    /// Rebuild the full item list from disk.
    fn scan(&self) -> ScanReport;

    /// Categories offered for filtering.
    fn categories(&self, items: &[CatalogItem]) -> Vec<Category> {
        items
            .iter()
            .map(|i| i.category.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(|c| Category {
                id: c.to_string(),
                name: c.to_string(),
            })
            .collect()
    }

    /// Item count per category id, in display order.
    fn category_counts(&self, items: &[CatalogItem]) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for item in items {
            match counts.iter_mut().find(|(c, _)| *c == item.category) {
                Some((_, n)) => *n += 1,
                None => counts.push((item.category.clone(), 1)),
            }
        }
        counts
    }

    /// Summary numbers for the catalog.
    fn stats(&self, items: &[CatalogItem]) -> serde_json::Value {
        let categories = items.iter().map(|i| &i.category).collect::<BTreeSet<_>>();
        serde_json::json!({
            "total": items.len(),
            "categories": categories.len(),
        })
    }

    /// On-disk path of a downloadable file, if it exists.
    fn locate(&self, filename: &str, items: &[CatalogItem]) -> Option<PathBuf> {
        items
            .iter()
            .find(|i| i.filename == filename)
            .map(|i| i.path.clone())
    }

    /// Full detail view of one item.
    fn detail(&self, item: &CatalogItem) -> flowdex_core::Result<serde_json::Value> {
        Ok(serde_json::to_value(item)?)
    }
}

/// Download URL for a file in a named catalog.
pub fn download_url(catalog: &str, filename: &str) -> String {
    format!("/api/v1/{}/download/{}", catalog, filename)
}
