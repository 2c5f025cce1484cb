//! Named catalogs built from `[[catalogs]]` config entries.

use flowdex_config::{CatalogConfig, CatalogKind, FlowdexConfig};
use flowdex_core::{FlowdexError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::archive::ArchiveSource;
use crate::dsl::DslSource;
use crate::mapping::MappingTable;
use crate::service::CatalogService;
use crate::source::CatalogSource;

/// All catalogs served by one process, keyed by name.
///
/// Catalogs keep the order they were registered in. Registering a name twice
/// replaces the earlier service.
#[derive(Default)]
pub struct CatalogRegistry {
    catalogs: HashMap<String, Arc<CatalogService>>,
    order: Vec<String>,
}

impl CatalogRegistry {
    pub fn new_empty() -> Self {
        Self::default()
    }

    /// Build a service for every enabled catalog in the config. Nothing is
    /// scanned yet; snapshots are built on first use.
    pub fn from_config(config: &FlowdexConfig) -> Result<Self> {
        let mut registry = Self::new_empty();
        for catalog in &config.catalogs {
            if !catalog.enabled {
                debug!(catalog = %catalog.name, "catalog disabled, skipping");
                continue;
            }
            let source = build_source(catalog)?;
            info!(catalog = %catalog.name, kind = %catalog.kind, "registered catalog");
            registry.register(Arc::new(CatalogService::new(source)));
        }
        Ok(registry)
    }

    pub fn register(&mut self, service: Arc<CatalogService>) {
        let name = service.name().to_string();
        if self.catalogs.insert(name.clone(), service).is_none() {
            self.order.push(name);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<CatalogService>> {
        self.catalogs.get(name)
    }

    /// Look up a catalog, or fail with `NotFound`.
    pub fn require(&self, name: &str) -> Result<&Arc<CatalogService>> {
        self.get(name)
            .ok_or_else(|| FlowdexError::NotFound(format!("catalog '{}'", name)))
    }

    /// Services in registration order.
    pub fn list(&self) -> Vec<&Arc<CatalogService>> {
        self.order.iter().filter_map(|n| self.catalogs.get(n)).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    pub fn count(&self) -> usize {
        self.catalogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalogs.is_empty()
    }
}

/// Construct the source for one catalog entry.
pub fn build_source(catalog: &CatalogConfig) -> Result<Arc<dyn CatalogSource>> {
    match catalog.kind {
        CatalogKind::Archive => {
            let dir = catalog.dirs.first().ok_or_else(|| FlowdexError::Catalog {
                catalog: catalog.name.clone(),
                reason: "archive catalog needs a directory".into(),
            })?;
            let mapping = match &catalog.mapping_file {
                Some(path) => MappingTable::load(path).map_err(|e| FlowdexError::Catalog {
                    catalog: catalog.name.clone(),
                    reason: e.to_string(),
                })?,
                None => MappingTable::new_empty(),
            };
            debug!(catalog = %catalog.name, entries = mapping.len(), "mapping table loaded");
            Ok(Arc::new(ArchiveSource::new(&catalog.name, dir, mapping)))
        }
        CatalogKind::Dsl => Ok(Arc::new(DslSource::new(&catalog.name, catalog.dirs.clone()))),
    }
}
