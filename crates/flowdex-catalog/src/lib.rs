//! # flowdex-catalog
//!
//! Turns directories of exported workflows into queryable catalogs.
//!
//! Two source kinds are supported:
//!
//! - **archive**: `Workflow-X<code>_<slug>_<n>-draft-<rev>.zip` files. Each
//!   name is parsed into a [`parser::ParsedIdentifier`], resolved against a
//!   [`mapping::MappingTable`] (direct hit, fuzzy match, or placeholder),
//!   given a display name by [`enrich`], and collapsed to the newest draft
//!   per workflow by [`dedup`].
//! - **dsl**: YAML workflow exports, categorized by keyword and summarized
//!   from their node graph.
//!
//! ## Pipeline
//!
//! ```text
//! directory ─▶ CatalogSource::scan ─▶ ScanReport ─▶ CatalogSnapshot
//!                                                      │
//!                         ListQuery ─▶ CatalogService::list ─▶ ListPage
//! ```
//!
//! A [`CatalogService`] caches the last snapshot and swaps it atomically on
//! refresh. A [`CatalogRegistry`] holds one service per configured catalog.

pub mod archive;
pub mod dedup;
pub mod dsl;
pub mod enrich;
pub mod mapping;
pub mod parser;
pub mod query;
pub mod registry;
pub mod service;
pub mod source;

pub use archive::ArchiveSource;
pub use dsl::DslSource;
pub use mapping::{MappingEntry, MappingTable};
pub use query::{ListPage, ListParams, ListQuery};
pub use registry::CatalogRegistry;
pub use service::{CatalogService, CatalogSnapshot};
pub use source::CatalogSource;
