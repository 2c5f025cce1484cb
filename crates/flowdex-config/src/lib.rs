//! # flowdex-config
//!
//! Configuration system for Flowdex. Reads from `flowdex.toml` and environment
//! variables. Env values win.

pub mod loader;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::FlowdexConfig;
pub use schema::{CatalogConfig, CatalogKind, ConfigWarning, WarningSeverity};
