//! # flowdex-core
//!
//! Core types and primitives for the Flowdex workflow catalog.
//! This crate defines the shared vocabulary used by every other crate in the workspace.

pub mod error;
pub mod types;

pub use error::{FlowdexError, Result};
pub use types::*;
