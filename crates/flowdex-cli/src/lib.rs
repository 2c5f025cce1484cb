//! # flowdex-cli
//!
//! Command-line interface for Flowdex.
//!
//! ## Commands
//!
//! - `flowdex serve`: Start the HTTP API server
//! - `flowdex scan`: Scan catalogs and report what was found or skipped
//! - `flowdex list`: Query a catalog from the terminal
//! - `flowdex config`: Show the effective configuration

pub mod commands;

pub use commands::Cli;
