//! Core types, configuration, and errors for the open-tasks scanner.
//!
//! This crate provides the foundational types shared across the workspace:
//!
//! - Domain types ([`Priority`], [`TagConfig`], [`ScanRequest`], [`TaskRecord`], [`Report`])
//! - The [`ValidationOutcome`] of a sample check
//! - The JSON [`Config`] file and its sections
//! - [`ConfigError`] for everything that can go wrong before a scan starts
//!
//! Every type that crosses the execution boundary implements `Serialize`
//! and `Deserialize` and round-trips without loss.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, FilesConfig, TagsConfig, WorkerConfig};
pub use error::ConfigError;
pub use types::*;
