//! Domain types for the open-tasks scanner.
//!
//! # Module Organization
//!
//! - [`priority`] - Priority tiers
//! - [`tags`] - Tag identifiers and matching options
//! - [`request`] - File sets and the immutable scan request
//! - [`task`] - Task findings and skipped files
//! - [`report`] - The ordered scan report
//! - [`outcome`] - Sample validation results
//!
//! All public types are re-exported here and at the crate root:
//!
//! ```
//! use ot_core::{Priority, Report, ScanRequest, TaskRecord};
//! ```

pub mod outcome;
pub mod priority;
pub mod report;
pub mod request;
pub mod tags;
pub mod task;

pub use outcome::ValidationOutcome;
pub use priority::Priority;
pub use report::{Report, ReportSummary, TOOL_ID};
pub use request::{resolve_encoding, FileSetSpec, ScanRequest, ScanRequestBuilder, DEFAULT_ENCODING};
pub use tags::{MatchMode, PatternMode, TagConfig, TagConfigBuilder};
pub use task::{SkippedFile, TaskRecord};
