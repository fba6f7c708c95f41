//! Link import for the outreach tracker
//!
//! Canonicalises candidate links, detects their platform, reconciles them
//! against the active list and the blacklist, and commits accepted rows.
//!
//! # Features
//! - URL normalisation used as the duplicate key
//! - Platform detection from configured domains
//! - Ordered duplicate classification against snapshots and the current batch
//! - Single, bulk-text and CSV entry with column mapping
//! - Sequential, non-atomic batch commit with per-row accounting
//! - Moves between the active list and the blacklist with rollback
//! - List filtering, stats and CSV/JSON export

pub mod normalizer;
pub mod platform;
pub mod reconciler;
pub mod csv_import;
pub mod pipeline;
pub mod relocation;
pub mod filter;
pub mod stats;
pub mod export;

pub use normalizer::*;
pub use platform::*;
pub use reconciler::*;
pub use csv_import::*;
pub use pipeline::*;
pub use relocation::*;
pub use filter::*;
pub use stats::*;
pub use export::*;

// Re-export commonly used types
pub use outreach_core::*;
