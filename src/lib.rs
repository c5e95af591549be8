//! Index of a GraphQL schema project split across many files.
//!
//! A scan starts at an entry schema file, follows `@sdl(files: [...])`
//! inclusions and `@sdl(executables: [...])` declarations, and publishes one
//! immutable [`IndexSnapshot`] holding symbol locations, root operations,
//! per-type fields, type relationships, operations and persisted documents.

pub mod config;
pub mod error;
pub mod index;
pub mod indexer;
pub mod mcp;
pub mod query;

pub use config::Config;
pub use error::{IndexError, Result};
pub use index::{IndexSnapshot, IndexStore};
pub use indexer::{CancelFlag, ProgressSink, ScanOptions, ScanSummary, SchemaIndexer, SourceReader};
