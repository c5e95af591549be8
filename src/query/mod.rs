// Read-side queries over published snapshots

pub mod engine;

pub use engine::{QueryEngine, QueryResult};
