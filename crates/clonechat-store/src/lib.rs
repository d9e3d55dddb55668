//! Clone Chat Store — the pre-built passage index behind retrieval.
//!
//! The index is written once by the `index` command and opened read-only by
//! the server, which loads one collection into an immutable [`IndexSnapshot`].

pub mod embedding;
pub mod schema;
pub mod snapshot;
pub mod sqlite;
pub mod types;

pub use snapshot::IndexSnapshot;
pub use sqlite::VectorIndex;
pub use types::*;
