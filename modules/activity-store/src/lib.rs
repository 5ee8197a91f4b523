//! Key-value store seam shared by the ingest and score pipelines.
//!
//! `RedisStore` is the production backend. `MemoryStore` (feature
//! `test-utils`) mirrors its semantics in-process for tests.

pub mod batch;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod redis_store;
pub mod traits;
pub mod types;

pub use batch::WriteBatch;
pub use error::{Result, StoreError};
#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use traits::ActivityStore;
pub use types::{DedupInsert, InsertOutcome, StreamEntry, WriteOp};
