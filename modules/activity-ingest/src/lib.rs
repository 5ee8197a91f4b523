pub mod feed;
pub mod ingestor;
pub mod stats;

pub use feed::EventFeed;
pub use ingestor::{IngestOptions, Ingestor};
pub use stats::IngestStats;
