pub mod aggregator;
pub mod archive;
pub mod record;
pub mod stats;

pub use aggregator::{ScoreAggregator, ScoreOptions};
pub use archive::HourlyArchive;
pub use record::ScoringRecord;
pub use stats::{HourOutcome, ScoreStats};
