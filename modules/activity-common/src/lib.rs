pub mod bots;
pub mod clock;
pub mod config;
pub mod error;
pub mod keys;

pub use bots::{is_bot_actor, is_bot_login};
pub use clock::{next_midnight, ScoreWindow};
pub use config::AppConfig;
pub use error::ActivityError;
