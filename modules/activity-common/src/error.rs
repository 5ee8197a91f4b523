use thiserror::Error;

#[derive(Error, Debug)]
pub enum ActivityError {
    #[error("Configuration error: {0}")]
    Config(String),
}
