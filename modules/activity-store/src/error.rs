/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Unexpected reply: {0}")]
    UnexpectedReply(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
