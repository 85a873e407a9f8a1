/// Errors raised by the bus itself, as opposed to the handlers it feeds.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// The backing store is unreachable or rejected a statement.
    #[error("Bus storage error: {0}")]
    Database(#[from] sqlx::Error),

    /// An event could not be serialized for publishing.
    #[error("Event encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}
