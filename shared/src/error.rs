use thiserror::Error;

/// Failure taxonomy for the tag-watch pipeline. Every variant propagates
/// unchanged to the Lambda runtime; this crate never retries.
#[derive(Debug, Error)]
pub enum Error {
    /// Duplicate handler registration. Raised during startup wiring, never
    /// while an event is being processed.
    #[error("handler already registered for ({source}, {name})")]
    Configuration { source: String, name: String },

    #[error("object store read failed: {0}")]
    ObjectStore(String),

    #[error("failed to decompress trail object: {0}")]
    Decompression(String),

    #[error("failed to parse trail document: {0}")]
    Parse(String),

    #[error("trail document has unexpected shape: {0}")]
    Schema(String),

    #[error("instance inventory query failed: {0}")]
    Inventory(String),

    #[error("alert publish failed: {0}")]
    Notification(String),
}
