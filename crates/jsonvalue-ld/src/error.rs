use std::fmt;

/// Failures of the bundled JSON-LD processor.
#[derive(Debug, thiserror::Error)]
pub enum LdError {
    #[error("Expansion failed: {0}")]
    Expansion(String),

    #[error("Compaction failed: {0}")]
    Compaction(String),

    /// A `@context` that cannot be processed, or a remote one that is not loaded.
    #[error("Invalid context: {0}")]
    Context(String),
}

pub type Result<T> = std::result::Result<T, LdError>;

impl LdError {
    pub fn expansion(msg: impl fmt::Display) -> Self {
        Self::Expansion(msg.to_string())
    }

    pub fn compaction(msg: impl fmt::Display) -> Self {
        Self::Compaction(msg.to_string())
    }

    pub fn context(msg: impl fmt::Display) -> Self {
        Self::Context(msg.to_string())
    }
}
