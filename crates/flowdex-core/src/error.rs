use thiserror::Error;

/// Unified error type for the Flowdex catalog.
#[derive(Error, Debug)]
pub enum FlowdexError {
    // ── Request errors ─────────────────────────────────────────
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("not found: {0}")]
    NotFound(String),

    // ── Catalog errors ─────────────────────────────────────────
    #[error("catalog error: {catalog}: {reason}")]
    Catalog { catalog: String, reason: String },

    #[error("mapping table error: {0}")]
    Mapping(String),

    // ── Config errors ──────────────────────────────────────────
    #[error("config error: {0}")]
    Config(String),

    // ── Generic wrappers ───────────────────────────────────────
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl FlowdexError {
    /// Whether the error was caused by the caller rather than the service.
    pub fn is_user_error(&self) -> bool {
        matches!(self, FlowdexError::InvalidQuery(_) | FlowdexError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, FlowdexError>;
