use thiserror::Error;

/// Setup failures. These are the only errors allowed to end a run.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("HTTP client setup failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV read failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ImportError>;

/// A failed upsert request. Always contained by the batch writer.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("request failed before a response arrived: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("store rejected the write ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("failed to encode records: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    /// Transport failures, timeouts, throttling and server errors may succeed on
    /// a later attempt; anything else is the store refusing the data itself.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Transport(_) => true,
            StoreError::Rejected { status, .. } => {
                *status == 408 || *status == 429 || *status >= 500
            }
            StoreError::Serialize(_) => false,
        }
    }

    pub fn kind(&self) -> &'static str {
        if self.is_transient() {
            "transient"
        } else {
            "permanent"
        }
    }
}
