use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScanError>;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Transport failure: {0}")]
    TransportFailure(#[from] crate::transport::TransportError),

    #[error("Unknown signature category: {0}")]
    UnknownSignatureCategory(String),

    #[error("Invalid signature '{name}': {reason}")]
    InvalidSignature { name: String, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Reporting error: {0}")]
    Reporting(String),
}

impl ScanError {
    /// Errors caused by bad caller input rather than the environment.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ScanError::InvalidTarget(_)
                | ScanError::UnknownSignatureCategory(_)
                | ScanError::InvalidInput(_)
                | ScanError::Config(_)
        )
    }
}
