use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HaulError {
    /// Missing or malformed required fields in a caller's request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The generative model credential is not configured.
    #[error("Unconfigured: {0}")]
    Unconfigured(String),

    /// The external model failed or returned no usable image.
    #[error("Generation failed: {message}")]
    GenerationFailed {
        message: String,
        details: Option<String>,
    },

    /// An image source could not be read or fetched.
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Request error: {0}")]
    RequestError(String),
}

impl HaulError {
    pub fn generation_failed(message: impl Into<String>, details: Option<String>) -> Self {
        HaulError::GenerationFailed {
            message: message.into(),
            details,
        }
    }

    /// Upstream detail carried by a generation failure, if any.
    pub fn details(&self) -> Option<&str> {
        match self {
            HaulError::GenerationFailed { details, .. } => details.as_deref(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for HaulError {
    fn from(e: serde_json::Error) -> Self {
        HaulError::SerializationError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HaulError>;
