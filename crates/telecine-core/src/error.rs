//! Error types for Telecine Core

use thiserror::Error;

/// Result type alias for element operations
pub type Result<T> = std::result::Result<T, Error>;

/// Element error types
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("No playback source configured")]
    MissingSource,

    #[error("Invalid source URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // Environment errors
    #[error("No playback path for {mime_type}: native unsupported and no engine available")]
    UnsupportedEnvironment { mime_type: String },

    // Engine errors
    #[error("Fatal engine network error: {0}")]
    EngineNetwork(String),

    #[error("Fatal engine media error: {0}")]
    EngineMedia(String),

    #[error("Fatal engine error: {0}")]
    EngineFatal(String),

    // Playback errors
    #[error("Play request rejected: {0}")]
    PlayRejected(String),

    // Metadata errors
    #[error("Failed to fetch metadata from {url}")]
    MetadataFetch { url: String, source: reqwest::Error },

    #[error("Failed to parse metadata response: {0}")]
    MetadataParse(String),
}

impl Error {
    /// Returns true if playback can continue after a retry or in-place
    /// recovery, without a full reload
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::EngineNetwork(_) | Error::EngineMedia(_) | Error::MetadataFetch { .. }
        )
    }

    /// Returns the error code used in logs and analytics payloads
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::MissingSource => "MISSING_SOURCE",
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::UnsupportedEnvironment { .. } => "UNSUPPORTED_ENVIRONMENT",
            Error::EngineNetwork(_) => "ENGINE_NETWORK",
            Error::EngineMedia(_) => "ENGINE_MEDIA",
            Error::EngineFatal(_) => "ENGINE_FATAL",
            Error::PlayRejected(_) => "PLAY_REJECTED",
            Error::MetadataFetch { .. } => "METADATA_FETCH",
            Error::MetadataParse(_) => "METADATA_PARSE",
        }
    }
}
