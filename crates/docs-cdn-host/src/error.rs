//! Error types for asset resolution

use std::path::PathBuf;
use thiserror::Error;

/// Error types for resolving documentation asset locations
#[derive(Error, Debug)]
pub enum Error {
    /// Example asset URL is missing a scheme or hostname
    #[error("Invalid ({url:?}) -- missing scheme or hostname")]
    InvalidUrl {
        /// The offending URL
        url: String,
    },

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The cache file could not be accessed at the default or fallback location
    #[error("Cache file {path} is not accessible: {source}")]
    CacheInaccessible {
        /// Path that failed the existence check
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Cache directory could not be determined
    #[error("Could not determine cache directory for the current platform")]
    CacheDirectoryNotFound,

    /// Race configuration failed validation
    #[error("Invalid race configuration: {0}")]
    InvalidConfig(String),

    /// The worker thread running the race panicked
    #[error("Race worker failed: {0}")]
    Worker(String),
}

/// Result type for asset resolution
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid URL error
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_message() {
        let err = Error::invalid_url("swagger-ui.css");
        assert_eq!(
            err.to_string(),
            "Invalid (\"swagger-ui.css\") -- missing scheme or hostname"
        );
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io.into();
        assert!(err.to_string().starts_with("IO error"));
    }
}
