//! Error taxonomy shared by both provider adapters.

use thiserror::Error;

/// Errors produced while listing or deleting cloud resources
#[derive(Debug, Error)]
pub enum CleanError {
    /// No usable credential could be obtained, or the provider rejected it
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The provider rejected the request
    #[error("API request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    /// The request never produced a response
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A long-running operation was accepted but finished unsuccessfully
    #[error("operation failed: {0}")]
    Operation(String),

    #[error("failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid URL in response: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("{0} is not set")]
    MissingEnv(&'static str),

    #[error("no project id configured")]
    EmptyProject,
}

impl CleanError {
    /// HTTP status carried by an `Api` error
    pub fn status(&self) -> Option<u16> {
        match self {
            CleanError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

pub type Result<T> = std::result::Result<T, CleanError>;

/// Read a required environment variable, trimmed, treating an empty value
/// as unset
pub fn required_env(name: &'static str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(CleanError::MissingEnv(name)),
    }
}

/// Read an optional environment variable, ignoring empty values
pub(crate) fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_env_message_names_variable() {
        let err = required_env("CLEAN_CLOUD_TEST_SURELY_UNSET").unwrap_err();
        assert_eq!(err.to_string(), "CLEAN_CLOUD_TEST_SURELY_UNSET is not set");
    }

    #[test]
    fn test_required_env_trims_whitespace() {
        std::env::set_var("CLEAN_CLOUD_TEST_PADDED", " proj-1 ");
        assert_eq!(required_env("CLEAN_CLOUD_TEST_PADDED").unwrap(), "proj-1");
        std::env::set_var("CLEAN_CLOUD_TEST_BLANK", "   ");
        assert!(required_env("CLEAN_CLOUD_TEST_BLANK").is_err());
    }

    #[test]
    fn test_not_found_detection() {
        let err = CleanError::Api {
            status: 404,
            message: "ResourceGroupNotFound".to_string(),
        };
        assert!(err.is_not_found());
        assert!(!CleanError::Operation("boom".to_string()).is_not_found());
    }
}
