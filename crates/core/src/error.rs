use reqwest::header::{InvalidHeaderName, InvalidHeaderValue};

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ShellError {
    #[error("Invalid Header - {error}")]
    InvalidHeader { error: String },

    #[error("A session clearance sequence is already running.")]
    ClearanceInProgress,
}

// These are all manually implemented and turned into a string because uniffi doesn't support
// exported foreign error types in the generations.
impl From<InvalidHeaderName> for ShellError {
    fn from(value: InvalidHeaderName) -> Self {
        Self::InvalidHeader {
            error: value.to_string(),
        }
    }
}

impl From<InvalidHeaderValue> for ShellError {
    fn from(value: InvalidHeaderValue) -> Self {
        Self::InvalidHeader {
            error: value.to_string(),
        }
    }
}
