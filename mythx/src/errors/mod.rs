//! Error types shared by the request/response models, the API handler and
//! the authenticated client.
//!
//! Every failure surfaces synchronously to the direct caller. Nothing in this
//! crate retries or swallows an error on the caller's behalf.

use thiserror::Error;

/// Errors raised while building, sending or decoding MythX API calls.
#[derive(Debug, Error)]
pub enum MythXError {
    /// Structured data is missing required keys, has the wrong types or
    /// violates a declared constraint.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// The response body is not valid JSON or has the wrong overall shape.
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// The API answered with a non-success HTTP status code.
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// The request never produced an HTTP response.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// No usable credentials are available to (re-)authenticate.
    #[error("Authentication error: {message}")]
    Authentication { message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

pub type MythXResult<T> = Result<T, MythXError>;

impl MythXError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    pub fn api(status: u16, body: impl Into<String>) -> Self {
        Self::Api {
            status,
            body: body.into(),
        }
    }

    /// Status code carried by an [`MythXError::Api`] failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<validator::ValidationErrors> for MythXError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::validation(crate::utils::validation_errors_to_message(&errors))
    }
}
