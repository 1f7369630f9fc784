//! Error handling for the roomshare client

use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Error body returned by the REST backend on a failed request
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiErrorDetails {
    pub code: Option<String>,
    pub message: Option<String>,
    pub details: Option<String>,
    pub hint: Option<String>,
}

impl fmt::Display for ApiErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(code) = &self.code {
            parts.push(format!("Code: {}", code));
        }
        if let Some(message) = &self.message {
            parts.push(format!("Message: {}", message));
        }
        if let Some(details) = &self.details {
            parts.push(format!("Details: {}", details));
        }
        if let Some(hint) = &self.hint {
            parts.push(format!("Hint: {}", hint));
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// Unified error type for the roomshare client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// JWT errors
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// The backend answered with a non-success status
    #[error("API error: {details} (Status: {status})")]
    Api {
        status: reqwest::StatusCode,
        details: ApiErrorDetails,
    },

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Database query errors
    #[error("Database error: {0}")]
    Database(String),

    /// Remote function errors
    #[error("Function error: {0}")]
    Function(String),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("You cannot add yourself as a roommate")]
    SelfAddition,

    #[error("No user found with email {0}")]
    ProfileNotFound(String),

    #[error("{0} is already your roommate")]
    AlreadyRoommate(String),

    /// Rejected form input
    #[error("Validation error: {0}")]
    Validation(String),
}

impl Error {
    /// Create a new authentication error
    pub fn auth<T: fmt::Display>(msg: T) -> Self {
        Error::Auth(msg.to_string())
    }

    /// Create a new database error
    pub fn database<T: fmt::Display>(msg: T) -> Self {
        Error::Database(msg.to_string())
    }

    /// Create a new function error
    pub fn function<T: fmt::Display>(msg: T) -> Self {
        Error::Function(msg.to_string())
    }

    /// Create a new validation error
    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }

    /// Build an error from a failed response body, keeping the parsed
    /// details when the body is a backend error object.
    pub(crate) fn from_response(status: reqwest::StatusCode, body: &str) -> Self {
        match serde_json::from_str::<ApiErrorDetails>(body) {
            Ok(details) => Error::Api { status, details },
            Err(_) => Error::Api {
                status,
                details: ApiErrorDetails {
                    message: Some(body.to_string()),
                    ..Default::default()
                },
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
