//! Error handling and custom error types
//!
//! Provides unified error handling across the crate using thiserror.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Non-success HTTP status, or a network failure that survived every retry.
    #[error("API request failed{}: {message}", status_suffix(.status))]
    Api {
        message: String,
        status: Option<u16>,
        body: Option<String>,
    },

    #[error("Request timed out after {attempts} attempts")]
    RequestTimeout { attempts: u32 },

    #[error("Operation {name} did not finish within {}", wait_label(.waited))]
    OperationTimeout { name: String, waited: Duration },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|code| format!(" (status {})", code))
        .unwrap_or_default()
}

fn wait_label(waited: &Duration) -> String {
    if waited.subsec_millis() == 0 {
        format!("{} seconds", waited.as_secs())
    } else {
        format!("{} ms", waited.as_millis())
    }
}

impl Error {
    /// Errors raised by the API client itself rather than by local processing.
    pub fn is_api(&self) -> bool {
        matches!(
            self,
            Error::Api { .. } | Error::RequestTimeout { .. } | Error::OperationTimeout { .. }
        )
    }

    /// Transport failures that the retry loop is allowed to repeat.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Http(e) if e.is_timeout() || e.is_connect() || e.is_request() || e.is_body())
    }

    /// HTTP status carried by an [`Error::Api`], if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => *status,
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
