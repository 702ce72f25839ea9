use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Client configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Transient failures worth another attempt: connection problems, request timeouts
    /// reported by the server, rate limiting and 5xx responses.
    ///
    /// Deadline expiry (`Timeout`) is final; the caller's time budget is already spent.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(err) => {
                if let Some(status) = err.status() {
                    return is_retryable_status(status.as_u16());
                }
                err.is_connect() || err.is_timeout() || err.is_request()
            }
            Self::Status { status, .. } => is_retryable_status(*status),
            Self::Timeout(_) | Self::Decode(_) | Self::Config(_) => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Http(err) => err.is_timeout(),
            _ => false,
        }
    }

    /// Build a status error from a non-success response body, preferring the
    /// `{"error": {"message": ...}}` envelope DeepSeek returns.
    pub(crate) fn from_status_body(status: u16, body: &str) -> Self {
        #[derive(Deserialize)]
        struct Envelope {
            error: Inner,
        }
        #[derive(Deserialize)]
        struct Inner {
            message: String,
        }

        let message = match serde_json::from_str::<Envelope>(body) {
            Ok(envelope) => envelope.error.message,
            Err(_) => {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    "empty response body".to_string()
                } else {
                    truncate(trimmed, 300)
                }
            }
        };
        Self::Status { status, message }
    }
}

fn is_retryable_status(code: u16) -> bool {
    code == 408 || code == 429 || (500..600).contains(&code)
}

fn truncate(input: &str, max_chars: usize) -> String {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &input[..idx]),
        None => input.to_string(),
    }
}
