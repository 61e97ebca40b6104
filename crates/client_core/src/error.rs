use shared::error::{Endpoint, ParseError};
use thiserror::Error;

/// Everything that can go wrong between issuing an API call and holding a
/// typed response.
#[derive(Debug, Error)]
pub enum ApiCallError {
    #[error("no active session credential")]
    Unauthenticated,
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{} returned HTTP {status}", .endpoint.name())]
    HttpStatus { endpoint: Endpoint, status: u16 },
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Well-formed response whose status word was not `success`.
    #[error("server rejected the action: {message}")]
    Rejected { message: String },
}

impl ApiCallError {
    /// Server-supplied text worth showing verbatim, if any.
    pub fn user_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message } if !message.trim().is_empty() => Some(message),
            _ => None,
        }
    }
}
