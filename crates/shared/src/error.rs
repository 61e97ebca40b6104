use thiserror::Error;

/// Which API endpoint a response body belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    FetchProfile,
    UpdateProfile,
    ApproveRequest,
    RejectRequest,
}

impl Endpoint {
    pub fn name(self) -> &'static str {
        match self {
            Self::FetchProfile => "fetch_profile",
            Self::UpdateProfile => "update_profile",
            Self::ApproveRequest => "approve_request",
            Self::RejectRequest => "reject_request",
        }
    }
}

/// A response body that did not match the endpoint's schema.
#[derive(Debug, Error)]
#[error("malformed {} response: {reason}", .endpoint.name())]
pub struct ParseError {
    pub endpoint: Endpoint,
    pub reason: String,
}

impl ParseError {
    pub fn new(endpoint: Endpoint, reason: impl Into<String>) -> Self {
        Self {
            endpoint,
            reason: reason.into(),
        }
    }
}
