use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    domain::{Profile, ProfileDraft},
    error::{Endpoint, ParseError},
};

/// `{ "data": ... }` wrapper used by the profile endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

pub type ProfileResponse = DataEnvelope<Profile>;

/// PUT body for `/api/alumni/profile`.
pub type UpdateProfileRequest = ProfileDraft;

/// Status word the mentee endpoints use to report an applied action.
pub const ACTION_SUCCESS_STATUS: &str = "success";

/// Body returned by the approve and reject endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

impl ActionResponse {
    pub fn is_success(&self) -> bool {
        self.status == ACTION_SUCCESS_STATUS
    }
}

pub fn parse_body<T: DeserializeOwned>(endpoint: Endpoint, body: &str) -> Result<T, ParseError> {
    serde_json::from_str(body).map_err(|e| ParseError::new(endpoint, e.to_string()))
}
