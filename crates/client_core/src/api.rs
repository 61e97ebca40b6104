//! HTTP bindings for the alumni and mentee endpoints.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Profile, ProfileDraft, RequestId},
    error::Endpoint,
    protocol::{parse_body, ActionResponse, ProfileResponse},
};
use tracing::debug;

use crate::{config::ClientSettings, error::ApiCallError, session::Credential};

pub const PROFILE_PATH: &str = "/api/alumni/profile";

/// Approve uses the plural `requests` segment; the server routes it that way.
pub fn approve_path(request_id: &RequestId) -> String {
    format!("/api/mentee/requests/{request_id}/approve")
}

/// Reject uses the singular `request` segment; the server routes it that way.
pub fn reject_path(request_id: &RequestId) -> String {
    format!("/api/mentee/request/{request_id}/reject")
}

#[async_trait]
pub trait AlumniApi: Send + Sync {
    async fn fetch_profile(&self, credential: &Credential) -> Result<Profile, ApiCallError>;
    async fn update_profile(
        &self,
        credential: &Credential,
        draft: &ProfileDraft,
    ) -> Result<Profile, ApiCallError>;
    async fn approve_request(
        &self,
        credential: &Credential,
        request_id: &RequestId,
    ) -> Result<ActionResponse, ApiCallError>;
    async fn reject_request(
        &self,
        credential: &Credential,
        request_id: &RequestId,
    ) -> Result<ActionResponse, ApiCallError>;
}

pub struct HttpAlumniApi {
    http: Client,
    base_url: String,
}

impl HttpAlumniApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self, ApiCallError> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.request_timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn read_body<T: DeserializeOwned>(
        endpoint: Endpoint,
        response: Response,
    ) -> Result<T, ApiCallError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ApiCallError::HttpStatus {
                endpoint,
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        debug!(endpoint = endpoint.name(), bytes = body.len(), "api: response received");
        Ok(parse_body(endpoint, &body)?)
    }

    async fn post_action(
        &self,
        endpoint: Endpoint,
        path: String,
        credential: &Credential,
    ) -> Result<ActionResponse, ApiCallError> {
        let response = self
            .http
            .post(self.url(&path))
            .bearer_auth(credential.bearer())
            .send()
            .await?;
        Self::read_body(endpoint, response).await
    }
}

#[async_trait]
impl AlumniApi for HttpAlumniApi {
    async fn fetch_profile(&self, credential: &Credential) -> Result<Profile, ApiCallError> {
        let response = self
            .http
            .get(self.url(PROFILE_PATH))
            .bearer_auth(credential.bearer())
            .send()
            .await?;
        let envelope: ProfileResponse = Self::read_body(Endpoint::FetchProfile, response).await?;
        Ok(envelope.data)
    }

    async fn update_profile(
        &self,
        credential: &Credential,
        draft: &ProfileDraft,
    ) -> Result<Profile, ApiCallError> {
        let response = self
            .http
            .put(self.url(PROFILE_PATH))
            .bearer_auth(credential.bearer())
            .json(draft)
            .send()
            .await?;
        let envelope: ProfileResponse = Self::read_body(Endpoint::UpdateProfile, response).await?;
        Ok(envelope.data)
    }

    async fn approve_request(
        &self,
        credential: &Credential,
        request_id: &RequestId,
    ) -> Result<ActionResponse, ApiCallError> {
        self.post_action(Endpoint::ApproveRequest, approve_path(request_id), credential)
            .await
    }

    async fn reject_request(
        &self,
        credential: &Credential,
        request_id: &RequestId,
    ) -> Result<ActionResponse, ApiCallError> {
        self.post_action(Endpoint::RejectRequest, reject_path(request_id), credential)
            .await
    }
}
