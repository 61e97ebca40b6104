use std::sync::Arc;

use shared::domain::{MentorshipRequest, RequestId};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub mod api;
pub mod config;
pub mod error;
pub mod mentee_request;
pub mod profile;
pub mod remote_action;
pub mod session;

pub use api::{AlumniApi, HttpAlumniApi};
pub use config::ClientSettings;
pub use error::ApiCallError;
pub use mentee_request::{ActionReceipt, CardView, Decision, MenteeRequestCard, RefreshCallback};
pub use profile::{ProfileController, ProfileView};
pub use remote_action::{ActionGate, ActionOutcome, ActionState, RemoteAction};
pub use session::{Credential, SessionContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeSeverity {
    Success,
    Error,
}

/// A user-facing alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: NoticeSeverity,
    pub title: &'static str,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            severity: NoticeSeverity::Success,
            title: "Success",
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: NoticeSeverity::Error,
            title: "Error",
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ClientEvent {
    Notice(Notice),
    ProfileChanged(ProfileView),
    RefreshRequested(RequestId),
}

/// Owns the API binding, the session and the event stream; hands out
/// controllers whose lifetimes are children of the client's own.
pub struct AlumniClient {
    api: Arc<dyn AlumniApi>,
    session: SessionContext,
    settings: ClientSettings,
    events: broadcast::Sender<ClientEvent>,
    lifetime: CancellationToken,
}

impl AlumniClient {
    pub fn new(settings: ClientSettings) -> Result<Self, ApiCallError> {
        let api = HttpAlumniApi::from_settings(&settings)?;
        info!(base_url = api.base_url(), "client: http api configured");
        Ok(Self::with_api(settings, Arc::new(api)))
    }

    pub fn with_api(settings: ClientSettings, api: Arc<dyn AlumniApi>) -> Self {
        let (events, _rx) = broadcast::channel(settings.event_capacity.max(1));
        Self {
            api,
            session: SessionContext::new(),
            settings,
            events,
            lifetime: CancellationToken::new(),
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub fn profile_screen(&self) -> Arc<ProfileController> {
        Arc::new(ProfileController::new(
            Arc::clone(&self.api),
            self.session.clone(),
            self.settings.default_photo_url.clone(),
            self.lifetime.child_token(),
            self.events.clone(),
        ))
    }

    pub fn request_card(
        &self,
        request: MentorshipRequest,
        on_refresh: impl Fn(&RequestId) + Send + Sync + 'static,
    ) -> MenteeRequestCard {
        MenteeRequestCard::new(
            Arc::clone(&self.api),
            self.session.clone(),
            request,
            Arc::new(on_refresh),
            self.lifetime.child_token(),
            self.events.clone(),
        )
    }

    /// Cancels every controller handed out by this client.
    pub fn shutdown(&self) {
        self.lifetime.cancel();
    }
}

impl Drop for AlumniClient {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}

#[cfg(test)]
#[path = "tests/fake_api.rs"]
mod fake_api;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod api_tests;
