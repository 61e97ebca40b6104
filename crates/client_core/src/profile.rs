//! Own-profile screen: fetch on mount, edit three fields, persist.

use std::sync::Arc;

use shared::domain::{DraftField, Profile, ProfileDraft};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    api::AlumniApi,
    error::ApiCallError,
    remote_action::{ActionOutcome, RemoteAction},
    session::SessionContext,
    ClientEvent, Notice,
};

pub const LOAD_PROFILE_FAILED: &str = "Failed to load profile";
pub const UPDATE_PROFILE_FAILED: &str = "Failed to update profile";
pub const PROFILE_UPDATED: &str = "Profile updated successfully";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileView {
    Loading,
    Ready(Profile),
    Failed(String),
}

impl ProfileView {
    pub fn profile(&self) -> Option<&Profile> {
        match self {
            Self::Ready(profile) => Some(profile),
            Self::Loading | Self::Failed(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
struct ProfileScreen {
    view: ProfileView,
    draft: ProfileDraft,
    editor_open: bool,
}

impl Default for ProfileScreen {
    fn default() -> Self {
        Self {
            view: ProfileView::Loading,
            draft: ProfileDraft::default(),
            editor_open: false,
        }
    }
}

pub struct ProfileController {
    api: Arc<dyn AlumniApi>,
    session: SessionContext,
    default_photo_url: String,
    screen: Mutex<ProfileScreen>,
    load: RemoteAction<Profile>,
    submit: RemoteAction<Profile>,
    lifetime: CancellationToken,
    events: broadcast::Sender<ClientEvent>,
}

impl ProfileController {
    pub fn new(
        api: Arc<dyn AlumniApi>,
        session: SessionContext,
        default_photo_url: impl Into<String>,
        lifetime: CancellationToken,
        events: broadcast::Sender<ClientEvent>,
    ) -> Self {
        let load = RemoteAction::new(
            "load_profile",
            LOAD_PROFILE_FAILED,
            lifetime.clone(),
            events.clone(),
        );
        let submit = RemoteAction::new(
            "update_profile",
            UPDATE_PROFILE_FAILED,
            lifetime.clone(),
            events.clone(),
        );
        Self {
            api,
            session,
            default_photo_url: default_photo_url.into(),
            screen: Mutex::new(ProfileScreen::default()),
            load,
            submit,
            lifetime,
            events,
        }
    }

    /// Fetches the profile with the current credential. Success replaces
    /// both the displayed profile and the draft; failure is surfaced as
    /// `ProfileView::Failed`.
    pub async fn load_profile(&self) -> ActionOutcome<Profile> {
        let credential = self.session.credential();
        let api = Arc::clone(&self.api);
        let outcome = self
            .load
            .run(move || async move {
                let credential = credential.ok_or(ApiCallError::Unauthenticated)?;
                api.fetch_profile(&credential).await
            })
            .await;

        match &outcome {
            ActionOutcome::Succeeded(profile) => {
                let mut screen = self.screen.lock().await;
                screen.view = ProfileView::Ready(profile.clone());
                screen.draft = profile.draft();
                self.publish(&screen);
            }
            ActionOutcome::Failed(message) => {
                let mut screen = self.screen.lock().await;
                screen.view = ProfileView::Failed(message.clone());
                self.publish(&screen);
            }
            ActionOutcome::Busy | ActionOutcome::Closed | ActionOutcome::Cancelled => {}
        }
        outcome
    }

    /// Loads now and again after every credential change until unmounted.
    /// A cleared credential resets the screen instead of fetching.
    /// The task only holds a weak handle, so dropping the last `Arc`
    /// still runs `Drop` and stops it.
    pub fn spawn_credential_watch(self: &Arc<Self>) -> JoinHandle<()> {
        let controller = Arc::downgrade(self);
        let lifetime = self.lifetime.clone();
        let mut credentials = self.session.subscribe();
        tokio::spawn(async move {
            loop {
                let Some(screen) = controller.upgrade() else {
                    break;
                };
                let signed_in = credentials.borrow_and_update().is_some();
                if signed_in {
                    screen.load_profile().await;
                } else {
                    screen.reset().await;
                }
                drop(screen);

                tokio::select! {
                    biased;
                    _ = lifetime.cancelled() => break,
                    changed = credentials.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        debug!("profile: credential changed, reloading");
                    }
                }
            }
        })
    }

    /// Sends the draft. Success replaces the profile and closes the editor;
    /// failure leaves profile, draft and editor exactly as they were.
    pub async fn submit_edit(&self) -> ActionOutcome<Profile> {
        let draft = self.screen.lock().await.draft.clone();
        let credential = self.session.credential();
        let api = Arc::clone(&self.api);
        let outcome = self
            .submit
            .run(move || async move {
                let credential = credential.ok_or(ApiCallError::Unauthenticated)?;
                api.update_profile(&credential, &draft).await
            })
            .await;

        if let ActionOutcome::Succeeded(profile) = &outcome {
            let mut screen = self.screen.lock().await;
            screen.view = ProfileView::Ready(profile.clone());
            screen.editor_open = false;
            self.submit.notify(Notice::success(PROFILE_UPDATED));
            self.publish(&screen);
            info!("profile: update applied");
        }
        outcome
    }

    pub async fn view(&self) -> ProfileView {
        self.screen.lock().await.view.clone()
    }

    pub async fn draft(&self) -> ProfileDraft {
        self.screen.lock().await.draft.clone()
    }

    pub async fn edit_draft(&self, field: DraftField, value: impl Into<String>) {
        self.screen.lock().await.draft.set(field, value);
    }

    pub async fn open_editor(&self) {
        self.screen.lock().await.editor_open = true;
    }

    pub async fn close_editor(&self) {
        self.screen.lock().await.editor_open = false;
    }

    pub async fn is_editor_open(&self) -> bool {
        self.screen.lock().await.editor_open
    }

    pub fn is_submitting(&self) -> bool {
        self.submit.is_busy()
    }

    pub fn is_loading(&self) -> bool {
        self.load.is_busy()
    }

    pub async fn photo_url(&self) -> String {
        let screen = self.screen.lock().await;
        screen
            .view
            .profile()
            .map(|profile| profile.photo_or(&self.default_photo_url).to_string())
            .unwrap_or_else(|| self.default_photo_url.clone())
    }

    pub fn logout(&self) {
        self.session.logout();
    }

    pub fn unmount(&self) {
        self.lifetime.cancel();
    }

    async fn reset(&self) {
        let mut screen = self.screen.lock().await;
        *screen = ProfileScreen::default();
        self.publish(&screen);
    }

    fn publish(&self, screen: &ProfileScreen) {
        let _ = self
            .events
            .send(ClientEvent::ProfileChanged(screen.view.clone()));
    }
}

impl Drop for ProfileController {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}

#[cfg(test)]
#[path = "tests/profile_tests.rs"]
mod tests;
