//! Mentee request card: approve or reject one pending request.

use std::sync::Arc;

use shared::domain::{MentorshipRequest, RequestId};
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    api::AlumniApi,
    error::ApiCallError,
    remote_action::{ActionGate, ActionOutcome, RemoteAction},
    session::SessionContext,
    ClientEvent, Notice,
};

pub const APPROVE_FAILED: &str = "Failed to approve request";
pub const REJECT_FAILED: &str = "Failed to reject request";

/// Invoked once per applied decision so the parent list can re-fetch.
pub type RefreshCallback = Arc<dyn Fn(&RequestId) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    fn kind(self) -> &'static str {
        match self {
            Self::Approve => "approve_request",
            Self::Reject => "reject_request",
        }
    }
}

/// A decision the server confirmed with `status: "success"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReceipt {
    pub request_id: RequestId,
    pub decision: Decision,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardView {
    /// Both buttons render; `enabled` is false while either call is pending.
    Actions {
        approving: bool,
        rejecting: bool,
        enabled: bool,
    },
    /// A decision was applied; waiting for the parent to hand in a fresh snapshot.
    AwaitingRefresh,
    /// Terminal status; the label replaces the buttons for good.
    Closed { label: &'static str },
}

pub struct MenteeRequestCard {
    api: Arc<dyn AlumniApi>,
    session: SessionContext,
    snapshot: RwLock<MentorshipRequest>,
    approve: RemoteAction<ActionReceipt>,
    reject: RemoteAction<ActionReceipt>,
    on_refresh: RefreshCallback,
    lifetime: CancellationToken,
    events: broadcast::Sender<ClientEvent>,
}

impl MenteeRequestCard {
    pub fn new(
        api: Arc<dyn AlumniApi>,
        session: SessionContext,
        request: MentorshipRequest,
        on_refresh: RefreshCallback,
        lifetime: CancellationToken,
        events: broadcast::Sender<ClientEvent>,
    ) -> Self {
        let approve = RemoteAction::new(
            Decision::Approve.kind(),
            APPROVE_FAILED,
            lifetime.clone(),
            events.clone(),
        );
        let reject = approve.linked(Decision::Reject.kind(), REJECT_FAILED);
        if request.status.is_terminal() {
            approve.gate().close();
        }
        Self {
            api,
            session,
            snapshot: RwLock::new(request),
            approve,
            reject,
            on_refresh,
            lifetime,
            events,
        }
    }

    pub async fn approve(&self) -> ActionOutcome<ActionReceipt> {
        self.decide(Decision::Approve).await
    }

    pub async fn reject(&self) -> ActionOutcome<ActionReceipt> {
        self.decide(Decision::Reject).await
    }

    async fn decide(&self, decision: Decision) -> ActionOutcome<ActionReceipt> {
        let request_id = self.snapshot.read().await.request_id.clone();
        let credential = self.session.credential();
        let api = Arc::clone(&self.api);
        let action = match decision {
            Decision::Approve => &self.approve,
            Decision::Reject => &self.reject,
        };
        let gate: Arc<ActionGate> = action.gate();
        let on_refresh = Arc::clone(&self.on_refresh);
        let events = self.events.clone();

        action
            .run_then(
                move || async move {
                    let credential = credential.ok_or(ApiCallError::Unauthenticated)?;
                    let response = match decision {
                        Decision::Approve => api.approve_request(&credential, &request_id).await?,
                        Decision::Reject => api.reject_request(&credential, &request_id).await?,
                    };
                    if !response.is_success() {
                        return Err(ApiCallError::Rejected {
                            message: response.message,
                        });
                    }
                    Ok(ActionReceipt {
                        request_id,
                        decision,
                        message: response.message,
                    })
                },
                move |receipt| {
                    gate.close();
                    info!(
                        request_id = %receipt.request_id,
                        action = decision.kind(),
                        "mentee request: decision applied"
                    );
                    let _ = events.send(ClientEvent::Notice(Notice::success(
                        receipt.message.clone(),
                    )));
                    let _ = events.send(ClientEvent::RefreshRequested(
                        receipt.request_id.clone(),
                    ));
                    (*on_refresh)(&receipt.request_id);
                },
            )
            .await
    }

    /// Takes a fresh snapshot from the parent list. Actions reopen unless
    /// the new status is terminal.
    pub async fn replace_snapshot(&self, request: MentorshipRequest) {
        let gate = self.approve.gate();
        if request.status.is_terminal() {
            gate.close();
        } else {
            gate.reopen();
        }
        debug!(
            request_id = %request.request_id,
            status = request.status.as_wire(),
            "mentee request: snapshot replaced"
        );
        *self.snapshot.write().await = request;
    }

    pub async fn view(&self) -> CardView {
        let snapshot = self.snapshot.read().await;
        if let Some(label) = snapshot.status.label() {
            return CardView::Closed { label };
        }
        drop(snapshot);

        if self.approve.gate().is_closed() {
            return CardView::AwaitingRefresh;
        }
        CardView::Actions {
            approving: self.approve.state().await.is_pending(),
            rejecting: self.reject.state().await.is_pending(),
            enabled: !self.approve.is_busy(),
        }
    }

    pub async fn snapshot(&self) -> MentorshipRequest {
        self.snapshot.read().await.clone()
    }

    /// Label/value rows the card renders above its buttons.
    pub async fn detail_rows(&self) -> Vec<(&'static str, String)> {
        let snapshot = self.snapshot.read().await;
        vec![
            ("Nama Mentee", snapshot.mentee_name.clone()),
            ("Fokus Program", snapshot.question.clone()),
            ("Lulusan tahun", snapshot.graduation.clone()),
        ]
    }

    pub fn unmount(&self) {
        self.lifetime.cancel();
    }
}

impl Drop for MenteeRequestCard {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}

#[cfg(test)]
#[path = "tests/mentee_request_tests.rs"]
mod tests;
