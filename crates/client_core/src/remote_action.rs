//! Tracked single-flight wrapper around one asynchronous API call.

use std::{
    borrow::Cow,
    future::Future,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use tokio::sync::{broadcast, Mutex, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{error::ApiCallError, ClientEvent, Notice};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionState<T> {
    Idle,
    Pending,
    Succeeded(T),
    Failed(String),
}

impl<T> ActionState<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome<T> {
    Succeeded(T),
    /// Carries the message that was shown to the user.
    Failed(String),
    /// Another run holding the same gate was still in flight.
    Busy,
    /// The gate was closed; the owner no longer offers this action.
    Closed,
    /// The owner was torn down; any late result was discarded.
    Cancelled,
}

impl<T> ActionOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }
}

/// One-permit admission shared by actions that must never overlap.
#[derive(Debug)]
pub struct ActionGate {
    permits: Semaphore,
    closed: AtomicBool,
}

impl Default for ActionGate {
    fn default() -> Self {
        Self {
            permits: Semaphore::new(1),
            closed: AtomicBool::new(false),
        }
    }
}

impl ActionGate {
    pub fn is_busy(&self) -> bool {
        self.permits.available_permits() == 0
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn reopen(&self) {
        self.closed.store(false, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

pub struct RemoteAction<T> {
    kind: &'static str,
    fallback_message: Cow<'static, str>,
    gate: Arc<ActionGate>,
    state: Mutex<ActionState<T>>,
    lifetime: CancellationToken,
    events: broadcast::Sender<ClientEvent>,
}

impl<T: Clone + Send> RemoteAction<T> {
    pub fn new(
        kind: &'static str,
        fallback_message: impl Into<Cow<'static, str>>,
        lifetime: CancellationToken,
        events: broadcast::Sender<ClientEvent>,
    ) -> Self {
        Self {
            kind,
            fallback_message: fallback_message.into(),
            gate: Arc::new(ActionGate::default()),
            state: Mutex::new(ActionState::Idle),
            lifetime,
            events,
        }
    }

    /// A sibling action that shares this action's gate and lifetime.
    pub fn linked<U: Clone + Send>(
        &self,
        kind: &'static str,
        fallback_message: impl Into<Cow<'static, str>>,
    ) -> RemoteAction<U> {
        RemoteAction {
            kind,
            fallback_message: fallback_message.into(),
            gate: Arc::clone(&self.gate),
            state: Mutex::new(ActionState::Idle),
            lifetime: self.lifetime.clone(),
            events: self.events.clone(),
        }
    }

    pub fn gate(&self) -> Arc<ActionGate> {
        Arc::clone(&self.gate)
    }

    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }

    pub async fn state(&self) -> ActionState<T> {
        self.state.lock().await.clone()
    }

    pub async fn run<F, Fut>(&self, call: F) -> ActionOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiCallError>>,
    {
        self.run_then(call, |_| {}).await
    }

    /// Runs `call` unless the gate is held or closed. `on_success` fires
    /// exactly once per successful run, while the gate is still held.
    pub async fn run_then<F, Fut, S>(&self, call: F, on_success: S) -> ActionOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiCallError>>,
        S: FnOnce(&T),
    {
        if self.lifetime.is_cancelled() {
            return ActionOutcome::Cancelled;
        }
        let Ok(_permit) = self.gate.permits.try_acquire() else {
            debug!(action = self.kind, "remote action: trigger ignored while in flight");
            return ActionOutcome::Busy;
        };
        if self.gate.is_closed() {
            debug!(action = self.kind, "remote action: trigger ignored on closed gate");
            return ActionOutcome::Closed;
        }

        let previous = std::mem::replace(&mut *self.state.lock().await, ActionState::Pending);
        debug!(action = self.kind, "remote action: started");

        let result = tokio::select! {
            biased;
            _ = self.lifetime.cancelled() => None,
            result = call() => Some(result),
        };
        let Some(result) = result.filter(|_| !self.lifetime.is_cancelled()) else {
            info!(action = self.kind, "remote action: owner gone, discarding result");
            *self.state.lock().await = previous;
            return ActionOutcome::Cancelled;
        };

        match result {
            Ok(output) => {
                *self.state.lock().await = ActionState::Succeeded(output.clone());
                info!(action = self.kind, "remote action: succeeded");
                on_success(&output);
                ActionOutcome::Succeeded(output)
            }
            Err(err) => {
                let message = err
                    .user_message()
                    .map(str::to_owned)
                    .unwrap_or_else(|| self.fallback_message.to_string());
                warn!(action = self.kind, error = %err, "remote action: failed");
                *self.state.lock().await = ActionState::Failed(message.clone());
                self.notify(Notice::error(message.clone()));
                ActionOutcome::Failed(message)
            }
        }
    }

    pub fn notify(&self, notice: Notice) {
        let _ = self.events.send(ClientEvent::Notice(notice));
    }
}

#[cfg(test)]
#[path = "tests/remote_action_tests.rs"]
mod tests;
