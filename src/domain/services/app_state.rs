#[cfg(test)]
#[path = "app_state_test.rs"]
mod tests;

use anyhow::Result;
use thiserror::Error;

use super::extract_code;
use super::ConversationStore;
use super::Dispatcher;
use super::StoreError;
use crate::domain::models::Attachment;
use crate::domain::models::Author;
use crate::domain::models::ChatPolicy;
use crate::domain::models::Completion;
use crate::domain::models::CredentialCheck;
use crate::domain::models::Message;
use crate::domain::models::ProviderError;
use crate::domain::models::ProviderRequest;
use crate::domain::models::ProviderSelection;
use crate::domain::models::Response;
use crate::domain::models::SceneContextSource;

/// Where a send is in its lifecycle. Anything but `Idle` means the store is
/// busy and new sends are refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendPhase {
    Idle,
    Validating,
    AwaitingResponse,
}

/// Reasons a send never reached the provider. History is left untouched.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum SendRejection {
    #[error("Please enter a message")]
    EmptyInput,

    #[error("Already processing a request")]
    Busy,

    #[error("{0}")]
    Provider(String),

    #[error("{0}")]
    Credential(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

struct PendingSend {
    request_id: u64,
    selection: ProviderSelection,
}

struct InFlight {
    request_id: u64,
    session_id: String,
}

/// A message that was added to a session since the loop last looked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppendedMessage {
    pub session_id: String,
    pub message: Message,
}

pub struct AppState {
    pub store: ConversationStore,
    pub policy: ChatPolicy,
    pub draft: String,
    pub attachment: Option<Attachment>,
    phase: SendPhase,
    pending: Option<PendingSend>,
    in_flight: Option<InFlight>,
    next_request_id: u64,
    last_prompt: Option<String>,
    appended: Vec<AppendedMessage>,
}

impl AppState {
    pub fn new(mut store: ConversationStore, policy: ChatPolicy) -> AppState {
        store.set_max_message_count(policy.max_message_count);
        store.ensure_session();

        return AppState {
            store,
            policy,
            draft: "".to_string(),
            attachment: None,
            phase: SendPhase::Idle,
            pending: None,
            in_flight: None,
            next_request_id: 1,
            last_prompt: None,
            appended: vec![],
        };
    }

    pub fn phase(&self) -> SendPhase {
        return self.phase;
    }

    pub fn is_busy(&self) -> bool {
        return self.phase != SendPhase::Idle;
    }

    pub fn last_prompt(&self) -> Option<&str> {
        return self.last_prompt.as_deref();
    }

    /// Starts sending the current draft: rejects empty input and overlapping
    /// sends, resolves the provider, then hands credential validation to the
    /// dispatcher. The result comes back as `Event::CredentialChecked`.
    pub fn send_message<F>(&mut self, resolve: F, dispatcher: &Dispatcher) -> Result<(), SendRejection>
    where
        F: FnOnce() -> Result<ProviderSelection>,
    {
        if self.draft.trim().is_empty() {
            return Err(SendRejection::EmptyInput);
        }
        if self.is_busy() {
            return Err(SendRejection::Busy);
        }

        let selection = resolve().map_err(|err| return SendRejection::Provider(err.to_string()))?;

        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.phase = SendPhase::Validating;

        tracing::debug!(
            request_id = request_id,
            provider = %selection.provider.name(),
            "Validating credential"
        );

        dispatcher.validate(request_id, selection.provider.clone());
        self.pending = Some(PendingSend {
            request_id,
            selection,
        });

        return Ok(());
    }

    /// Continues a send once its credential check is back: records the user
    /// message, snapshots the scene and dispatches the request.
    pub async fn handle_credential_check(
        &mut self,
        check: CredentialCheck,
        scene: &(dyn SceneContextSource + Send + Sync),
        dispatcher: &Dispatcher,
    ) -> Result<(), SendRejection> {
        let pending = match self.pending.take() {
            Some(pending) if pending.request_id == check.request_id => pending,
            other => {
                self.pending = other;
                tracing::warn!(request_id = check.request_id, "Ignoring stale credential check");
                return Ok(());
            }
        };

        if !check.status.valid {
            self.phase = SendPhase::Idle;
            return Err(SendRejection::Credential(check.status.message));
        }

        let session_id = self.store.active_session_id();
        let prompt = self.draft.to_string();
        let message = Message::new(Author::User, &prompt).with_attachment(self.attachment.clone());
        if let Err(err) = self.store.append_message(&session_id, message.clone()) {
            self.phase = SendPhase::Idle;
            return Err(err.into());
        }

        self.push_appended(&session_id, message);
        self.draft.clear();
        self.attachment = None;
        self.last_prompt = Some(prompt.to_string());
        if self.policy.auto_scroll {
            self.reveal_last(&session_id);
        }

        self.phase = SendPhase::AwaitingResponse;

        let context = match scene.snapshot().await {
            Ok(context) => context,
            Err(err) => {
                tracing::error!(error = ?err, "Failed to read scene context");
                self.phase = SendPhase::Idle;
                self.append_reply(
                    &session_id,
                    Message::from_failure(&ProviderError::Internal(format!(
                        "Failed to read scene context: {err}"
                    ))),
                );
                return Ok(());
            }
        };

        self.in_flight = Some(InFlight {
            request_id: pending.request_id,
            session_id: session_id.to_string(),
        });

        let request = ProviderRequest {
            prompt,
            context,
            model: pending.selection.model.to_string(),
            session_id,
        };
        dispatcher.dispatch(pending.request_id, pending.selection.provider, request);

        return Ok(());
    }

    /// Applies a provider result to the session that issued it and returns
    /// the store to `Idle`.
    pub fn handle_completion(&mut self, completion: Completion) {
        match &self.in_flight {
            Some(in_flight) if in_flight.request_id == completion.request_id => {}
            _ => {
                tracing::warn!(
                    request_id = completion.request_id,
                    "Ignoring stale completion"
                );
                return;
            }
        }

        self.in_flight = None;
        self.phase = SendPhase::Idle;

        let message = match completion.response {
            Response::Success { text } => {
                let code = extract_code(&text);
                Message::new(Author::Assistant, &text).with_code(code)
            }
            Response::Failure(err) => Message::from_failure(&err),
        };

        self.append_reply(&completion.session_id, message);
    }

    /// Messages added since the last call, oldest first.
    pub fn drain_appended(&mut self) -> Vec<AppendedMessage> {
        return self.appended.drain(..).collect();
    }

    fn append_reply(&mut self, session_id: &str, message: Message) {
        if let Err(err) = self.store.append_message(session_id, message.clone()) {
            tracing::warn!(error = %err, session_id = session_id, "Dropping reply for missing session");
            return;
        }

        self.reveal_last(session_id);
        self.push_appended(session_id, message);
    }

    fn reveal_last(&mut self, session_id: &str) {
        if let Some(session) = self.store.session_mut(session_id) {
            session.last();
        }
    }

    fn push_appended(&mut self, session_id: &str, message: Message) {
        self.appended.push(AppendedMessage {
            session_id: session_id.to_string(),
            message,
        });
    }
}
