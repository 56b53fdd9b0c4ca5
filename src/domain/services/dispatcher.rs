#[cfg(test)]
#[path = "dispatcher_test.rs"]
mod tests;

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinError;
use tokio::task::JoinHandle;
use tokio::time;

use crate::domain::models::Completion;
use crate::domain::models::CredentialCheck;
use crate::domain::models::CredentialStatus;
use crate::domain::models::Event;
use crate::domain::models::ProviderArc;
use crate::domain::models::ProviderError;
use crate::domain::models::ProviderRequest;
use crate::domain::models::Response;
use crate::domain::models::VALIDATION_TIMEOUT;

/// Runs provider calls on detached tasks and reports each outcome back to the
/// event loop as exactly one event.
#[derive(Clone)]
pub struct Dispatcher {
    tx: mpsc::UnboundedSender<Event>,
}

impl Dispatcher {
    pub fn new(tx: mpsc::UnboundedSender<Event>) -> Dispatcher {
        return Dispatcher { tx };
    }

    pub fn dispatch(
        &self,
        request_id: u64,
        provider: ProviderArc,
        request: ProviderRequest,
    ) -> JoinHandle<()> {
        let tx = self.tx.clone();
        let limit = provider.timeout();
        let label = provider.name().label();
        let session_id = request.session_id.to_string();

        tracing::debug!(
            request_id = request_id,
            provider = label,
            model = request.model,
            "Dispatching request"
        );

        return tokio::spawn(async move {
            let worker = tokio::spawn(async move {
                return provider.send(&request).await;
            });

            let response: Response = match guarded(worker, limit, label).await {
                Ok(res) => res.into(),
                Err(err) => Response::Failure(err),
            };

            if let Response::Failure(err) = &response {
                tracing::error!(request_id = request_id, kind = %err.kind(), error = %err, "Request failed");
            }

            let completion = Completion {
                request_id,
                session_id,
                response,
            };
            if tx.send(Event::Completion(completion)).is_err() {
                tracing::warn!(request_id = request_id, "Event loop closed before completion");
            }
        });
    }

    pub fn validate(&self, request_id: u64, provider: ProviderArc) -> JoinHandle<()> {
        let tx = self.tx.clone();
        let label = provider.name().label();

        return tokio::spawn(async move {
            let worker = tokio::spawn(async move {
                return provider.validate_credential().await;
            });

            let status = match guarded(worker, VALIDATION_TIMEOUT, label).await {
                Ok(status) => status,
                Err(err) => CredentialStatus::invalid(&err.to_string()),
            };

            let check = CredentialCheck { request_id, status };
            if tx.send(Event::CredentialChecked(check)).is_err() {
                tracing::warn!(request_id = request_id, "Event loop closed before validation");
            }
        });
    }
}

/// Waits on a worker for at most `limit`, turning panics and overruns into
/// failures.
async fn guarded<T>(
    mut worker: JoinHandle<T>,
    limit: Duration,
    label: &str,
) -> Result<T, ProviderError> {
    match time::timeout(limit, &mut worker).await {
        Ok(Ok(res)) => return Ok(res),
        Ok(Err(err)) => return Err(ProviderError::Internal(panic_message(err))),
        Err(_) => {
            worker.abort();
            return Err(ProviderError::Timeout(format!(
                "Request to {label} API timed out. Please try again."
            )));
        }
    }
}

fn panic_message(err: JoinError) -> String {
    if !err.is_panic() {
        return "Request worker was cancelled".to_string();
    }

    let payload = err.into_panic();
    let detail = if let Some(text) = payload.downcast_ref::<&str>() {
        text.to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.to_string()
    } else {
        "unknown panic".to_string()
    };

    return format!("Request worker panicked: {detail}");
}
