use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::models::CredentialStatus;
use crate::domain::models::ModelInfo;
use crate::domain::models::Provider;
use crate::domain::models::ProviderError;
use crate::domain::models::ProviderName;
use crate::domain::models::ProviderRequest;

#[derive(Clone)]
pub enum StubReply {
    Text(String),
    Fail(ProviderError),
    Sleep(Duration),
    Panic,
}

/// In-memory provider that answers with a canned reply and counts calls.
pub struct StubProvider {
    reply: StubReply,
    credential: CredentialStatus,
    timeout: Duration,
    pub sends: Arc<AtomicUsize>,
    pub validations: Arc<AtomicUsize>,
}

impl StubProvider {
    pub fn new(reply: StubReply) -> StubProvider {
        return StubProvider {
            reply,
            credential: CredentialStatus::valid("API key is valid"),
            timeout: Duration::from_secs(5),
            sends: Arc::new(AtomicUsize::new(0)),
            validations: Arc::new(AtomicUsize::new(0)),
        };
    }

    pub fn with_credential(mut self, credential: CredentialStatus) -> StubProvider {
        self.credential = credential;
        return self;
    }

    pub fn with_timeout(mut self, timeout: Duration) -> StubProvider {
        self.timeout = timeout;
        return self;
    }
}

#[async_trait]
impl Provider for StubProvider {
    fn name(&self) -> ProviderName {
        return ProviderName::Anthropic;
    }

    fn list_models(&self) -> Vec<ModelInfo> {
        return vec![ModelInfo::new("anthropic/stub", "Stub")];
    }

    fn timeout(&self) -> Duration {
        return self.timeout;
    }

    #[allow(clippy::implicit_return)]
    async fn validate_credential(&self) -> CredentialStatus {
        self.validations.fetch_add(1, Ordering::SeqCst);
        return self.credential.clone();
    }

    #[allow(clippy::implicit_return)]
    async fn send(&self, request: &ProviderRequest) -> Result<String, ProviderError> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            StubReply::Text(text) => return Ok(text.to_string()),
            StubReply::Fail(err) => return Err(err.clone()),
            StubReply::Sleep(duration) => {
                tokio::time::sleep(*duration).await;
                return Ok(format!("Slept through {}", request.prompt));
            }
            StubReply::Panic => panic!("stub provider exploded"),
        }
    }
}
