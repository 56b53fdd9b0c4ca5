#[cfg(test)]
#[path = "openai_test.rs"]
mod tests;

use std::time::Duration;

use async_trait::async_trait;

use super::chat_completions;
use super::check_key_format;
use super::validation_status;
use crate::domain::models::CredentialStatus;
use crate::domain::models::ModelInfo;
use crate::domain::models::Provider;
use crate::domain::models::ProviderError;
use crate::domain::models::ProviderName;
use crate::domain::models::ProviderRequest;
use crate::domain::models::ProviderSettings;
use crate::domain::models::GENERATION_TIMEOUT;
use crate::domain::models::VALIDATION_TIMEOUT;

pub const DEFAULT_URL: &str = "https://api.openai.com";

pub struct OpenAI {
    url: String,
    api_key: String,
    timeout: Duration,
}

impl OpenAI {
    pub fn new(settings: ProviderSettings) -> OpenAI {
        let url = if settings.url.is_empty() {
            DEFAULT_URL.to_string()
        } else {
            settings.url
        };

        return OpenAI {
            url: url.trim_end_matches('/').to_string(),
            api_key: settings.api_key,
            timeout: GENERATION_TIMEOUT,
        };
    }
}

#[async_trait]
impl Provider for OpenAI {
    fn name(&self) -> ProviderName {
        return ProviderName::OpenAI;
    }

    fn list_models(&self) -> Vec<ModelInfo> {
        return vec![ModelInfo::new("openai/gpt-4o-mini", "GPT-4o Mini")];
    }

    fn timeout(&self) -> Duration {
        return self.timeout;
    }

    #[allow(clippy::implicit_return)]
    async fn validate_credential(&self) -> CredentialStatus {
        if let Some(status) = check_key_format(self.name(), &self.api_key, Some("sk-")) {
            return status;
        }

        let res = reqwest::Client::new()
            .get(format!("{url}/v1/models", url = self.url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .timeout(VALIDATION_TIMEOUT.min(self.timeout))
            .send()
            .await;

        return validation_status(self.name(), res).await;
    }

    #[allow(clippy::implicit_return)]
    async fn send(&self, request: &ProviderRequest) -> Result<String, ProviderError> {
        return chat_completions::complete(
            self.name(),
            &self.url,
            &self.api_key,
            self.timeout,
            request,
        )
        .await;
    }
}
