#[cfg(test)]
#[path = "deepseek_test.rs"]
mod tests;

use std::time::Duration;

use async_trait::async_trait;

use super::chat_completions;
use super::check_key_format;
use crate::domain::models::CredentialStatus;
use crate::domain::models::ModelInfo;
use crate::domain::models::Provider;
use crate::domain::models::ProviderError;
use crate::domain::models::ProviderName;
use crate::domain::models::ProviderRequest;
use crate::domain::models::ProviderSettings;
use crate::domain::models::GENERATION_TIMEOUT;

pub const DEFAULT_URL: &str = "https://api.deepseek.com";

pub struct DeepSeek {
    url: String,
    api_key: String,
    timeout: Duration,
}

impl DeepSeek {
    pub fn new(settings: ProviderSettings) -> DeepSeek {
        let url = if settings.url.is_empty() {
            DEFAULT_URL.to_string()
        } else {
            settings.url
        };

        return DeepSeek {
            url: url.trim_end_matches('/').to_string(),
            api_key: settings.api_key,
            timeout: GENERATION_TIMEOUT,
        };
    }
}

#[async_trait]
impl Provider for DeepSeek {
    fn name(&self) -> ProviderName {
        return ProviderName::DeepSeek;
    }

    fn list_models(&self) -> Vec<ModelInfo> {
        return vec![
            ModelInfo::new("deepseek/deepseek-reasoner", "DeepSeek R1"),
            ModelInfo::new("deepseek/deepseek-chat", "DeepSeek Chat"),
        ];
    }

    fn timeout(&self) -> Duration {
        return self.timeout;
    }

    /// DeepSeek has no cheap authenticated endpoint, so only the key format
    /// is checked.
    #[allow(clippy::implicit_return)]
    async fn validate_credential(&self) -> CredentialStatus {
        if let Some(status) = check_key_format(self.name(), &self.api_key, Some("sk-")) {
            return status;
        }

        return CredentialStatus::valid("API key format looks valid");
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
