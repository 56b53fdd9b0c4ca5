#[cfg(test)]
#[path = "anthropic_test.rs"]
mod tests;

use std::time::Duration;

use async_trait::async_trait;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::check_key_format;
use super::from_reqwest;
use super::malformed;
use super::read_response;
use super::validation_status;
use super::wire_model;
use crate::domain::models::CredentialStatus;
use crate::domain::models::ModelInfo;
use crate::domain::models::Provider;
use crate::domain::models::ProviderError;
use crate::domain::models::ProviderName;
use crate::domain::models::ProviderRequest;
use crate::domain::models::ProviderSettings;
use crate::domain::models::GENERATION_TIMEOUT;
use crate::domain::models::SYSTEM_PROMPT;
use crate::domain::models::VALIDATION_TIMEOUT;

pub const DEFAULT_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ContentPart {
    #[serde(rename = "type")]
    _type: String,
    #[serde(default)]
    text: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct MessageRequest {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CompletionRequest {
    model: String,
    system: String,
    messages: Vec<MessageRequest>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    content: Vec<ContentPart>,
}

pub struct Anthropic {
    url: String,
    api_key: String,
    timeout: Duration,
}

impl Anthropic {
    pub fn new(settings: ProviderSettings) -> Anthropic {
        let url = if settings.url.is_empty() {
            DEFAULT_URL.to_string()
        } else {
            settings.url
        };

        return Anthropic {
            url: url.trim_end_matches('/').to_string(),
            api_key: settings.api_key,
            timeout: GENERATION_TIMEOUT,
        };
    }
}

#[async_trait]
impl Provider for Anthropic {
    fn name(&self) -> ProviderName {
        return ProviderName::Anthropic;
    }

    fn list_models(&self) -> Vec<ModelInfo> {
        return vec![
            ModelInfo::new("anthropic/claude-3-7-sonnet-latest", "Claude 3.7 Sonnet"),
            ModelInfo::new("anthropic/claude-3-5-haiku-latest", "Claude 3.5 Haiku"),
        ];
    }

    fn timeout(&self) -> Duration {
        return self.timeout;
    }

    #[allow(clippy::implicit_return)]
    async fn validate_credential(&self) -> CredentialStatus {
        if let Some(status) = check_key_format(self.name(), &self.api_key, Some("sk-ant-")) {
            return status;
        }

        let res = reqwest::Client::new()
            .get(format!("{url}/v1/models", url = self.url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .timeout(VALIDATION_TIMEOUT.min(self.timeout))
            .send()
            .await;

        return validation_status(self.name(), res).await;
    }

    #[allow(clippy::implicit_return)]
    async fn send(&self, request: &ProviderRequest) -> Result<String, ProviderError> {
        let req = CompletionRequest {
            model: wire_model(&request.model),
            system: SYSTEM_PROMPT.to_string(),
            messages: vec![MessageRequest {
                role: "user".to_string(),
                content: vec![ContentPart {
                    _type: "text".to_string(),
                    text: request.user_prompt(),
                }],
            }],
            max_tokens: 4000,
            temperature: 0.3,
        };

        tracing::debug!(model = req.model, "Sending request to Anthropic");

        let res = reqwest::Client::new()
            .post(format!("{url}/v1/messages", url = self.url))
            .header("x-api-key", &self.api_key)
            .header("content-type", "application/json")
            .header("anthropic-version", API_VERSION)
            .timeout(self.timeout)
            .json(&req)
            .send()
            .await
            .map_err(|err| return from_reqwest(self.name(), err))?;

        let body: CompletionResponse = read_response(self.name(), res).await?;
        return body
            .content
            .into_iter()
            .find(|e| return e._type == "text" && !e.text.is_empty())
            .map(|e| return e.text)
            .ok_or_else(|| return malformed(self.name()));
    }
}
