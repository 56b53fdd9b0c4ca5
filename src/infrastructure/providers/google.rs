#[cfg(test)]
#[path = "google_test.rs"]
mod tests;

use std::time::Duration;

use async_trait::async_trait;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::check_key_format;
use super::from_reqwest;
use super::malformed;
use super::read_response;
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

pub const DEFAULT_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompletionRequest {
    contents: Vec<Content>,
    system_instruction: Content,
    generation_config: GenerationConfig,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

pub struct Google {
    url: String,
    api_key: String,
    timeout: Duration,
}

impl Google {
    pub fn new(settings: ProviderSettings) -> Google {
        let url = if settings.url.is_empty() {
            DEFAULT_URL.to_string()
        } else {
            settings.url
        };

        return Google {
            url: url.trim_end_matches('/').to_string(),
            api_key: settings.api_key,
            timeout: GENERATION_TIMEOUT,
        };
    }
}

#[async_trait]
impl Provider for Google {
    fn name(&self) -> ProviderName {
        return ProviderName::Google;
    }

    fn list_models(&self) -> Vec<ModelInfo> {
        return vec![
            ModelInfo::new("google/gemini-2.0-flash-001", "Gemini 2.0 Flash 001"),
            ModelInfo::new(
                "google/gemini-2.0-pro-exp-02-05:free",
                "Gemini 2.0 Pro Exp (Free)",
            ),
        ];
    }

    fn timeout(&self) -> Duration {
        return self.timeout;
    }

    /// Google keys carry no recognisable prefix; only the length is checked.
    #[allow(clippy::implicit_return)]
    async fn validate_credential(&self) -> CredentialStatus {
        if let Some(status) = check_key_format(self.name(), &self.api_key, None) {
            return status;
        }

        return CredentialStatus::valid("API key format looks valid");
    }

    #[allow(clippy::implicit_return)]
    async fn send(&self, request: &ProviderRequest) -> Result<String, ProviderError> {
        let req = CompletionRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: request.user_prompt(),
                }],
            }],
            system_instruction: Content {
                role: "system".to_string(),
                parts: vec![Part {
                    text: SYSTEM_PROMPT.to_string(),
                }],
            },
            generation_config: GenerationConfig {
                temperature: 0.2,
                top_p: 0.95,
                top_k: 40,
                max_output_tokens: 4096,
            },
        };

        let model = wire_model(&request.model);
        tracing::debug!(model = model, "Sending request to Google Gemini");

        let res = reqwest::Client::new()
            .post(format!(
                "{url}/v1beta/models/{model}:generateContent",
                url = self.url
            ))
            .query(&[("key", &self.api_key)])
            .timeout(self.timeout)
            .json(&req)
            .send()
            .await
            .map_err(|err| return from_reqwest(self.name(), err))?;

        let body: CompletionResponse = read_response(self.name(), res).await?;
        return body
            .candidates
            .into_iter()
            .next()
            .and_then(|e| return e.content.parts.into_iter().next())
            .map(|e| return e.text)
            .filter(|e| return !e.is_empty())
            .ok_or_else(|| return malformed(self.name()));
    }
}
