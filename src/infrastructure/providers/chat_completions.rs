use std::time::Duration;

use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::from_reqwest;
use super::malformed;
use super::read_response;
use super::wire_model;
use crate::domain::models::ProviderError;
use crate::domain::models::ProviderName;
use crate::domain::models::ProviderRequest;
use crate::domain::models::SYSTEM_PROMPT;

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRequest {
    pub role: String,
    pub content: String,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<MessageRequest>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionChoice {
    pub message: CompletionMessage,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

impl CompletionRequest {
    pub fn new(request: &ProviderRequest) -> CompletionRequest {
        return CompletionRequest {
            model: wire_model(&request.model),
            messages: vec![
                MessageRequest {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                MessageRequest {
                    role: "user".to_string(),
                    content: request.user_prompt(),
                },
            ],
            temperature: 0.3,
            max_tokens: 4000,
        };
    }
}

/// One `POST {url}/v1/chat/completions` round trip, shared by the vendors
/// that speak the OpenAI envelope.
pub async fn complete(
    name: ProviderName,
    url: &str,
    api_key: &str,
    timeout: Duration,
    request: &ProviderRequest,
) -> Result<String, ProviderError> {
    let req = CompletionRequest::new(request);
    tracing::debug!(model = req.model, provider = name.label(), "Sending request");

    let res = reqwest::Client::new()
        .post(format!("{url}/v1/chat/completions"))
        .header("Authorization", format!("Bearer {api_key}"))
        .timeout(timeout)
        .json(&req)
        .send()
        .await
        .map_err(|err| return from_reqwest(name, err))?;

    let body: CompletionResponse = read_response(name, res).await?;
    return body
        .choices
        .into_iter()
        .next()
        .and_then(|e| return e.message.content)
        .filter(|e| return !e.is_empty())
        .ok_or_else(|| return malformed(name));
}
