#[cfg(test)]
#[path = "provider_test.rs"]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

use super::ProviderError;

/// Upper bound for a single generation request.
pub const GENERATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Upper bound for a credential check.
pub const VALIDATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared by every vendor.
pub const SYSTEM_PROMPT: &str = r#"You are Meshchat, an AI assistant specialized in helping users with 3D modeling in Blender.
Your primary goal is to generate Python code using Blender's Python API (bpy) to help users create and modify 3D models.

When the user asks you to create or modify 3D models:
1. Generate working Python code that accomplishes the user's request
2. Surround your code with triple backticks (```)
3. Explain briefly what the code does
4. Keep explanations concise - users primarily need working code

Some important guidelines:
- Use `bpy.context.selected_objects` to work with what the user has selected
- Respect the current edit mode the user is in
- Provide code that works with Blender 3.0 or later
- Make your code robust with error checking where appropriate
- Assume your code will be executed in the main Blender Python context

IMPORTANT: When given information about the current scene, use it to tailor your code to the user's specific context."#;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, EnumVariantNames, strum::Display,
)]
#[strum(serialize_all = "lowercase")]
pub enum ProviderName {
    Anthropic,
    Google,
    DeepSeek,
    OpenAI,
}

impl ProviderName {
    pub fn parse(text: &str) -> Option<ProviderName> {
        return ProviderName::iter().find(|e| return e.to_string() == text);
    }

    /// Human readable vendor name used in messages.
    pub fn label(&self) -> &'static str {
        match self {
            ProviderName::Anthropic => return "Anthropic",
            ProviderName::Google => return "Google Gemini",
            ProviderName::DeepSeek => return "DeepSeek",
            ProviderName::OpenAI => return "OpenAI",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelInfo {
    pub id: String,
    pub display_name: String,
}

impl ModelInfo {
    pub fn new(id: &str, display_name: &str) -> ModelInfo {
        return ModelInfo {
            id: id.to_string(),
            display_name: display_name.to_string(),
        };
    }
}

/// The per-provider slice of configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProviderSettings {
    pub api_key: String,
    pub model: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProviderRequest {
    pub prompt: String,
    pub context: Value,
    pub model: String,
    pub session_id: String,
}

impl ProviderRequest {
    /// The user turn sent to every vendor: scene snapshot, then the request.
    pub fn user_prompt(&self) -> String {
        let context = serde_json::to_string_pretty(&self.context)
            .unwrap_or_else(|_| return self.context.to_string());

        return format!(
            "Here's information about my current Blender scene:\n{context}\n\nMy request: {prompt}\n\nPlease respond with Python code that I can run in Blender to accomplish this.",
            prompt = self.prompt
        );
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Response {
    Success { text: String },
    Failure(ProviderError),
}

impl From<Result<String, ProviderError>> for Response {
    fn from(res: Result<String, ProviderError>) -> Response {
        match res {
            Ok(text) => return Response::Success { text },
            Err(err) => return Response::Failure(err),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialStatus {
    pub valid: bool,
    pub message: String,
}

impl CredentialStatus {
    pub fn valid(message: &str) -> CredentialStatus {
        return CredentialStatus {
            valid: true,
            message: message.to_string(),
        };
    }

    pub fn invalid(message: &str) -> CredentialStatus {
        return CredentialStatus {
            valid: false,
            message: message.to_string(),
        };
    }
}

#[async_trait]
pub trait Provider {
    fn name(&self) -> ProviderName;

    /// Models the provider can be asked for, in display order. The first
    /// entry is the default model.
    fn list_models(&self) -> Vec<ModelInfo>;

    /// The longest a `send` may take before it is reported as a timeout.
    fn timeout(&self) -> Duration {
        return GENERATION_TIMEOUT;
    }

    /// Checks the configured API key, locally and, where the vendor offers a
    /// cheap authenticated endpoint, against the API.
    async fn validate_credential(&self) -> CredentialStatus;

    /// Sends one prompt and waits for the full answer.
    async fn send(&self, request: &ProviderRequest) -> Result<String, ProviderError>;
}

pub type ProviderArc = Arc<dyn Provider + Send + Sync>;

/// A provider resolved from configuration together with the model to ask.
#[derive(Clone)]
pub struct ProviderSelection {
    pub provider: ProviderArc,
    pub model: String,
}
