#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

pub mod anthropic;
mod chat_completions;
pub mod deepseek;
pub mod google;
pub mod openai;

use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_derive::Deserialize;

use crate::configuration::Config;
use crate::domain::models::CredentialStatus;
use crate::domain::models::ProviderArc;
use crate::domain::models::ProviderError;
use crate::domain::models::ProviderName;
use crate::domain::models::ProviderSelection;
use crate::domain::models::ProviderSettings;

pub struct ProviderManager {}

impl ProviderManager {
    pub fn get(name: ProviderName, settings: ProviderSettings) -> ProviderArc {
        match name {
            ProviderName::Anthropic => return Arc::new(anthropic::Anthropic::new(settings)),
            ProviderName::Google => return Arc::new(google::Google::new(settings)),
            ProviderName::DeepSeek => return Arc::new(deepseek::DeepSeek::new(settings)),
            ProviderName::OpenAI => return Arc::new(openai::OpenAI::new(settings)),
        }
    }

    /// Resolves the configured provider and model for a send. A missing key
    /// is reported here, before anything goes over the network.
    pub fn select(config: &Config) -> Result<ProviderSelection> {
        let name = config.provider()?;
        let settings = config.provider_settings(name);
        if settings.api_key.trim().is_empty() {
            bail!(
                "{} API key not set. Please add it to your config.",
                name.label()
            );
        }

        let model = settings.model.to_string();
        let provider = ProviderManager::get(name, settings);
        let model = if model.is_empty() {
            provider
                .list_models()
                .first()
                .map(|e| return e.id.to_string())
                .unwrap_or_default()
        } else {
            model
        };

        return Ok(ProviderSelection { provider, model });
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

/// Turns a namespaced model id (`vendor/model:tag`) into the name the
/// vendor's API expects.
pub fn wire_model(model: &str) -> String {
    let name = match model.split_once('/') {
        Some((_, rest)) => rest,
        None => model,
    };
    let name = match name.split_once(':') {
        Some((base, _)) => base,
        None => name,
    };

    return name.to_string();
}

/// Local checks run before any network validation. Returns the failure, if
/// there is one.
pub fn check_key_format(
    name: ProviderName,
    api_key: &str,
    prefix: Option<&str>,
) -> Option<CredentialStatus> {
    let key = api_key.trim();
    if key.is_empty() {
        return Some(CredentialStatus::invalid(&format!(
            "{} API key not set. Please add it to your config.",
            name.label()
        )));
    }
    if key.len() < 10 {
        return Some(CredentialStatus::invalid("API key appears to be invalid"));
    }
    if let Some(prefix) = prefix {
        if !key.starts_with(prefix) {
            return Some(CredentialStatus::invalid(&format!(
                "{} API keys should start with '{prefix}'",
                name.label()
            )));
        }
    }

    return None;
}

/// Reads a vendor reply, classifying every non-success into a
/// `ProviderError`.
pub async fn read_response<T: DeserializeOwned>(
    name: ProviderName,
    res: reqwest::Response,
) -> Result<T, ProviderError> {
    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|err| return from_reqwest(name, err))?;

    if status != StatusCode::OK {
        tracing::error!(
            status = status.as_u16(),
            provider = name.label(),
            "Failed to make completion request"
        );
        return Err(classify_failure(status, &body));
    }

    return serde_json::from_str::<T>(&body).map_err(|err| {
        tracing::error!(error = ?err, provider = name.label(), "Unexpected response structure");
        return malformed(name);
    });
}

pub fn malformed(name: ProviderName) -> ProviderError {
    return ProviderError::MalformedResponse(format!(
        "Unexpected response structure from {} API",
        name.label()
    ));
}

/// Non-200 replies: 401 is an auth failure, anything else carries the
/// vendor's error message or the status line.
pub fn classify_failure(status: StatusCode, body: &str) -> ProviderError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|e| return e.error.message)
        .filter(|e| return !e.is_empty());

    if status == StatusCode::UNAUTHORIZED {
        return ProviderError::Auth(
            message.unwrap_or_else(|| return "Invalid API key: Authentication failed".to_string()),
        );
    }

    return ProviderError::Provider {
        status: status.as_u16(),
        message: message.unwrap_or_else(|| {
            return status
                .canonical_reason()
                .unwrap_or("Unknown status")
                .to_string();
        }),
    };
}

/// Transport failures. The URL is dropped from the message since some vendors
/// carry the key in the query string.
pub fn from_reqwest(name: ProviderName, err: reqwest::Error) -> ProviderError {
    let err = err.without_url();
    if err.is_timeout() {
        return ProviderError::Timeout(format!(
            "Request to {} API timed out. Please try again.",
            name.label()
        ));
    }

    return ProviderError::Internal(format!(
        "Error communicating with {} API: {err}",
        name.label()
    ));
}

/// Classifies the reply of an authenticated "list models" call used to
/// check a key.
pub async fn validation_status(
    name: ProviderName,
    res: Result<reqwest::Response, reqwest::Error>,
) -> CredentialStatus {
    let res = match res {
        Ok(res) => res,
        Err(err) if err.is_timeout() => {
            return CredentialStatus::invalid(&format!(
                "Connection to {} API timed out",
                name.label()
            ));
        }
        Err(err) => {
            return CredentialStatus::invalid(&format!(
                "Error validating API key: {}",
                err.without_url()
            ));
        }
    };

    let status = res.status();
    if status == StatusCode::OK {
        return CredentialStatus::valid("API key is valid");
    }

    let body = res.text().await.unwrap_or_default();
    match classify_failure(status, &body) {
        ProviderError::Auth(message) => return CredentialStatus::invalid(&message),
        err => return CredentialStatus::invalid(&format!("API error: {err}")),
    }
}
