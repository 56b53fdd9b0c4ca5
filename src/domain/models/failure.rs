use thiserror::Error;

/// The classification every failed provider call is reduced to before it
/// leaves a worker task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum FailureKind {
    AuthError,
    Timeout,
    MalformedResponse,
    ProviderError,
    InternalError,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Credential missing, malformed or rejected (HTTP 401).
    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    Timeout(String),

    /// HTTP 200 with a payload that doesn't have the vendor's expected shape.
    #[error("{0}")]
    MalformedResponse(String),

    /// Any other non-200 status, with the vendor's message when one was sent.
    #[error("HTTP {status}: {message}")]
    Provider { status: u16, message: String },

    /// Faults inside the request pipeline, including worker panics and
    /// transport errors.
    #[error("{0}")]
    Internal(String),
}

impl ProviderError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ProviderError::Auth(_) => return FailureKind::AuthError,
            ProviderError::Timeout(_) => return FailureKind::Timeout,
            ProviderError::MalformedResponse(_) => return FailureKind::MalformedResponse,
            ProviderError::Provider { .. } => return FailureKind::ProviderError,
            ProviderError::Internal(_) => return FailureKind::InternalError,
        }
    }
}
