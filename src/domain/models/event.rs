use super::CredentialStatus;
use super::Response;

/// Result of a credential check run off the loop for a pending send.
#[derive(Clone, Debug, PartialEq)]
pub struct CredentialCheck {
    pub request_id: u64,
    pub status: CredentialStatus,
}

/// Result of a provider call, addressed to the session that issued it.
#[derive(Clone, Debug, PartialEq)]
pub struct Completion {
    pub request_id: u64,
    pub session_id: String,
    pub response: Response,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Input(String),
    InputClosed(),
    CredentialChecked(CredentialCheck),
    Completion(Completion),
    UITick(),
}
