//! Error taxonomy for conversation routing.
//!
//! Every failure of an external call is converted into one of these variants
//! at the point of the call. None of them is shown to the user verbatim; the
//! router maps each to a fixed, polite reply.

use helpdesk_core::error::HelpdeskError;

use crate::transport::TransportError;

/// Why the synthesizer could not produce an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// The service answered, but with no usable text.
    EmptyResponse,
    /// The call itself failed (network, status, schema).
    Call(String),
}

impl std::fmt::Display for FailureCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureCause::EmptyResponse => write!(f, "empty response"),
            FailureCause::Call(reason) => write!(f, "call failed: {}", reason),
        }
    }
}

/// Errors from the conversation layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("configuration degraded: {0}")]
    ConfigurationDegraded(String),
    #[error("no FAQ topic for key: {0}")]
    LookupMiss(String),
    #[error("escalation delivery failed: {0}")]
    DeliveryFailure(String),
    #[error("no reference document loaded")]
    SynthesisUnavailable,
    #[error("could not answer {question:?}: {cause}")]
    SynthesisFailure { question: String, cause: FailureCause },
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl From<ChatError> for HelpdeskError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Transport(e) => HelpdeskError::Transport(e.to_string()),
            ChatError::ConfigurationDegraded(reason) => HelpdeskError::Document(reason),
            other => HelpdeskError::Completion(other.to_string()),
        }
    }
}
