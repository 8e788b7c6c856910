//! In-memory collaborators for tests and local development.
//!
//! Each mock is cheaply cloneable and shares its recorded state between
//! clones, so a test can hand one clone to the router and inspect another.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use helpdesk_core::error::HelpdeskError;
use helpdesk_core::ChatId;

use crate::completion::{CompletionError, CompletionRequest, CompletionResponse, CompletionService};
use crate::document::DocumentFetcher;
use crate::transport::{MessageId, Messenger, OutgoingMessage, TransportError};

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// =============================================================================
// RecordingMessenger
// =============================================================================

/// One call made against the [`RecordingMessenger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent {
        chat: ChatId,
        message_id: MessageId,
        message: OutgoingMessage,
    },
    Edited {
        chat: ChatId,
        message_id: MessageId,
        message: OutgoingMessage,
    },
    Acknowledged(String),
}

impl Delivery {
    /// Text carried by a send or edit.
    pub fn text(&self) -> Option<&str> {
        match self {
            Delivery::Sent { message, .. } | Delivery::Edited { message, .. } => {
                Some(&message.text)
            }
            Delivery::Acknowledged(_) => None,
        }
    }

    /// Whether the delivery rendered buttons.
    pub fn has_keyboard(&self) -> bool {
        match self {
            Delivery::Sent { message, .. } | Delivery::Edited { message, .. } => {
                message.keyboard.is_some()
            }
            Delivery::Acknowledged(_) => false,
        }
    }

    pub fn chat(&self) -> Option<ChatId> {
        match self {
            Delivery::Sent { chat, .. } | Delivery::Edited { chat, .. } => Some(*chat),
            Delivery::Acknowledged(_) => None,
        }
    }
}

#[derive(Debug, Default)]
struct RecorderState {
    deliveries: Vec<Delivery>,
    next_id: MessageId,
    unreachable: HashSet<ChatId>,
    failing_edits: bool,
    max_text_chars: Option<usize>,
}

impl RecorderState {
    fn check_length(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        match self.max_text_chars {
            Some(max) if message.text.chars().count() > max => Err(TransportError::Api {
                code: Some(400),
                description: "Bad Request: message is too long".to_string(),
            }),
            _ => Ok(()),
        }
    }
}

/// Messenger that records every call instead of talking to a platform.
#[derive(Debug, Clone, Default)]
pub struct RecordingMessenger {
    state: Arc<Mutex<RecorderState>>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send to `chat` fail with a transport error.
    pub fn unreachable(self, chat: ChatId) -> Self {
        lock(&self.state).unreachable.insert(chat);
        self
    }

    /// Make every edit fail, as when the original message was deleted.
    pub fn failing_edits(self) -> Self {
        lock(&self.state).failing_edits = true;
        self
    }

    /// Reject sends and edits whose text is longer than `max_chars`.
    pub fn rejecting_longer_than(self, max_chars: usize) -> Self {
        lock(&self.state).max_text_chars = Some(max_chars);
        self
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        lock(&self.state).deliveries.clone()
    }

    /// Deliveries addressed to `chat`, in order.
    pub fn deliveries_to(&self, chat: ChatId) -> Vec<Delivery> {
        self.deliveries()
            .into_iter()
            .filter(|d| d.chat() == Some(chat))
            .collect()
    }

    /// Texts addressed to `chat`, in order.
    pub fn texts_to(&self, chat: ChatId) -> Vec<String> {
        self.deliveries_to(chat)
            .iter()
            .filter_map(|d| d.text().map(str::to_string))
            .collect()
    }

    pub fn clear(&self) {
        lock(&self.state).deliveries.clear();
    }
}

impl Messenger for RecordingMessenger {
    async fn send(&self, chat: ChatId, message: OutgoingMessage) -> Result<MessageId, TransportError> {
        let mut state = lock(&self.state);
        if state.unreachable.contains(&chat) {
            return Err(TransportError::Api {
                code: Some(400),
                description: "Bad Request: chat not found".to_string(),
            });
        }
        state.check_length(&message)?;
        state.next_id += 1;
        let message_id = state.next_id;
        state.deliveries.push(Delivery::Sent {
            chat,
            message_id,
            message,
        });
        Ok(message_id)
    }

    async fn edit(
        &self,
        chat: ChatId,
        message_id: MessageId,
        message: OutgoingMessage,
    ) -> Result<(), TransportError> {
        let mut state = lock(&self.state);
        if state.failing_edits {
            return Err(TransportError::Api {
                code: Some(400),
                description: "Bad Request: message to edit not found".to_string(),
            });
        }
        state.check_length(&message)?;
        state.deliveries.push(Delivery::Edited {
            chat,
            message_id,
            message,
        });
        Ok(())
    }

    async fn acknowledge(&self, callback_id: &str) -> Result<(), TransportError> {
        lock(&self.state)
            .deliveries
            .push(Delivery::Acknowledged(callback_id.to_string()));
        Ok(())
    }
}

// =============================================================================
// ScriptedCompletion
// =============================================================================

#[derive(Debug)]
struct ScriptState {
    outcome: Result<CompletionResponse, CompletionError>,
    requests: Vec<CompletionRequest>,
}

/// Completion service that replays a fixed outcome and counts calls.
#[derive(Debug, Clone)]
pub struct ScriptedCompletion {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedCompletion {
    pub fn responding(response: CompletionResponse) -> Self {
        Self {
            state: Arc::new(Mutex::new(ScriptState {
                outcome: Ok(response),
                requests: Vec::new(),
            })),
        }
    }

    /// Respond with a single candidate holding `text`.
    pub fn answering(text: &str) -> Self {
        Self::responding(CompletionResponse::with_parts([text]))
    }

    pub fn failing(error: CompletionError) -> Self {
        Self {
            state: Arc::new(Mutex::new(ScriptState {
                outcome: Err(error),
                requests: Vec::new(),
            })),
        }
    }

    pub fn call_count(&self) -> usize {
        lock(&self.state).requests.len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        lock(&self.state).requests.clone()
    }
}

impl CompletionService for ScriptedCompletion {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        let mut state = lock(&self.state);
        state.requests.push(request.clone());
        state.outcome.clone()
    }
}

// =============================================================================
// StaticFetcher
// =============================================================================

#[derive(Debug)]
struct FetchState {
    outcome: Result<String, String>,
    calls: Vec<String>,
}

/// Document fetcher returning a fixed body or a fixed failure.
#[derive(Debug, Clone)]
pub struct StaticFetcher {
    state: Arc<Mutex<FetchState>>,
}

impl StaticFetcher {
    pub fn ok(body: &str) -> Self {
        Self::with_outcome(Ok(body.to_string()))
    }

    pub fn failing(reason: &str) -> Self {
        Self::with_outcome(Err(reason.to_string()))
    }

    fn with_outcome(outcome: Result<String, String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(FetchState {
                outcome,
                calls: Vec::new(),
            })),
        }
    }

    /// Locations fetched so far.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.state).calls.clone()
    }
}

impl DocumentFetcher for StaticFetcher {
    async fn fetch(&self, location: &str) -> Result<String, HelpdeskError> {
        let mut state = lock(&self.state);
        state.calls.push(location.to_string());
        state.outcome.clone().map_err(HelpdeskError::Document)
    }
}
