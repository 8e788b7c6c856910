//! Decoding of inbound events into typed interactions.
//!
//! Button payloads and command strings are classified exactly once, here.
//! Past this module the router only matches on [`Interaction`] variants.

use helpdesk_core::{ChatId, UserIdentity};

use crate::transport::MessageId;

/// Prefix of button payloads that select an FAQ topic.
pub const TOPIC_PREFIX: &str = "faq:";
/// Payload of the "Speak to a Human" button.
pub const ESCALATE_PAYLOAD: &str = "escalate";
/// Largest payload the transport accepts on a button.
pub const MAX_PAYLOAD_BYTES: usize = 64;

/// One user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    /// Entry command: show greeting and menu.
    Start,
    /// An FAQ button was pressed.
    MenuSelected(String),
    /// Any non-command text, including empty text.
    FreeText(String),
    /// The user asked for a human agent.
    EscalationRequested,
    /// A button payload that matches no known shape.
    Unrecognized(String),
}

impl Interaction {
    /// Classify the text of an ordinary message.
    ///
    /// `/start`, `/help` and `/menu` open the menu, `/human` and `/agent`
    /// escalate. Other commands also open the menu so they are never
    /// answered with silence. A trailing `@botname` on a command is ignored.
    pub fn from_text(text: &str) -> Self {
        let Some(command_line) = text.strip_prefix('/') else {
            return Interaction::FreeText(text.to_string());
        };
        let command = command_line
            .split_whitespace()
            .next()
            .unwrap_or("")
            .split('@')
            .next()
            .unwrap_or("");

        match command.to_ascii_lowercase().as_str() {
            "human" | "agent" => Interaction::EscalationRequested,
            _ => Interaction::Start,
        }
    }

    /// Classify a button payload.
    pub fn from_payload(payload: &str) -> Self {
        if payload == ESCALATE_PAYLOAD {
            return Interaction::EscalationRequested;
        }
        match payload.strip_prefix(TOPIC_PREFIX) {
            Some(key) => Interaction::MenuSelected(key.to_string()),
            None => Interaction::Unrecognized(payload.to_string()),
        }
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Interaction::Start => "start",
            Interaction::MenuSelected(_) => "menu_selected",
            Interaction::FreeText(_) => "free_text",
            Interaction::EscalationRequested => "escalation_requested",
            Interaction::Unrecognized(_) => "unrecognized",
        }
    }
}

/// Button payload for an FAQ topic.
pub fn encode_topic(key: &str) -> String {
    format!("{}{}", TOPIC_PREFIX, key)
}

/// Where an inbound event came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// A message typed by the user.
    Message,
    /// A button press on one of our messages.
    Button {
        callback_id: String,
        /// The message carrying the pressed button, when still accessible.
        message_id: Option<MessageId>,
    },
}

/// An inbound event as handed over by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub chat: ChatId,
    pub user: UserIdentity,
    pub origin: Origin,
    pub interaction: Interaction,
}

impl InboundEvent {
    /// Event for a typed message.
    pub fn message(chat: ChatId, user: UserIdentity, text: &str) -> Self {
        Self {
            chat,
            user,
            origin: Origin::Message,
            interaction: Interaction::from_text(text),
        }
    }

    /// Event for a button press.
    pub fn button(
        chat: ChatId,
        user: UserIdentity,
        callback_id: impl Into<String>,
        message_id: Option<MessageId>,
        payload: &str,
    ) -> Self {
        Self {
            chat,
            user,
            origin: Origin::Button {
                callback_id: callback_id.into(),
                message_id,
            },
            interaction: Interaction::from_payload(payload),
        }
    }

    /// Message to edit in place, if the event came from a button.
    pub fn source_message(&self) -> Option<MessageId> {
        match self.origin {
            Origin::Button { message_id, .. } => message_id,
            Origin::Message => None,
        }
    }
}
