//! Messaging transport boundary.
//!
//! The router only talks to the chat platform through [`Messenger`], so the
//! Telegram client and the test recorder are interchangeable.

use std::future::Future;

use helpdesk_core::ChatId;

/// Identifier of a sent message, used for in-place edits.
pub type MessageId = i64;

/// Errors from the messaging transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("API rejected request ({code:?}): {description}")]
    Api {
        code: Option<i64>,
        description: String,
    },
    #[error("decode error: {0}")]
    Decode(String),
}

/// How the platform should interpret the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextFormat {
    #[default]
    Plain,
    Html,
}

/// A labeled button carrying an opaque payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub payload: String,
}

impl Button {
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

/// A message to send or to replace an existing message with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub text: String,
    pub format: TextFormat,
    /// Button rows rendered under the message.
    pub keyboard: Option<Vec<Vec<Button>>>,
}

impl OutgoingMessage {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: TextFormat::Plain,
            keyboard: None,
        }
    }

    pub fn html(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: TextFormat::Html,
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, rows: Vec<Vec<Button>>) -> Self {
        self.keyboard = Some(rows);
        self
    }
}

/// Operations the router needs from the chat platform.
pub trait Messenger: Send + Sync {
    /// Send a new message to a chat.
    fn send(
        &self,
        chat: ChatId,
        message: OutgoingMessage,
    ) -> impl Future<Output = Result<MessageId, TransportError>> + Send;

    /// Replace the text (and keyboard) of a previously sent message.
    fn edit(
        &self,
        chat: ChatId,
        message_id: MessageId,
        message: OutgoingMessage,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Acknowledge a button press so the client stops its progress indicator.
    fn acknowledge(
        &self,
        callback_id: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outgoing_constructors() {
        let msg = OutgoingMessage::plain("hi");
        assert_eq!(msg.format, TextFormat::Plain);
        assert!(msg.keyboard.is_none());

        let msg = OutgoingMessage::html("<b>hi</b>").with_keyboard(vec![vec![Button::new(
            "A", "faq:a",
        )]]);
        assert_eq!(msg.format, TextFormat::Html);
        assert_eq!(msg.keyboard.unwrap()[0][0].payload, "faq:a");
    }

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::Api {
            code: Some(400),
            description: "Bad Request: chat not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "API rejected request (Some(400)): Bad Request: chat not found"
        );
        assert_eq!(
            TransportError::Http("timed out".to_string()).to_string(),
            "HTTP error: timed out"
        );
    }
}
