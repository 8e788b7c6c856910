//! HTTP client for the Telegram Bot API.

use std::time::Duration;

use helpdesk_chat::transport::{
    Button, MessageId, Messenger, OutgoingMessage, TextFormat, TransportError,
};
use helpdesk_core::config::TelegramConfig;
use helpdesk_core::error::{HelpdeskError, Result};
use helpdesk_core::ChatId;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::api::{
    AnswerCallbackQuery, ApiResponse, EditMessageText, Empty, GetUpdates, InlineKeyboardButton,
    InlineKeyboardMarkup, Message, SendMessage, Update, User,
};

/// Update kinds requested from `getUpdates`.
pub const ALLOWED_UPDATES: &[&str] = &["message", "callback_query"];

/// Description Telegram returns when an edit would not change anything.
const NOT_MODIFIED: &str = "message is not modified";

/// Telegram's limit on the text of a single message.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Longest raw body quoted in a transport error.
const MAX_ERROR_BODY: usize = 256;

/// Bot API client. Cheap to clone.
#[derive(Clone)]
pub struct TelegramClient {
    client: reqwest::Client,
    /// `{api_base}/bot{token}`; never logged.
    base: String,
    poll_timeout_secs: u64,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let token = config.bot_token.trim();
        if token.is_empty() {
            return Err(HelpdeskError::Config("bot token is not set".to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("helpdesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HelpdeskError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base: format!("{}/bot{}", config.api_base.trim_end_matches('/'), token),
            poll_timeout_secs: config.poll_timeout_secs,
        })
    }

    /// Verify the credential. Returns the bot's own account.
    pub async fn get_me(&self) -> std::result::Result<User, TransportError> {
        self.call("getMe", &Empty {}).await
    }

    /// Long-poll for updates at or after `offset`.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
    ) -> std::result::Result<Vec<Update>, TransportError> {
        let params = GetUpdates {
            offset,
            timeout: self.poll_timeout_secs,
            allowed_updates: ALLOWED_UPDATES,
        };
        self.call("getUpdates", &params).await
    }

    async fn call<P, R>(&self, method: &str, params: &P) -> std::result::Result<R, TransportError>
    where
        P: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        debug!(method, "Bot API call");

        // The token is part of the URL, so it is stripped from every error.
        let response = self
            .client
            .post(format!("{}/{}", self.base, method))
            .json(params)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Http(e.without_url().to_string()))?;

        let envelope: ApiResponse<R> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(TransportError::Api {
                    code: Some(i64::from(status.as_u16())),
                    description: body.chars().take(MAX_ERROR_BODY).collect(),
                });
            }
            Err(e) => return Err(TransportError::Decode(format!("{}: {}", method, e))),
        };

        if !envelope.ok {
            return Err(TransportError::Api {
                code: envelope.error_code,
                description: envelope.description.unwrap_or_default(),
            });
        }
        envelope
            .result
            .ok_or_else(|| TransportError::Decode(format!("{}: response has no result", method)))
    }
}

/// Split `text` into pieces of at most `max_chars` characters, preferring
/// to break after a newline. Concatenating the pieces yields `text`.
pub(crate) fn split_text(text: &str, max_chars: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = text;
    while rest.chars().count() > max_chars {
        let hard = rest
            .char_indices()
            .nth(max_chars)
            .map_or(rest.len(), |(idx, _)| idx);
        let cut = match rest[..hard].rfind('\n') {
            Some(idx) if idx > 0 => idx + 1,
            _ => hard,
        };
        chunks.push(&rest[..cut]);
        rest = &rest[cut..];
    }
    chunks.push(rest);
    chunks
}

fn parse_mode(format: TextFormat) -> Option<&'static str> {
    match format {
        TextFormat::Plain => None,
        TextFormat::Html => Some("HTML"),
    }
}

fn markup(rows: Option<Vec<Vec<Button>>>) -> Option<InlineKeyboardMarkup> {
    rows.map(|rows| InlineKeyboardMarkup {
        inline_keyboard: rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|b| InlineKeyboardButton {
                        text: b.label,
                        callback_data: b.payload,
                    })
                    .collect()
            })
            .collect(),
    })
}

impl Messenger for TelegramClient {
    async fn send(
        &self,
        chat: ChatId,
        message: OutgoingMessage,
    ) -> std::result::Result<MessageId, TransportError> {
        let OutgoingMessage {
            text,
            format,
            mut keyboard,
        } = message;
        let chunks = split_text(&text, MAX_MESSAGE_CHARS);
        let last = chunks.len() - 1;

        // Long texts go out as consecutive messages; buttons ride on the last one.
        let mut message_id = 0;
        for (i, chunk) in chunks.into_iter().enumerate() {
            let params = SendMessage {
                chat_id: chat.0,
                text: chunk,
                parse_mode: parse_mode(format),
                reply_markup: if i == last { markup(keyboard.take()) } else { None },
            };
            let sent: Message = self.call("sendMessage", &params).await?;
            message_id = sent.message_id;
        }
        if last > 0 {
            debug!(%chat, parts = last + 1, "Long message split");
        }
        Ok(message_id)
    }

    async fn edit(
        &self,
        chat: ChatId,
        message_id: MessageId,
        message: OutgoingMessage,
    ) -> std::result::Result<(), TransportError> {
        let params = EditMessageText {
            chat_id: chat.0,
            message_id,
            text: &message.text,
            parse_mode: parse_mode(message.format),
            reply_markup: markup(message.keyboard),
        };
        // Result is the edited message, or `true` for inline messages.
        match self
            .call::<_, serde_json::Value>("editMessageText", &params)
            .await
        {
            Ok(_) => Ok(()),
            Err(TransportError::Api { description, .. }) if description.contains(NOT_MODIFIED) => {
                debug!(%chat, message_id, "Edit left message unchanged");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn acknowledge(&self, callback_id: &str) -> std::result::Result<(), TransportError> {
        let params = AnswerCallbackQuery {
            callback_query_id: callback_id,
        };
        let acknowledged: bool = self.call("answerCallbackQuery", &params).await?;
        if !acknowledged {
            warn!(callback_id, "Callback acknowledgement was not accepted");
        }
        Ok(())
    }
}
