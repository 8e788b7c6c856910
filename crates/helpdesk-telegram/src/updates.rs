//! Conversion of Bot API updates into router events.

use helpdesk_chat::InboundEvent;
use helpdesk_core::{ChatId, UserIdentity};
use tracing::debug;

use crate::api::{CallbackQuery, Message, Update, User};

/// Turn an update into an event, or `None` for update kinds the bot ignores:
/// non-text messages, messages from bots or channels, and buttons without
/// callback data.
pub fn decode_update(update: &Update) -> Option<InboundEvent> {
    if let Some(query) = &update.callback_query {
        return decode_callback(update.update_id, query);
    }
    if let Some(message) = &update.message {
        return decode_message(update.update_id, message);
    }
    debug!(update_id = update.update_id, "Ignoring update without message or callback");
    None
}

fn decode_message(update_id: i64, message: &Message) -> Option<InboundEvent> {
    let Some(from) = message.from.as_ref().filter(|u| !u.is_bot) else {
        debug!(update_id, "Ignoring message without a human sender");
        return None;
    };
    let Some(text) = message.text.as_deref() else {
        debug!(update_id, "Ignoring non-text message");
        return None;
    };
    Some(InboundEvent::message(
        ChatId(message.chat.id),
        identity(from),
        text,
    ))
}

fn decode_callback(update_id: i64, query: &CallbackQuery) -> Option<InboundEvent> {
    let Some(data) = query.data.as_deref() else {
        debug!(update_id, "Ignoring callback without data");
        return None;
    };
    // Inline-mode buttons carry no message; a private chat shares the user's id.
    let chat = query
        .message
        .as_ref()
        .map_or(query.from.id, |m| m.chat.id);
    Some(InboundEvent::button(
        ChatId(chat),
        identity(&query.from),
        query.id.clone(),
        query.message.as_ref().map(|m| m.message_id),
        data,
    ))
}

/// Operator-facing identity of a Telegram user.
pub fn identity(user: &User) -> UserIdentity {
    UserIdentity::new(user.id, user.full_name(), user.username.clone())
}
