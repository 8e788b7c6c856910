//! User-facing texts and menu rendering.
//!
//! No reply ever includes transport or model error details.

use helpdesk_core::{escape_html, FaqEntry};

use crate::catalog::FaqCatalog;
use crate::interaction::{encode_topic, ESCALATE_PAYLOAD};
use crate::transport::{Button, OutgoingMessage};

pub const ESCALATE_LABEL: &str = "Speak to a Human";
pub const FOLLOW_UP_PROMPT: &str = "What else can I help you with?";
pub const TOPIC_NOT_FOUND: &str = "Sorry, I couldn't find information on that topic.";
pub const THINKING: &str = "Thinking... Please wait while I find the answer for you.";
pub const CONNECTING: &str = "Okay, I'm connecting you to a human agent. Please wait a moment.";
pub const AGENT_NOTIFIED: &str =
    "A human agent has been notified and will contact you shortly. Thank you for your patience!";
pub const ESCALATION_FAILED: &str = "Sorry, there was an issue connecting you to a human agent. \
     Please try again later or visit our website for more contact options.";
pub const DOCUMENT_UNAVAILABLE: &str = "I'm sorry, the FAQ document is not available right now. \
     Please choose an option from the menu or type /start to see the options again.";
pub const ANSWER_NOT_FOUND: &str = "I'm sorry, I couldn't find a direct answer to your question \
     in our FAQ document. Please try rephrasing your question, choose an option from the menu, \
     or request human support.";
pub const ANSWER_FAILED: &str = "I'm sorry, I encountered an error while trying to answer your \
     question. Please choose an option from the menu or request human support.";

/// Button rows: one per FAQ topic, then the escalation button.
pub fn menu_keyboard(catalog: &FaqCatalog) -> Vec<Vec<Button>> {
    catalog
        .topics()
        .map(|entry| vec![Button::new(&entry.label, encode_topic(&entry.key))])
        .chain(std::iter::once(vec![Button::new(
            ESCALATE_LABEL,
            ESCALATE_PAYLOAD,
        )]))
        .collect()
}

/// Greeting with the full menu.
pub fn greeting(display_name: &str, catalog: &FaqCatalog) -> OutgoingMessage {
    let name = if display_name.trim().is_empty() {
        "there"
    } else {
        display_name
    };
    OutgoingMessage::plain(format!(
        "Hi {}! 👋\n\
         Welcome to our customer service. How can I help you today?\n\n\
         Please choose from the options below, or type your question.",
        name
    ))
    .with_keyboard(menu_keyboard(catalog))
}

/// "What else can I help you with?" with the full menu.
pub fn follow_up(catalog: &FaqCatalog) -> OutgoingMessage {
    OutgoingMessage::plain(FOLLOW_UP_PROMPT).with_keyboard(menu_keyboard(catalog))
}

/// Question in bold followed by the stored answer.
pub fn faq_answer(entry: &FaqEntry) -> OutgoingMessage {
    OutgoingMessage::html(format!(
        "<b>{}</b>\n\n{}\n\n\
         Was this helpful? You can choose another option or request human support.",
        escape_html(&entry.question),
        escape_html(&entry.answer)
    ))
}
