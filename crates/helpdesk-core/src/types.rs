//! Domain types shared by every helpdesk crate.

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Identifiers
// =============================================================================

/// Identifier of a chat (private conversation, group or channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of the user behind an inbound event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Numeric user identifier assigned by the messaging platform.
    pub id: i64,
    /// Full display name (first and last name joined).
    pub display_name: String,
    /// Public handle without the leading `@`, when the user has one.
    pub username: Option<String>,
}

impl UserIdentity {
    pub fn new(id: i64, display_name: impl Into<String>, username: Option<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            username,
        }
    }
}

// =============================================================================
// FAQ
// =============================================================================

/// A static question/answer pair selectable from the menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    /// Stable identifier, encoded into button payloads.
    pub key: String,
    /// Button caption shown in the menu.
    pub label: String,
    pub question: String,
    pub answer: String,
}

impl FaqEntry {
    pub fn new(
        key: impl Into<String>,
        label: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Topics shipped with the bot when the config file defines none.
pub fn default_faq_entries() -> Vec<FaqEntry> {
    vec![
        FaqEntry::new(
            "shipping_info",
            "Shipping Information",
            "What are your shipping options and delivery times?",
            "We offer standard and express shipping. Standard delivery takes 5-7 business days, \
             while express takes 1-2 business days. Shipping costs vary by location and speed.",
        ),
        FaqEntry::new(
            "return_policy",
            "Return Policy",
            "What is your return policy?",
            "You can return most items within 30 days of purchase, provided they are in their \
             original condition. Please visit our website's 'Returns' section for detailed \
             instructions.",
        ),
        FaqEntry::new(
            "payment_methods",
            "Payment Methods",
            "What payment methods do you accept?",
            "We accept major credit cards (Visa, MasterCard, American Express), PayPal, and \
             bank transfers.",
        ),
    ]
}

// =============================================================================
// Escalation
// =============================================================================

/// Request for a human agent, delivered once to the operator chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscalationNotice {
    pub user_id: i64,
    pub display_name: String,
    pub username: Option<String>,
}

impl EscalationNotice {
    /// Build a notice from the requesting user's identity.
    pub fn from_user(user: &UserIdentity) -> Self {
        Self {
            user_id: user.id,
            display_name: user.display_name.clone(),
            username: user.username.clone(),
        }
    }

    /// Render the notice as Telegram HTML.
    pub fn render_html(&self) -> String {
        let handle = match &self.username {
            Some(name) => format!("@{}", escape_html(name)),
            None => "N/A".to_string(),
        };
        format!(
            "🚨 <b>Human Support Request!</b> 🚨\n\n\
             User: <a href=\"tg://user?id={id}\">{name}</a>\n\
             User ID: <code>{id}</code>\n\
             Username: {handle}\n\n\
             Please assist this user.",
            id = self.user_id,
            name = escape_html(&self.display_name),
            handle = handle,
        )
    }
}

/// Escape the characters Telegram's HTML parse mode treats as markup.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
