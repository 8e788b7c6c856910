//! Telegram Bot API transport.
//!
//! Implements [`helpdesk_chat::Messenger`] over the HTTP Bot API and turns
//! long-polled updates into [`helpdesk_chat::InboundEvent`]s.

pub mod api;
pub mod client;
pub mod poller;
pub mod updates;

pub use client::TelegramClient;
pub use poller::UpdatePoller;
pub use updates::decode_update;
