//! Long-poll loop state.

use std::time::Duration;

use helpdesk_chat::TransportError;
use tracing::{debug, warn};

use crate::api::Update;
use crate::client::TelegramClient;

/// Delay before polling again after a failed `getUpdates`.
const RETRY_DELAY: Duration = Duration::from_secs(3);

/// Tracks the update offset so each update is delivered once.
#[derive(Debug)]
pub struct UpdatePoller {
    client: TelegramClient,
    offset: Option<i64>,
    retry_delay: Duration,
}

impl UpdatePoller {
    pub fn new(client: TelegramClient) -> Self {
        Self {
            client,
            offset: None,
            retry_delay: RETRY_DELAY,
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Next offset sent to `getUpdates`.
    pub fn offset(&self) -> Option<i64> {
        self.offset
    }

    /// Fetch the next batch and confirm everything in it.
    ///
    /// A failed poll is logged and retried after a delay; the caller only
    /// ever sees successful batches, which may be empty.
    pub async fn next_batch(&mut self) -> Vec<Update> {
        match self.client.get_updates(self.offset).await {
            Ok(updates) => {
                self.advance(&updates);
                if !updates.is_empty() {
                    debug!(count = updates.len(), offset = ?self.offset, "Received updates");
                }
                updates
            }
            Err(e) => {
                self.log_failure(&e);
                tokio::time::sleep(self.retry_delay).await;
                Vec::new()
            }
        }
    }

    fn advance(&mut self, updates: &[Update]) {
        if let Some(last) = updates.iter().map(|u| u.update_id).max() {
            self.offset = Some(self.offset.map_or(last + 1, |o| o.max(last + 1)));
        }
    }

    fn log_failure(&self, error: &TransportError) {
        warn!(error = %error, retry_in = ?self.retry_delay, "Polling for updates failed");
    }
}
