//! Gemini `generateContent` client.

use helpdesk_chat::completion::{
    CompletionError, CompletionRequest, CompletionResponse, CompletionService,
};
use helpdesk_core::config::CompletionConfig;
use helpdesk_core::error::{HelpdeskError, Result};
use tracing::debug;

use crate::build_client;

/// Longest error body kept for logging.
const MAX_ERROR_BODY: usize = 512;

/// Completion service backed by a Gemini-compatible HTTP endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        if config.endpoint.trim().is_empty() {
            return Err(HelpdeskError::Config(
                "completion endpoint is not set".to_string(),
            ));
        }
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            endpoint: config.endpoint.trim().to_string(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl CompletionService for GeminiClient {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> std::result::Result<CompletionResponse, CompletionError> {
        let mut call = self.client.post(&self.endpoint).json(request);
        if !self.api_key.is_empty() {
            call = call.query(&[("key", self.api_key.as_str())]);
        }

        debug!(endpoint = %self.endpoint, "Sending completion request");

        // `without_url` keeps the API key out of error messages and logs.
        let response = call
            .send()
            .await
            .map_err(|e| CompletionError::Http(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CompletionError::Http(e.without_url().to_string()))?;

        if !status.is_success() {
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY),
            });
        }

        serde_json::from_str(&body).map_err(|e| CompletionError::Decode(e.to_string()))
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
