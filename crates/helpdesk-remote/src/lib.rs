//! HTTP collaborators: the reference-document fetcher and the Gemini
//! `generateContent` completion client.

pub mod fetcher;
pub mod gemini;

pub use fetcher::HttpDocumentFetcher;
pub use gemini::GeminiClient;

use std::time::Duration;

use helpdesk_core::error::{HelpdeskError, Result};

/// Shared reqwest client construction with a per-request timeout.
pub(crate) fn build_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("helpdesk/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| HelpdeskError::Config(format!("failed to build HTTP client: {}", e)))
}
