//! HTTP fetch of the reference document.

use helpdesk_chat::document::DocumentFetcher;
use helpdesk_core::config::DocumentConfig;
use helpdesk_core::error::{HelpdeskError, Result};
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::build_client;

/// Column width used when rendering HTML to text.
const TEXT_WIDTH: usize = 120;

/// Fetches a document over HTTP(S), rendering HTML pages to plain text.
#[derive(Debug, Clone)]
pub struct HttpDocumentFetcher {
    client: reqwest::Client,
    strip_html: bool,
}

impl HttpDocumentFetcher {
    pub fn new(config: &DocumentConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            strip_html: config.strip_html,
        })
    }
}

impl DocumentFetcher for HttpDocumentFetcher {
    async fn fetch(&self, location: &str) -> Result<String> {
        let response = self
            .client
            .get(location)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| HelpdeskError::Document(e.to_string()))?;

        let is_html = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.to_ascii_lowercase().starts_with("text/html"));

        let body = response
            .text()
            .await
            .map_err(|e| HelpdeskError::Document(e.to_string()))?;

        debug!(bytes = body.len(), is_html, "Document body received");

        if is_html && self.strip_html {
            Ok(html_to_text(&body))
        } else {
            Ok(body)
        }
    }
}

/// Render an HTML page as plain text.
pub fn html_to_text(html: &str) -> String {
    html2text::from_read(html.as_bytes(), TEXT_WIDTH)
}
