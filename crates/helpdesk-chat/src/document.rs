//! Process-wide cache of the reference document used for grounding.
//!
//! Loaded once at startup, before any interaction is handled. Reads never
//! block on I/O and never trigger a fetch.

use std::future::Future;
use std::sync::{Arc, RwLock};

use helpdesk_core::error::HelpdeskError;
use tracing::{info, warn};

use crate::error::ChatError;

/// Locations shipped in sample configs that must never be fetched.
pub const KNOWN_PLACEHOLDERS: &[&str] = &["https://uquid.freshdesk.com/a/solutions"];

/// Capability to fetch the raw text of a document.
pub trait DocumentFetcher: Send + Sync {
    fn fetch(
        &self,
        location: &str,
    ) -> impl Future<Output = Result<String, HelpdeskError>> + Send;
}

/// Current state of the reference document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentContent {
    /// Non-empty reference text.
    Available(Arc<str>),
    Unavailable,
}

impl DocumentContent {
    pub fn is_available(&self) -> bool {
        matches!(self, DocumentContent::Available(_))
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            DocumentContent::Available(text) => Some(text.as_ref()),
            DocumentContent::Unavailable => None,
        }
    }
}

/// Single-writer, many-reader holder of [`DocumentContent`].
#[derive(Debug)]
pub struct DocumentCache {
    slot: RwLock<DocumentContent>,
    placeholders: Vec<String>,
}

impl Default for DocumentCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentCache {
    /// An empty cache that only knows the built-in placeholders.
    pub fn new() -> Self {
        Self::with_placeholders(Vec::new())
    }

    /// An empty cache that also rejects the given placeholder locations.
    pub fn with_placeholders(extra: Vec<String>) -> Self {
        let mut placeholders: Vec<String> =
            KNOWN_PLACEHOLDERS.iter().map(|p| normalize(p)).collect();
        placeholders.extend(extra.iter().map(|p| normalize(p)));
        Self {
            slot: RwLock::new(DocumentContent::Unavailable),
            placeholders,
        }
    }

    /// A cache already holding `text`. Empty text yields an unavailable cache.
    pub fn preloaded(text: &str) -> Self {
        let cache = Self::new();
        if !text.trim().is_empty() {
            cache.store(DocumentContent::Available(Arc::from(text)));
        }
        cache
    }

    /// Fetch the document and make it current.
    ///
    /// On any failure the content becomes [`DocumentContent::Unavailable`]
    /// and the error is returned for logging; it is never fatal.
    pub async fn load<F: DocumentFetcher>(
        &self,
        source: Option<&str>,
        fetcher: &F,
    ) -> Result<(), ChatError> {
        match self.resolve(source, fetcher).await {
            Ok(text) => {
                info!(chars = text.chars().count(), "Reference document loaded");
                self.store(DocumentContent::Available(text));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Reference document unavailable; free-text answers disabled");
                self.store(DocumentContent::Unavailable);
                Err(e)
            }
        }
    }

    /// Fetch the document again. A failed reload keeps the previous content.
    pub async fn reload<F: DocumentFetcher>(
        &self,
        source: Option<&str>,
        fetcher: &F,
    ) -> Result<(), ChatError> {
        let text = self.resolve(source, fetcher).await.inspect_err(|e| {
            warn!(error = %e, "Reference document reload failed; keeping current content");
        })?;
        info!(chars = text.chars().count(), "Reference document reloaded");
        self.store(DocumentContent::Available(text));
        Ok(())
    }

    /// The last successfully loaded content, or `Unavailable`.
    pub fn current(&self) -> DocumentContent {
        self.slot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Whether `location` is one of the known placeholder values.
    pub fn is_placeholder(&self, location: &str) -> bool {
        let normalized = normalize(location);
        self.placeholders.iter().any(|p| *p == normalized)
    }

    async fn resolve<F: DocumentFetcher>(
        &self,
        source: Option<&str>,
        fetcher: &F,
    ) -> Result<Arc<str>, ChatError> {
        let location = match source.map(str::trim) {
            None | Some("") => {
                return Err(ChatError::ConfigurationDegraded(
                    "document location is not set".to_string(),
                ))
            }
            Some(location) => location,
        };
        if self.is_placeholder(location) {
            return Err(ChatError::ConfigurationDegraded(format!(
                "document location {} is a placeholder",
                location
            )));
        }

        info!(location = %location, "Fetching reference document");
        let text = fetcher.fetch(location).await.map_err(|e| {
            ChatError::ConfigurationDegraded(format!("failed to fetch {}: {}", location, e))
        })?;
        if text.trim().is_empty() {
            return Err(ChatError::ConfigurationDegraded(format!(
                "document at {} is empty",
                location
            )));
        }
        Ok(Arc::from(text))
    }

    fn store(&self, content: DocumentContent) {
        *self
            .slot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = content;
    }
}

fn normalize(location: &str) -> String {
    location.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::StaticFetcher;

    #[test]
    fn test_new_cache_is_unavailable() {
        let cache = DocumentCache::new();
        assert_eq!(cache.current(), DocumentContent::Unavailable);
        assert!(cache.current().text().is_none());
    }

    #[test]
    fn test_preloaded() {
        let cache = DocumentCache::preloaded("Returns within 30 days.");
        assert_eq!(cache.current().text(), Some("Returns within 30 days."));
        assert!(!DocumentCache::preloaded("  \n").current().is_available());
    }

    #[tokio::test]
    async fn test_load_success() {
        let fetcher = StaticFetcher::ok("Shipping takes 5 days.");
        let cache = DocumentCache::new();
        cache
            .load(Some("https://docs.example.org/faq"), &fetcher)
            .await
            .unwrap();
        assert_eq!(cache.current().text(), Some("Shipping takes 5 days."));
        assert_eq!(fetcher.calls(), vec!["https://docs.example.org/faq"]);
    }

    #[tokio::test]
    async fn test_load_unset_source() {
        let fetcher = StaticFetcher::ok("unused");
        let cache = DocumentCache::new();

        let err = cache.load(None, &fetcher).await.unwrap_err();
        assert!(matches!(err, ChatError::ConfigurationDegraded(_)));
        let err = cache.load(Some("   "), &fetcher).await.unwrap_err();
        assert!(matches!(err, ChatError::ConfigurationDegraded(_)));

        assert!(fetcher.calls().is_empty());
        assert!(!cache.current().is_available());
    }

    #[tokio::test]
    async fn test_load_placeholder_source() {
        let fetcher = StaticFetcher::ok("unused");
        let cache = DocumentCache::new();
        let err = cache
            .load(Some("https://uquid.freshdesk.com/a/solutions/"), &fetcher)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("placeholder"));
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_load_extra_placeholder() {
        let fetcher = StaticFetcher::ok("unused");
        let cache = DocumentCache::with_placeholders(vec!["https://example.com/faq".to_string()]);
        assert!(cache.is_placeholder(" https://example.com/faq/ "));
        assert!(cache.load(Some("https://example.com/faq"), &fetcher).await.is_err());
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_load_fetch_failure() {
        let fetcher = StaticFetcher::failing("connection refused");
        let cache = DocumentCache::new();
        let err = cache
            .load(Some("https://docs.example.org"), &fetcher)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(cache.current(), DocumentContent::Unavailable);
    }

    #[tokio::test]
    async fn test_load_empty_document() {
        let fetcher = StaticFetcher::ok(" \n\t");
        let cache = DocumentCache::new();
        let err = cache
            .load(Some("https://docs.example.org"), &fetcher)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("empty"));
        assert!(!cache.current().is_available());
    }

    #[tokio::test]
    async fn test_failed_load_clears_previous_content() {
        let cache = DocumentCache::preloaded("old");
        let fetcher = StaticFetcher::failing("boom");
        assert!(cache.load(Some("https://docs.example.org"), &fetcher).await.is_err());
        assert_eq!(cache.current(), DocumentContent::Unavailable);
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_content() {
        let cache = DocumentCache::preloaded("old");
        let fetcher = StaticFetcher::failing("boom");
        assert!(cache.reload(Some("https://docs.example.org"), &fetcher).await.is_err());
        assert_eq!(cache.current().text(), Some("old"));
    }

    #[tokio::test]
    async fn test_successful_reload_replaces_content() {
        let cache = DocumentCache::preloaded("old");
        let fetcher = StaticFetcher::ok("new");
        cache
            .reload(Some("https://docs.example.org"), &fetcher)
            .await
            .unwrap();
        assert_eq!(cache.current().text(), Some("new"));
    }

    #[tokio::test]
    async fn test_current_does_not_fetch() {
        let fetcher = StaticFetcher::ok("text");
        let cache = DocumentCache::new();
        cache.load(Some("https://docs.example.org"), &fetcher).await.unwrap();
        for _ in 0..5 {
            assert!(cache.current().is_available());
        }
        assert_eq!(fetcher.calls().len(), 1);
    }
}
