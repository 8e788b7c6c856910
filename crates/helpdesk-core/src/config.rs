use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{HelpdeskError, Result};
use crate::types::{default_faq_entries, ChatId, FaqEntry};

/// Environment variable holding the Telegram bot credential.
pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
/// Environment variable holding the operator chat identifier.
pub const ENV_OPERATOR_CHAT: &str = "ADMIN_CHAT_ID";
/// Environment variable holding the reference document location.
pub const ENV_DOCUMENT_URL: &str = "FAQ_DOCUMENT_URL";
/// Environment variable holding the completion service API key.
pub const ENV_COMPLETION_KEY: &str = "GEMINI_API_KEY";
/// Environment variable overriding the completion endpoint.
pub const ENV_COMPLETION_ENDPOINT: &str = "COMPLETION_ENDPOINT";

/// Top-level configuration for the helpdesk bot.
///
/// Loaded from `~/.helpdesk/config.toml` by default, then overlaid with
/// environment variables. Each section corresponds to one collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HelpdeskConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub operator: OperatorConfig,
    #[serde(default)]
    pub document: DocumentConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    /// FAQ topics in menu order. Empty means the built-in defaults.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub faq: Vec<FaqEntry>,
}

impl HelpdeskConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: HelpdeskConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| HelpdeskError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary variable lookup.
    ///
    /// Empty variables are ignored so that `FOO=` does not wipe a value from
    /// the config file.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get(ENV_BOT_TOKEN) {
            self.telegram.bot_token = token;
        }
        if let Some(raw) = get(ENV_OPERATOR_CHAT) {
            let id = raw.trim().parse::<i64>().map_err(|e| {
                HelpdeskError::Config(format!("{} must be a numeric chat id: {}", ENV_OPERATOR_CHAT, e))
            })?;
            self.operator.chat_id = Some(id);
        }
        if let Some(url) = get(ENV_DOCUMENT_URL) {
            self.document.url = Some(url);
        }
        if let Some(key) = get(ENV_COMPLETION_KEY) {
            self.completion.api_key = key;
        }
        if let Some(endpoint) = get(ENV_COMPLETION_ENDPOINT) {
            self.completion.endpoint = endpoint;
        }
        Ok(())
    }

    /// Check the settings required to start the bot.
    ///
    /// A missing document location is not an error: the bot then runs in
    /// "no document" mode.
    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            return Err(HelpdeskError::Config(format!(
                "bot token is not set (config [telegram].bot_token or {})",
                ENV_BOT_TOKEN
            )));
        }
        if self.operator.chat_id.is_none() {
            return Err(HelpdeskError::Config(format!(
                "operator chat is not set (config [operator].chat_id or {})",
                ENV_OPERATOR_CHAT
            )));
        }
        if self.telegram.poll_timeout_secs >= self.telegram.request_timeout_secs {
            return Err(HelpdeskError::Config(format!(
                "telegram.poll_timeout_secs ({}) must be below request_timeout_secs ({})",
                self.telegram.poll_timeout_secs, self.telegram.request_timeout_secs
            )));
        }
        Ok(())
    }

    /// Operator destination, if configured.
    pub fn operator_chat(&self) -> Option<ChatId> {
        self.operator.chat_id.map(ChatId)
    }

    /// FAQ topics to serve: the configured ones, or the built-in defaults.
    pub fn faq_entries(&self) -> Vec<FaqEntry> {
        if self.faq.is_empty() {
            default_faq_entries()
        } else {
            self.faq.clone()
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot credential issued by BotFather.
    pub bot_token: String,
    /// Bot API base URL.
    pub api_base: String,
    /// Long-poll timeout passed to `getUpdates`.
    pub poll_timeout_secs: u64,
    /// HTTP timeout for every Bot API call. Must exceed the poll timeout.
    pub request_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_base: "https://api.telegram.org".to_string(),
            poll_timeout_secs: 30,
            request_timeout_secs: 40,
        }
    }
}

/// Where escalation notices go.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorConfig {
    /// Numeric chat id of the operator chat or group.
    pub chat_id: Option<i64>,
}

/// Reference document settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Location of the reference document. Unset means "no document" mode.
    pub url: Option<String>,
    /// Convert `text/html` bodies to plain text before caching.
    pub strip_html: bool,
    /// HTTP timeout for the startup fetch.
    pub timeout_secs: u64,
    /// Additional locations treated as unconfigured placeholders.
    pub extra_placeholders: Vec<String>,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            url: None,
            strip_html: true,
            timeout_secs: 30,
            extra_placeholders: Vec::new(),
        }
    }
}

/// Completion service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Full `generateContent` endpoint.
    pub endpoint: String,
    /// API key sent as the `key` query parameter. Empty sends none.
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
                .to_string(),
            api_key: String::new(),
            timeout_secs: 60,
        }
    }
}

/// Conversation behaviour.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Re-show the menu after a synthesized answer as well.
    pub menu_after_answer: bool,
}
