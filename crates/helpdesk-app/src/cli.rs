//! Command-line arguments for the helpdesk bot.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use helpdesk_core::HelpdeskConfig;
use std::path::PathBuf;

/// Environment variable naming the config file.
pub const ENV_CONFIG_PATH: &str = "HELPDESK_CONFIG";

/// Customer-support chat bot: FAQ menu, grounded answers and human handoff.
#[derive(Parser, Debug)]
#[command(name = "helpdesk", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// URL of the reference document used for free-text answers.
    #[arg(short = 'd', long = "document-url")]
    pub document_url: Option<String>,

    /// Validate the configuration and exit without connecting.
    #[arg(long = "check-config")]
    pub check_config: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > HELPDESK_CONFIG env var > ~/.helpdesk/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        self.resolve_config_path_from(
            std::env::var(ENV_CONFIG_PATH).ok(),
            home_dir(),
        )
    }

    fn resolve_config_path_from(&self, env: Option<String>, home: Option<PathBuf>) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Some(p) = env.filter(|p| !p.trim().is_empty()) {
            return PathBuf::from(p);
        }
        match home {
            Some(home) => home.join(".helpdesk").join("config.toml"),
            None => PathBuf::from("config.toml"),
        }
    }

    /// Log level to start with when `RUST_LOG` is unset.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config: &HelpdeskConfig) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config.general.log_level.clone())
    }

    /// Apply flag values on top of file and environment settings.
    pub fn apply_overrides(&self, config: &mut HelpdeskConfig) {
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(ref url) = self.document_url {
            config.document.url = Some(url.clone());
        }
    }
}

fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    let var = "USERPROFILE";
    #[cfg(not(target_os = "windows"))]
    let var = "HOME";
    std::env::var(var).ok().map(PathBuf::from)
}
