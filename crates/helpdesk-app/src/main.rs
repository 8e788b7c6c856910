//! Helpdesk bot binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration (file, env, flags)
//! 2. Build the FAQ catalog and load the reference document
//! 3. Verify the bot credential
//! 4. Long-poll for updates and route each one until shutdown

mod cli;

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use helpdesk_chat::{
    AnswerSynthesizer, CompletionService, DocumentCache, FaqCatalog, Messenger, Origin, Router,
};
use helpdesk_core::{HelpdeskConfig, HelpdeskError};
use helpdesk_remote::{GeminiClient, HttpDocumentFetcher};
use helpdesk_telegram::api::Update;
use helpdesk_telegram::{decode_update, TelegramClient, UpdatePoller};

use cli::CliArgs;

/// Read the config file. A missing file means "defaults"; a malformed one is fatal.
fn read_config(path: &Path) -> Result<HelpdeskConfig, HelpdeskError> {
    if path.exists() {
        HelpdeskConfig::load(path)
    } else {
        Ok(HelpdeskConfig::default())
    }
}

fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

/// Route one update and log the outcome. Never fails the loop.
async fn dispatch<C: CompletionService>(
    router: &Router<C>,
    client: &TelegramClient,
    update: &Update,
) {
    let Some(event) = decode_update(update) else {
        return;
    };

    if let Origin::Button { callback_id, .. } = &event.origin {
        if let Err(e) = client.acknowledge(callback_id).await {
            tracing::warn!(error = %e, update_id = update.update_id, "Failed to acknowledge button press");
        }
    }

    match router.handle(client, &event).await {
        Ok(resolution) => {
            tracing::debug!(update_id = update.update_id, ?resolution, "Interaction resolved");
        }
        Err(e) => tracing::error!(
            error = %e,
            update_id = update.update_id,
            chat = %event.chat,
            "Reply could not be delivered"
        ),
    }
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Ctrl-C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[cfg(unix)]
type ReloadSignal = tokio::signal::unix::Signal;
#[cfg(not(unix))]
type ReloadSignal = ();

/// SIGHUP listener used to re-fetch the reference document.
fn reload_signal() -> Option<ReloadSignal> {
    #[cfg(unix)]
    {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup())
            .inspect_err(|e| tracing::warn!(error = %e, "SIGHUP handler unavailable; document reload disabled"))
            .ok()
    }
    #[cfg(not(unix))]
    {
        None
    }
}

async fn reload_requested(signal: &mut Option<ReloadSignal>) {
    #[cfg(unix)]
    if let Some(sig) = signal {
        sig.recv().await;
        return;
    }
    #[cfg(not(unix))]
    let _ = signal;
    std::future::pending::<()>().await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let file_config = read_config(&config_file);
    let default_level = match &file_config {
        Ok(config) => args.resolve_log_level(config),
        Err(_) => args.log_level.clone().unwrap_or_else(|| "info".to_string()),
    };

    // Tracing.
    init_tracing(&default_level);
    tracing::info!("Starting helpdesk v{}", env!("CARGO_PKG_VERSION"));

    let mut config = file_config.inspect_err(|e| {
        tracing::error!(path = %config_file.display(), error = %e, "Failed to read configuration");
    })?;
    config.apply_env()?;
    args.apply_overrides(&mut config);
    config.validate().inspect_err(|e| {
        tracing::error!(error = %e, "Configuration is incomplete");
    })?;
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // FAQ catalog.
    let catalog = Arc::new(FaqCatalog::new(config.faq_entries())?);
    tracing::info!(topics = catalog.len(), "FAQ catalog ready");

    let operator_chat = config
        .operator_chat()
        .ok_or_else(|| HelpdeskError::Config("operator chat is not set".to_string()))?;

    if args.check_config {
        tracing::info!(
            operator_chat = %operator_chat,
            document = config.document.url.as_deref().unwrap_or("<none>"),
            "Configuration is valid"
        );
        return Ok(());
    }

    // Reference document. Failure only disables free-text answers.
    let fetcher = HttpDocumentFetcher::new(&config.document)?;
    let document = Arc::new(DocumentCache::with_placeholders(
        config.document.extra_placeholders.clone(),
    ));
    if let Err(e) = document
        .load(config.document.url.as_deref(), &fetcher)
        .await
    {
        tracing::debug!(error = %e, "Continuing without a reference document");
    }

    // Answer synthesis and routing.
    let completion = GeminiClient::new(&config.completion)?;
    if config.completion.api_key.is_empty() {
        tracing::warn!("Completion API key is not set; requests will likely be rejected");
    }
    let router = Router::new(
        Arc::clone(&catalog),
        AnswerSynthesizer::new(completion, Arc::clone(&document)),
        operator_chat,
    )
    .with_menu_after_answer(config.chat.menu_after_answer);

    // Transport.
    let client = TelegramClient::new(&config.telegram)?;
    let me = client.get_me().await.map_err(|e| {
        tracing::error!(error = %e, "Bot credential rejected");
        HelpdeskError::Transport(e.to_string())
    })?;
    tracing::info!(
        bot = me.username.as_deref().unwrap_or(&me.first_name),
        "Connected to Telegram"
    );

    // === Dispatch loop ===

    let mut poller = UpdatePoller::new(client.clone());
    let mut reload = reload_signal();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    tracing::info!(operator_chat = %operator_chat, "Bot is running");

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutdown requested");
                break;
            }
            _ = reload_requested(&mut reload) => {
                tracing::info!("Reloading reference document");
                if let Err(e) = document
                    .reload(config.document.url.as_deref(), &fetcher)
                    .await
                {
                    tracing::debug!(error = %e, "Keeping the previous reference document");
                }
            }
            updates = poller.next_batch() => {
                for update in &updates {
                    dispatch(&router, &client, update).await;
                }
            }
        }
    }

    tracing::info!("Helpdesk stopped");
    Ok(())
}
