//! lexflow-api - Legal intake classification service
//!
//! Accepts client inquiries, classifies them, stores the resulting cases and
//! serves the staff dashboard and client portal.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use lexflow_common::config::{resolve_config_path, LexflowConfig};
use lexflow_common::notify::{EmailNotifier, LogMailer, NoopNotifier, Notifier};
use lexflow_common::store::SqliteRecordStore;
use lexflow_common::IntakeService;
use lexflow_api::classifier::AnthropicClassifier;
use lexflow_api::{build_router, AppState};
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "lexflow-api", version, about = "LexFlow intake service")]
struct Args {
    /// Path to config.toml
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// HTTP listen port (overrides config)
    #[arg(long, env = "LEXFLOW_PORT")]
    port: Option<u16>,

    /// SQLite database path (overrides config)
    #[arg(long, env = "LEXFLOW_DATABASE_PATH")]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing init so its log level can seed the filter
    let config_result = LexflowConfig::load(args.config.as_deref());
    let default_level = config_result
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    info!(
        "Starting LexFlow intake service (lexflow-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match resolve_config_path(args.config.as_deref()) {
        Some(path) if path.exists() => info!("Config file: {}", path.display()),
        Some(path) => warn!("Config file {} not found, using defaults", path.display()),
        None => warn!("No config file found, using defaults"),
    }
    let mut config = config_result.context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(database) = args.database {
        config.store.database_path = database;
    }
    config.validate(true).context("Invalid configuration")?;

    info!("Database path: {}", config.store.database_path.display());
    let store = match SqliteRecordStore::open(
        &config.store.database_path,
        config.store.scan_page_size,
    )
    .await
    {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    let classifier = AnthropicClassifier::new(config.classifier.clone())?;
    info!("Classifier model: {}", config.classifier.model);

    let notifier: Arc<dyn Notifier> = if config.notifications.enabled {
        info!(
            "Notifications enabled (from {}, attorney {})",
            config.notifications.from_email, config.notifications.attorney_email
        );
        Arc::new(EmailNotifier::new(
            LogMailer,
            config.notifications.from_email.clone(),
            config.notifications.attorney_email.clone(),
        ))
    } else {
        info!("Notifications disabled");
        Arc::new(NoopNotifier)
    };

    let service = IntakeService::new(Arc::new(classifier), Arc::new(store), notifier);
    let app = build_router(AppState::new(service));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("lexflow-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
