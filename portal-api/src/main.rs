use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use chrono::Utc;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::prelude::*;

use portal_api::config::ApiConfig;
use portal_api::database::KeyValueStore;
use portal_api::handlers::{self, AppState};
use portal_api::helpers;
use portal_api::integrations::email_relay::{EmailJsClient, EmailRelay};
use portal_api::integrations::sheets_client::HttpSheetSource;
use portal_api::integrations::webhook::WebhookClient;
use portal_api::jobs::outbox::OutboxRelay;
use portal_api::jobs::sheet_sync::SyncManager;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long)]
    log_file_path: Option<String>,
}

fn io_error(context: &str, e: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, format!("{context}: {e}"))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Some(log_path) = args.log_file_path {
        let log_path = std::path::Path::new(&log_path);
        let file_appender = tracing_appender::rolling::never(
            log_path.parent().unwrap_or(std::path::Path::new(".")),
            log_path
                .file_name()
                .unwrap_or(std::ffi::OsStr::new("portal-api.log")),
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        std::mem::forget(guard);

        tracing_subscriber::registry()
            .with(env_filter.clone())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(true)
                    .with_writer(std::io::stdout),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    // Initialize database
    let db = helpers::database::initialize_database()
        .map_err(|e| io_error("Failed to initialize database", e))?;

    if let Ok(db_path) = helpers::database::get_db_path() {
        println!("Database initialized at: {:?}", db_path);
    }

    // Load config
    let (config, config_path) =
        ApiConfig::load().map_err(|e| io_error("Failed to load config", e))?;
    let config_arc = Arc::new(std::sync::RwLock::new(config.clone()));

    let (host, port) = config.server_address();
    tracing::info!("Server will listen on {}:{}", host, port);

    let sync_config = config.sync();
    let outbox_config = config.outbox();
    let relay_config = config.email_relay();
    let timeout = Duration::from_secs(sync_config.request_timeout_secs.max(1));

    let store: Arc<dyn KeyValueStore> = Arc::new(db.store());
    let webhook = Arc::new(WebhookClient::new(&config.webhook(), timeout));
    if config.webhook().url.is_none() {
        tracing::warn!("No webhook URL configured, mutations will stay in the outbox");
    }

    let outbox = Arc::new(OutboxRelay::new(store.clone(), webhook.clone(), &outbox_config));
    let sync_manager = Arc::new(SyncManager::new(
        store.clone(),
        Arc::new(HttpSheetSource::new(timeout)),
        config.sheets(),
        &sync_config,
    ));
    let email_relay = Arc::new(EmailRelay::new(
        store.clone(),
        Arc::new(EmailJsClient::new(&relay_config.endpoint, timeout)),
        relay_config.default_settings(),
    ));

    let state = AppState {
        store,
        outbox: outbox.clone(),
        sync: sync_manager.clone(),
        email_relay,
        authenticator: webhook,
        config: config_arc,
        config_path: Some(config_path),
    };

    // Initial sync once the server is up
    let sync_startup = sync_manager.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;

        if sync_startup.is_shutting_down() {
            return;
        }

        tracing::info!("Running initial sheet sync after startup delay");
        let reports = sync_startup.sync_all(Utc::now()).await;
        tracing::info!("Initial sync finished for {} collections", reports.len());
    });

    // Periodic sheet sync
    if sync_config.interval_secs > 0 {
        let sync_periodic = sync_manager.clone();
        let period = Duration::from_secs(sync_config.interval_secs);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick fires immediately and the startup task covers it
            interval.tick().await;
            loop {
                interval.tick().await;
                if sync_periodic.is_shutting_down() {
                    break;
                }
                sync_periodic.sync_all(Utc::now()).await;
            }
        });
    } else {
        tracing::info!("Periodic sheet sync disabled");
    }

    // Outbox flush loop
    let outbox_loop = outbox.clone();
    let flush_every = Duration::from_secs(outbox_config.flush_interval_secs.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(flush_every);
        loop {
            interval.tick().await;
            if outbox_loop.is_shutting_down() {
                break;
            }
            if let Err(e) = outbox_loop.flush(Utc::now()).await {
                tracing::error!("Outbox flush failed: {}", e);
            }
        }
    });

    println!("Starting server on {}:{}", host, port);

    let server = HttpServer::new(move || {
        // Configure CORS
        let cors = if let Some(cors_config) = &config.cors {
            let mut cors_builder = Cors::default();
            for origin in &cors_config.allowed_origins {
                cors_builder = cors_builder.allowed_origin(origin);
            }
            cors_builder
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(vec!["Authorization", "Accept", "Content-Type"])
                .max_age(3600)
        } else {
            Cors::default()
                .allow_any_origin()
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(vec!["Authorization", "Accept", "Content-Type"])
                .max_age(3600)
        };

        App::new()
            .wrap(cors)
            .app_data(web::Data::new(state.clone()))
            .configure(handlers::configure)
    })
    .bind((host.as_str(), port))?
    .run();

    let handle = server.handle();
    let shutdown_outbox = outbox.clone();
    let shutdown_sync = sync_manager.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }

        tracing::info!("Ctrl+C received, shutting down...");
        shutdown_sync.shutdown();
        shutdown_outbox.shutdown();

        match shutdown_outbox.flush(Utc::now()).await {
            Ok(report) if report.remaining > 0 => {
                tracing::info!("{} outbox entries kept for the next start", report.remaining);
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Final outbox flush failed: {}", e),
        }

        handle.stop(true).await;
    });

    server.await
}
