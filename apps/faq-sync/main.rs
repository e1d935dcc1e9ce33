#![warn(unused_extern_crates)]
use anyhow::{Context, Result};
use dotenv::dotenv;
use faq_sync::{
    QueryService, Reconciler,
    config::{self, Secrets},
    embeddings::OpenAiEmbedder,
    feed::DrupalFaqFeed,
    scheduler,
    server::{self, AppState},
    store::PgDocumentStore,
};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Duration;
use tracing::{error, info};
use utils::{
    errors::{
        DATABASE_CLOSE_FAILED, DATABASE_CONNECTION_FAILED, SCHEMA_BOOTSTRAP_FAILED,
        SERVER_BIND_FAILED, SERVER_FAILED,
    },
    tracing::setup_tracing,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    setup_tracing();

    info!("faq-sync starting up");

    let config = config::load();
    let secrets = Secrets::from_env()?;

    let db = faq_db::connect(&secrets.database_url, &config.store.pool_options())
        .await
        .context(DATABASE_CONNECTION_FAILED)?;

    if config.store.bootstrap_schema {
        faq_db::schema::ensure_schema(&db, config.embedding.dimensions)
            .await
            .context(SCHEMA_BOOTSTRAP_FAILED)?;
    }

    let source = Arc::new(DrupalFaqFeed::new(
        config.feed.url.clone(),
        config.feed.max_retries,
        config.feed.timeout(),
    )?);
    let embedder = Arc::new(OpenAiEmbedder::new(
        &secrets.openai_api_key,
        &config.embedding.base_url,
        config.embedding.model.clone(),
        Some(config.embedding.dimensions),
        config.embedding.timeout(),
    )?);
    let store = Arc::new(PgDocumentStore::new(db.clone()));
    info!(feed_url = %source.url(), model = %embedder.model(), "Clients ready");

    let reconciler = Arc::new(
        Reconciler::new(source, embedder.clone(), store.clone())
            .with_concurrency(config.embedding.concurrency),
    );
    let query = Arc::new(QueryService::new(embedder, store));

    if config.sync.run_on_startup {
        scheduler::run_once(&reconciler).await;
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sync_handle = config.sync.interval_secs.map(|secs| {
        tokio::spawn(scheduler::run_periodic(
            reconciler.clone(),
            Duration::from_secs(secs),
            shutdown_rx,
        ))
    });

    let app = server::router(
        AppState { reconciler, query },
        config.server.static_dir.clone(),
    );
    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("{SERVER_BIND_FAILED}: {}", config.server.bind))?;
    let addr = listener.local_addr().context(SERVER_BIND_FAILED)?;
    info!(address = %addr, "Starting HTTP server");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context(SERVER_FAILED);

    info!("HTTP server stopped, shutting down");

    // Let a scheduled pass that is already running finish before the pool goes away.
    let _ = shutdown_tx.send(true);
    if let Some(handle) = sync_handle {
        if let Err(e) = handle.await {
            error!(error = %e, "Scheduled sync task failed");
        }
    }

    if let Err(e) = db.close().await {
        error!(error = %e, "{}", DATABASE_CLOSE_FAILED);
    }

    served
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down gracefully"),
        _ = terminate => info!("Received SIGTERM, shutting down gracefully"),
    }
}
