//! ReBMS Back binary entrypoint wiring REST, WebSocket, SSE, identity and document storage.

use std::{env, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rebms_back::{
    config::AppConfig,
    dao::document_store::memory::MemoryDocumentStore,
    identity::LocalIdentity,
    routes,
    services::session_service,
    state::{AppState, SharedState},
};

/// How long the startup pipeline waits for the first storage connection.
const STORAGE_WAIT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let app_config = AppConfig::load();
    let identity = Arc::new(LocalIdentity::from_config(&app_config));
    let app_state = AppState::new(app_config, identity);

    spawn_storage(app_state.clone()).await?;
    tokio::spawn(session_service::follow_identity(
        app_state.clone(),
        app_state.identity().subscribe(),
    ));
    tokio::spawn(bootstrap_when_storage_ready(app_state.clone()));

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Pick a document store from the environment: CouchDB, then MongoDB, then in-memory.
///
/// Remote backends run under the storage supervisor so the server starts in degraded mode and
/// leaves it once the first connection succeeds.
async fn spawn_storage(state: SharedState) -> anyhow::Result<()> {
    #[cfg(feature = "couch-store")]
    {
        use rebms_back::dao::{
            document_store::{
                DocumentStore,
                couchdb::{CouchConfig, CouchDocumentStore},
            },
            storage::StorageError,
        };
        use rebms_back::services::storage_supervisor;

        if let Some(config) = CouchConfig::from_env().context("reading CouchDB configuration")? {
            info!(base_url = %config.base_url, database = %config.database, "using CouchDB storage");
            tokio::spawn(storage_supervisor::run(state, move || {
                let config = config.clone();
                async move {
                    let store = CouchDocumentStore::connect(config)
                        .await
                        .map_err(StorageError::from)?;
                    Ok(Arc::new(store) as Arc<dyn DocumentStore>)
                }
            }));
            return Ok(());
        }
    }

    #[cfg(feature = "mongo-store")]
    {
        use rebms_back::dao::{
            document_store::{
                DocumentStore,
                mongodb::{MongoConfig, MongoDocumentStore},
            },
            storage::StorageError,
        };
        use rebms_back::services::storage_supervisor;

        if let Some(config) = MongoConfig::from_env()
            .await
            .context("reading MongoDB configuration")?
        {
            info!(database = %config.database_name, "using MongoDB storage");
            tokio::spawn(storage_supervisor::run(state, move || {
                let config = config.clone();
                async move {
                    let store = MongoDocumentStore::connect(config)
                        .await
                        .map_err(StorageError::from)?;
                    Ok(Arc::new(store) as Arc<dyn DocumentStore>)
                }
            }));
            return Ok(());
        }
    }

    warn!("no storage backend configured; documents are kept in memory only");
    state
        .install_document_store(Arc::new(MemoryDocumentStore::new()))
        .await;
    Ok(())
}

/// Run the startup pipeline once storage is reachable, or after [`STORAGE_WAIT`] regardless.
/// Afterwards, a later connection retries whatever the pipeline could not load.
async fn bootstrap_when_storage_ready(state: SharedState) {
    let mut degraded = state.degraded_watcher();
    let connected = tokio::time::timeout(STORAGE_WAIT, degraded.wait_for(|value| !*value))
        .await
        .is_ok();
    if !connected {
        warn!("storage still unavailable; starting with default settings");
    }
    session_service::bootstrap(state.clone()).await;
    session_service::reload_on_reconnect(state, degraded).await;
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
