//! Pub golf backend entrypoint wiring REST, SSE and the score store supervisor.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::{Context, bail};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "couch-store")]
use pub_golf_back::dao::score_store::couchdb::{CouchConfig, CouchScoreStore};
use pub_golf_back::{
    config::AppConfig,
    dao::{
        score_store::{ScoreStore, memory::MemoryScoreStore},
        storage::StorageError,
    },
    routes,
    services::storage_supervisor,
    state::{AppState, SharedState},
};

#[derive(Debug, Clone, Copy)]
enum StoreBackend {
    #[cfg(feature = "couch-store")]
    Couch,
    Memory,
}

impl StoreBackend {
    fn from_env() -> anyhow::Result<Self> {
        match env::var("STORE_BACKEND").ok().as_deref().map(str::trim) {
            #[cfg(feature = "couch-store")]
            None | Some("") | Some("couch") | Some("couchdb") => Ok(Self::Couch),
            #[cfg(not(feature = "couch-store"))]
            None | Some("") => Ok(Self::Memory),
            Some("memory") => Ok(Self::Memory),
            Some(other) => bail!("unsupported STORE_BACKEND `{other}`"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load().context("loading configuration")?;
    if config.admin_token.is_none() {
        warn!("no admin token configured; admin routes are disabled");
    }
    let backend = StoreBackend::from_env()?;
    let app_state = AppState::new(config);

    spawn_supervisor(app_state.clone(), backend);
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, ?backend, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Start the background task owning the store connection.
fn spawn_supervisor(state: SharedState, backend: StoreBackend) {
    match backend {
        #[cfg(feature = "couch-store")]
        StoreBackend::Couch => {
            tokio::spawn(storage_supervisor::run(state, || async {
                let config = CouchConfig::from_env()?;
                let store: Arc<dyn ScoreStore> = Arc::new(CouchScoreStore::connect(config).await?);
                Ok::<_, StorageError>(store)
            }));
        }
        StoreBackend::Memory => {
            let store = MemoryScoreStore::new();
            tokio::spawn(storage_supervisor::run(state, move || {
                let store: Arc<dyn ScoreStore> = Arc::new(store.clone());
                async move { Ok::<_, StorageError>(store) }
            }));
        }
    }
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
                warn!(error = %err, "unable to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
