//! User service library logic.
//!
//! [`Server`] is the application shell: it opens storage, registers the
//! `/users` routes behind an explicit middleware list, and either serves
//! HTTP or synchronizes the schema once.

pub mod api;
pub mod cli;
pub mod config;
pub mod middleware;
pub mod routes;

use axum::{extract::DefaultBodyLimit, Extension, Router};
use config::Config;
use middleware::Middleware;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use user_db::{MigrationError, MigrationReport, PoolError, Store};

/// Maximum request body size (2 MiB).
const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Storage handle.
    pub store: Store,
}

/// Errors that stop the service from starting or serving.
#[derive(Debug, Error)]
pub enum StartupError {
    /// The database file could not be opened.
    #[error(transparent)]
    Connect(#[from] PoolError),

    /// The listen address could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// The HTTP server stopped with an I/O error.
    #[error("server error: {0}")]
    Serve(std::io::Error),
}

/// Builds the application router with all routes.
///
/// `middleware` is applied in order, so the last entry is the outermost layer.
pub fn app(state: AppState, middleware: &[Middleware]) -> Router {
    let router = routes::register(Router::new())
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(Extension(Arc::new(state)));

    middleware
        .iter()
        .fold(router, |router, layer| layer.apply(router))
}

/// The composed service: storage plus routes.
pub struct Server {
    config: Config,
    state: AppState,
    router: Router,
}

impl Server {
    /// Opens storage and builds the router.
    ///
    /// # Errors
    ///
    /// Returns `StartupError::Connect` if the database file cannot be opened.
    pub fn new(config: Config, middleware: Vec<Middleware>) -> Result<Self, StartupError> {
        let store = user_db::connect(&config.database.path, config.database.runtime_settings())?;
        let state = AppState { store };
        let router = app(state.clone(), &middleware);

        tracing::debug!(path = %config.database.path, ?middleware, "application initialized");

        Ok(Self {
            config,
            state,
            router,
        })
    }

    /// The router with every route and middleware layer installed.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Brings the database schema in line with the user entity.
    ///
    /// # Errors
    ///
    /// Returns the storage layer's `MigrationError` unchanged.
    pub fn migrate(&self) -> Result<MigrationReport, MigrationError> {
        self.state
            .store
            .write(|conn| user_db::migrate(conn, &[user_store::USERS_TABLE]))
    }

    /// Binds the configured address and serves until the process exits.
    ///
    /// # Errors
    ///
    /// Returns `StartupError::Bind` if the port is unavailable, or
    /// `StartupError::Serve` if the server stops with an I/O error.
    pub async fn run(self) -> Result<(), StartupError> {
        let addr = SocketAddr::new(self.config.server.host, self.config.server.port);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| StartupError::Bind { addr, source })?;

        tracing::info!(%addr, "user-service running");

        axum::serve(listener, self.router)
            .await
            .map_err(StartupError::Serve)
    }
}
