pub mod config;
pub mod controllers;
pub mod database;
pub mod middleware;
pub mod models;
pub mod realtime;
pub mod redis_client;
pub mod services;
pub mod store;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::realtime::Broadcaster;
use crate::store::{MemoryTicketStore, PgTicketStore, TicketStore};

// Shared state for every request
pub struct AppState {
    pub config: config::Config,
    pub tickets: services::TicketService,
    pub broadcaster: Option<Broadcaster>,
    db: Option<database::Database>,
}

impl AppState {
    /// Connects the configured store and broadcast transport. The database
    /// pool lives as long as the state and is released by [`AppState::shutdown`].
    pub async fn new(config: config::Config) -> anyhow::Result<Arc<Self>> {
        let (store, db) = if config.database.is_configured() {
            let db = database::Database::new(&config.database).await?;
            info!("Database connected");
            db.run_migrations().await?;
            let store: Arc<dyn TicketStore> = Arc::new(PgTicketStore::new(db.pool.clone()));
            (store, Some(db))
        } else {
            warn!("No database configured, tickets are kept in memory only");
            let store: Arc<dyn TicketStore> = Arc::new(MemoryTicketStore::new());
            (store, None)
        };

        let broadcaster = match (&config.redis.url, config.features.enable_realtime) {
            (_, false) => None,
            (Some(url), true) => {
                let redis = redis_client::RedisClient::new(url).await?;
                info!("Redis connected, broadcasting across instances");
                Some(Broadcaster::with_redis(config.features.broadcast_capacity, redis))
            }
            (None, true) => Some(Broadcaster::new(config.features.broadcast_capacity)),
        };

        Ok(Self::assemble(config, store, broadcaster, db))
    }

    /// State over an existing store with local-only broadcasting.
    pub fn with_store(config: config::Config, store: Arc<dyn TicketStore>) -> Arc<Self> {
        let broadcaster = config
            .features
            .enable_realtime
            .then(|| Broadcaster::new(config.features.broadcast_capacity));
        Self::assemble(config, store, broadcaster, None)
    }

    fn assemble(
        config: config::Config,
        store: Arc<dyn TicketStore>,
        broadcaster: Option<Broadcaster>,
        db: Option<database::Database>,
    ) -> Arc<Self> {
        let tickets = services::TicketService::new(
            store,
            broadcaster.clone(),
            config.sales.paid_status.clone(),
            config.access.code.clone(),
        );
        Arc::new(Self {
            config,
            tickets,
            broadcaster,
            db,
        })
    }

    pub async fn shutdown(&self) {
        if let Some(db) = &self.db {
            db.close().await;
        }
    }
}

pub fn app(state: Arc<AppState>) -> Result<Router, config::ConfigError> {
    let cors = middleware::cors_layer(&state.config.cors)?;

    Ok(Router::new()
        .route("/", get(|| async { "Boletas API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .merge(controllers::routes(state.broadcaster.clone()))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}
