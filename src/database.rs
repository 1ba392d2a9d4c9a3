use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    Pool, Postgres,
};
use std::time::Duration;
use tracing::info;

use crate::config::DatabaseConfig;

#[derive(Clone)]
pub struct Database {
    pub pool: Pool<Postgres>,
}

impl Database {
    /// Opens the bounded pool. Requests past `pool_size` wait up to
    /// `acquire_timeout_secs` for a free connection.
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let options = match &config.url {
            Some(url) => url.parse::<PgConnectOptions>()?,
            None => {
                let mut options = PgConnectOptions::new().port(config.port);
                if let Some(host) = &config.host {
                    options = options.host(host);
                }
                if let Some(user) = &config.user {
                    options = options.username(user);
                }
                if let Some(password) = &config.password {
                    options = options.password(password);
                }
                if let Some(name) = &config.name {
                    options = options.database(name);
                }
                options
            }
        };

        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_with(options)
            .await?;

        Ok(Database { pool })
    }

    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("./src/migrations")
            .run(&self.pool)
            .await?;
        info!("Migrations completed");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}
