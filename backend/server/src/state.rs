use std::sync::Arc;

use sqlx::SqlitePool;

use super::{config::Config, database::init_pool, error::AppError, relay::Relay};

pub struct State {
    pub config: Config,
    pub pool: SqlitePool,
    pub relay: Relay,
}

impl State {
    pub async fn new(config: Config) -> Result<Arc<Self>, AppError> {
        let pool = init_pool(&config.database_url, config.max_connections).await?;

        Self::with_pool(config, pool)
    }

    pub fn with_pool(config: Config, pool: SqlitePool) -> Result<Arc<Self>, AppError> {
        let relay = Relay::new(&config.relay_url, config.relay_timeout)?;

        Ok(Arc::new(Self {
            config,
            pool,
            relay,
        }))
    }
}
