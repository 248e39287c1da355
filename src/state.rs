use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(db_pool: PgPool, config: AppConfig) -> Self {
        Self {
            db_pool,
            config: Arc::new(config),
        }
    }
}
