use std::sync::Arc;

use newsreel_db::DbPool;

use crate::config::ServerConfig;

/// Handler state: the entry database and the loaded server settings.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(pool: DbPool, config: ServerConfig) -> Self {
        Self {
            pool,
            config: Arc::new(config),
        }
    }
}
