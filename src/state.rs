use std::sync::Arc;

use crate::auth::jwt::JwtKeys;
use crate::config::AppConfig;
use crate::store::{MemoryUserStore, PgUserStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub config: Arc<AppConfig>,
    pub keys: JwtKeys,
}

impl AppState {
    /// Reads the environment and connects to PostgreSQL. Any failure here
    /// aborts startup.
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let users =
            Arc::new(PgUserStore::connect(&config.database_url).await?) as Arc<dyn UserStore>;
        Ok(Self::from_parts(users, config))
    }

    pub fn from_parts(users: Arc<dyn UserStore>, config: AppConfig) -> Self {
        let keys = JwtKeys::new(&config.jwt);
        Self {
            users,
            config: Arc::new(config),
            keys,
        }
    }

    /// In-memory store and a fixed test secret.
    pub fn fake() -> Self {
        let config = AppConfig {
            database_url: "memory://".into(),
            host: "127.0.0.1".into(),
            port: 0,
            jwt: crate::config::JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
            },
        };
        Self::from_parts(Arc::new(MemoryUserStore::new()), config)
    }
}
