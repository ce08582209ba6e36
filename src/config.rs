use anyhow::{bail, Context};
use serde::Deserialize;

/// Upper bound for `JWT_TTL_MINUTES` (one year).
pub const MAX_TTL_MINUTES: i64 = 365 * 24 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. `DATABASE_URL`,
    /// `JWT_SECRET` and `JWT_TTL_MINUTES` have no defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .context("DATABASE_URL must be set")?;

        let secret = lookup("JWT_SECRET")
            .filter(|v| !v.is_empty())
            .context("JWT_SECRET must be set")?;

        let raw_ttl = lookup("JWT_TTL_MINUTES").context("JWT_TTL_MINUTES must be set")?;
        let ttl_minutes = raw_ttl
            .trim()
            .parse::<i64>()
            .with_context(|| format!("JWT_TTL_MINUTES is not an integer: {raw_ttl:?}"))?;
        if ttl_minutes <= 0 {
            bail!("JWT_TTL_MINUTES must be positive, got {ttl_minutes}");
        }
        if ttl_minutes > MAX_TTL_MINUTES {
            bail!("JWT_TTL_MINUTES must be at most {MAX_TTL_MINUTES}, got {ttl_minutes}");
        }

        let port = match lookup("APP_PORT").or_else(|| lookup("PORT")) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("invalid port: {raw:?}"))?,
            None => 8080,
        };

        let jwt = JwtConfig {
            secret,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "jwt-auth".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "jwt-auth-users".into()),
            ttl_minutes,
        };

        Ok(Self {
            database_url,
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            jwt,
        })
    }
}
