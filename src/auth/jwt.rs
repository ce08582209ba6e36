use std::time::Duration;

use anyhow::Context;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use super::claims::Claims;
use crate::config::JwtConfig;

/// The only failure `verify` reports. Expired, forged and malformed tokens
/// are indistinguishable to callers.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid token")]
pub struct InvalidToken;

/// Signing and verification material, built once at startup.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs((cfg.ttl_minutes.max(0) as u64).saturating_mul(60)),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a token for `user_id` valid for the configured TTL.
    pub fn mint(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.mint_at(user_id, OffsetDateTime::now_utc())
    }

    pub(crate) fn mint_at(&self, user_id: Uuid, now: OffsetDateTime) -> anyhow::Result<String> {
        let exp = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|secs| now.checked_add(TimeDuration::seconds(secs)))
            .context("token expiry is out of range")?;
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, InvalidToken> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);

        match decode::<Claims>(token, &self.decoding, &validation) {
            // jsonwebtoken still accepts `exp == now`; a token is valid only
            // while `exp > now`.
            Ok(data) if data.claims.exp as i64 <= OffsetDateTime::now_utc().unix_timestamp() => {
                debug!(user_id = %data.claims.sub, "jwt expired");
                Err(InvalidToken)
            }
            Ok(data) => {
                debug!(user_id = %data.claims.sub, "jwt verified");
                Ok(data.claims)
            }
            Err(e) => {
                match e.kind() {
                    ErrorKind::ExpiredSignature => debug!("jwt expired"),
                    ErrorKind::InvalidSignature => warn!("jwt signature mismatch"),
                    other => warn!(reason = ?other, "jwt rejected"),
                }
                Err(InvalidToken)
            }
        }
    }
}
