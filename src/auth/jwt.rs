use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{encode, EncodingKey, Header};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::{auth::claims::Claims, config::JwtConfig, state::AppState};

/// Holds the JWT signing key with the token lifetime.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    #[cfg(test)]
    pub decoding: jsonwebtoken::DecodingKey,
    pub ttl: Duration,
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        let ttl_secs = u64::try_from(cfg.ttl_minutes)
            .unwrap_or(0)
            .saturating_mul(60);
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            #[cfg(test)]
            decoding: jsonwebtoken::DecodingKey::from_secret(cfg.secret.as_bytes()),
            ttl: Duration::from_secs(ttl_secs),
        }
    }

    pub fn sign(&self, user_id: Uuid, name: &str) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let ttl = i64::try_from(self.ttl.as_secs())
            .map_err(|_| anyhow::anyhow!("token expiry overflows (ttl {}s)", self.ttl.as_secs()))?;
        let exp = now
            .checked_add(TimeDuration::seconds(ttl))
            .ok_or_else(|| anyhow::anyhow!("token expiry overflows (ttl {}s)", ttl))?;
        let claims = Claims {
            user_id,
            name: name.to_string(),
            iat: usize::try_from(now.unix_timestamp())?,
            exp: usize::try_from(exp.unix_timestamp())?,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    #[cfg(test)]
    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let data = jsonwebtoken::decode::<Claims>(
            token,
            &self.decoding,
            &jsonwebtoken::Validation::default(),
        )?;
        Ok(data.claims)
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::from_config(&state.config.jwt)
    }
}
