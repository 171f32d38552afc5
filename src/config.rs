use std::path::PathBuf;

use serde::Deserialize;
use tracing::warn;

/// Used when `JWT_SECRET` is not set. Anyone who knows it can mint tokens.
pub const DEFAULT_JWT_SECRET: &str = "gizli_anahtar";

pub const DEFAULT_BCRYPT_COST: u32 = 10;

pub const DEFAULT_JWT_TTL_MINUTES: i64 = 60;

/// Upper bound for `JWT_TTL_MINUTES`: one year.
pub const MAX_JWT_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub bcrypt_cost: u32,
    pub upload_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let secret = match std::env::var("JWT_SECRET") {
            Ok(s) if !s.is_empty() => s,
            _ => {
                warn!("JWT_SECRET is not set; signing tokens with the built-in default secret");
                DEFAULT_JWT_SECRET.to_string()
            }
        };
        let jwt = JwtConfig {
            secret,
            ttl_minutes: parse_ttl_minutes(std::env::var("JWT_TTL_MINUTES").ok().as_deref())?,
        };
        let bcrypt_cost = std::env::var("BCRYPT_COST")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(DEFAULT_BCRYPT_COST);
        let upload_dir = std::env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("uploads"));
        Ok(Self {
            database_url,
            jwt,
            bcrypt_cost,
            upload_dir,
        })
    }
}

/// Unset means the default; anything else must be a whole number of minutes
/// in `1..=MAX_JWT_TTL_MINUTES`.
pub fn parse_ttl_minutes(raw: Option<&str>) -> anyhow::Result<i64> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(DEFAULT_JWT_TTL_MINUTES);
    };
    let minutes: i64 = raw
        .parse()
        .map_err(|e| anyhow::anyhow!("JWT_TTL_MINUTES={raw:?} is not an integer: {e}"))?;
    anyhow::ensure!(
        (1..=MAX_JWT_TTL_MINUTES).contains(&minutes),
        "JWT_TTL_MINUTES={minutes} is out of range (1..={MAX_JWT_TTL_MINUTES})"
    );
    Ok(minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_defaults_to_one_hour() {
        assert_eq!(parse_ttl_minutes(None).unwrap(), 60);
        assert_eq!(parse_ttl_minutes(Some("  ")).unwrap(), 60);
    }

    #[test]
    fn ttl_accepts_values_in_range() {
        assert_eq!(parse_ttl_minutes(Some("15")).unwrap(), 15);
        assert_eq!(
            parse_ttl_minutes(Some(&MAX_JWT_TTL_MINUTES.to_string())).unwrap(),
            MAX_JWT_TTL_MINUTES
        );
    }

    #[test]
    fn ttl_rejects_out_of_range_and_garbage() {
        assert!(parse_ttl_minutes(Some("0")).is_err());
        assert!(parse_ttl_minutes(Some("-5")).is_err());
        assert!(parse_ttl_minutes(Some(&(i64::MAX / 60).to_string())).is_err());
        let err = parse_ttl_minutes(Some("an hour")).unwrap_err();
        assert!(err.to_string().contains("JWT_TTL_MINUTES"));
    }
}
