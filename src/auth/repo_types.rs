use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,          // unique user ID
    pub name: String,
    pub email: String,     // unique
    pub password: String,  // bcrypt hash
    pub country: String,
    pub city: String,
    pub photo: String,     // "/uploads/<file>" or empty
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Fields supplied by the caller on insert; id and timestamp come from the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub country: String,
    pub city: String,
    pub photo: String,
}
