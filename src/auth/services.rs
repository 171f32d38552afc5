use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, RegisterForm},
        jwt::JwtKeys,
        password::{hash_password_blocking, verify_password_blocking},
        repo_types::{NewUser, User},
    },
    error::AppError,
    images::services::store_optional_photo,
    state::AppState,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Creates the account described by `form`. No token is issued.
pub async fn register_user(state: &AppState, form: RegisterForm) -> Result<User, AppError> {
    let email = normalize_email(&form.email);
    if !is_valid_email(&email) {
        return Err(AppError::Validation("Invalid email".into()));
    }

    // Not atomic with the insert; the unique index catches the race.
    match state.users.find_by_email(&email).await {
        Ok(Some(_)) => return Err(AppError::EmailTaken),
        Ok(None) => {}
        Err(e) => return Err(AppError::registration_store(e)),
    }

    let password_hash = hash_password_blocking(form.password, state.config.bcrypt_cost)
        .await
        .map_err(AppError::Registration)?;

    let photo = store_optional_photo(&state.photos, form.photo)
        .await
        .map_err(|e| AppError::Registration(e.into()))?;

    let created = state
        .users
        .create(NewUser {
            name: form.name,
            email,
            password_hash,
            country: form.country,
            city: form.city,
            photo: photo.clone(),
        })
        .await;

    match created {
        Ok(user) => {
            info!(user_id = %user.id, email = %user.email, "user registered");
            Ok(user)
        }
        Err(e) => {
            if !photo.is_empty() {
                state.photos.discard(&photo).await;
            }
            Err(AppError::registration_store(e))
        }
    }
}

/// Checks credentials and signs a token carrying the user's id and name.
pub async fn login_user(state: &AppState, req: LoginRequest) -> Result<LoginResponse, AppError> {
    let email = normalize_email(&req.email);

    let user = state
        .users
        .find_by_email(&email)
        .await
        .map_err(|e| AppError::Login(e.into()))?
        .ok_or_else(|| {
            warn!(email = %email, "login unknown email");
            AppError::UnknownEmail
        })?;

    let ok = verify_password_blocking(req.password, user.password.clone())
        .await
        .map_err(AppError::Login)?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::WrongPassword);
    }

    let keys = JwtKeys::from_ref(state);
    let token = keys.sign(user.id, &user.name).map_err(AppError::Login)?;

    info!(user_id = %user.id, "user logged in");
    Ok(LoginResponse {
        token,
        name: user.name,
        photo: user.photo,
    })
}

/// Every stored record, password hashes included.
pub async fn list_users(state: &AppState) -> Result<Vec<User>, AppError> {
    state
        .users
        .list_all()
        .await
        .map_err(|e| AppError::ListUsers(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_format_check() {
        assert!(is_valid_email("ada@x.com"));
        assert!(!is_valid_email("ada"));
        assert!(!is_valid_email("ada@x"));
        assert!(!is_valid_email("a da@x.com"));
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_email("  Ada@X.Com "), "ada@x.com");
    }
}
