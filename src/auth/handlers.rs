use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, MessageResponse, RegisterForm},
        repo_types::User,
        services::{list_users as list_all_users, login_user, register_user},
    },
    error::AppError,
    images::services::{validate_photo, PhotoUpload},
    state::AppState,
};

/// Upper bound for a registration body, photo included.
const REGISTER_BODY_LIMIT: usize = 10 * 1024 * 1024;

pub fn register_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .layer(DefaultBodyLimit::max(REGISTER_BODY_LIMIT))
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/users", get(list_users))
}

/// POST /register (multipart)
/// Text fields: name, email, password, country, city. Optional file field: photo.
#[instrument(skip(state, mp))]
pub async fn register(
    State(state): State<AppState>,
    mp: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let form = read_register_form(mp?).await?;
    register_user(&state, form).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Registration successful".into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(payload) = payload?;
    login_user(&state, payload).await.map(Json)
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    list_all_users(&state).await.map(Json)
}

/// Drains the multipart body. The photo is type-checked here so a bad file
/// is rejected before anything touches the store or the disk.
async fn read_register_form(mut mp: Multipart) -> Result<RegisterForm, AppError> {
    let mut name = None;
    let mut email = None;
    let mut password = None;
    let mut country = None;
    let mut city = None;
    let mut photo: Option<PhotoUpload> = None;

    while let Some(field) = mp.next_field().await? {
        let Some(key) = field.name().map(str::to_string) else {
            continue;
        };
        match key.as_str() {
            "photo" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let body = field.bytes().await?;
                // Browsers send an empty part when no file was picked.
                if file_name.is_empty() && body.is_empty() {
                    continue;
                }
                if photo.is_some() {
                    return Err(AppError::Validation("Only one photo can be uploaded.".into()));
                }
                photo = Some(validate_photo(&file_name, &content_type, body)?);
            }
            "name" | "email" | "password" | "country" | "city" => {
                let value = field.text().await?;
                let slot = match key.as_str() {
                    "name" => &mut name,
                    "email" => &mut email,
                    "password" => &mut password,
                    "country" => &mut country,
                    _ => &mut city,
                };
                *slot = Some(value);
            }
            _ => {}
        }
    }

    Ok(RegisterForm {
        name: required(name, "name")?,
        email: required(email, "email")?,
        password: required(password, "password")?,
        country: required(country, "country")?,
        city: required(city, "city")?,
        photo,
    })
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    value.ok_or_else(|| AppError::Validation(format!("Missing field: {}", field)))
}
