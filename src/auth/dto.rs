use serde::{Deserialize, Serialize};

use crate::images::services::PhotoUpload;

/// Fields of the multipart registration form.
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub country: String,
    pub city: String,
    pub photo: Option<PhotoUpload>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response returned after a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub name: String,
    pub photo: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
