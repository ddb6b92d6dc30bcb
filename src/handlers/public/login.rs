// handlers/public/login.rs - POST /api/auth/login

use serde::{Deserialize, Serialize};

use crate::auth::{generate_jwt, verify_password, Claims};
use crate::config::config;
use crate::database::models::Role;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::AccountService;
use crate::validation::validate_login;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginUser {
    pub id: i32,
    pub email: String,
    pub rm_number: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: LoginUser,
    pub expires_in: i64,
}

/// POST /api/auth/login - exchange credentials for a bearer token
///
/// Expected Input:
/// ```json
/// { "email": "RM001@batiinvestasi.ai", "password": "secret" }
/// ```
///
/// Unknown emails and wrong passwords are both 400s with distinct messages,
/// which the dashboard shows next to the matching input.
pub async fn login(ApiJson(body): ApiJson<LoginRequest>) -> ApiResult<LoginResponse> {
    let errors = validate_login(&body.email, &body.password, &config().accounts);
    if !errors.is_empty() {
        return Err(ApiError::validation_error("Validation failed", errors));
    }

    let account = AccountService::new()
        .await?
        .find_by_email(&body.email)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Login attempt for unknown email {}", body.email);
            ApiError::bad_request("Email tidak valid.")
        })?;

    if !verify_password(&body.password, &account.password_hash) {
        tracing::warn!("Wrong password for {}", account.rm_number);
        return Err(ApiError::bad_request("Password tidak valid."));
    }

    let claims = Claims::for_account(&account);
    let token = generate_jwt(&claims)?;

    tracing::info!("{} logged in", account.rm_number);

    Ok(ApiResponse::success(LoginResponse {
        token,
        expires_in: claims.expires_in(),
        user: LoginUser {
            id: account.rm_account_id,
            role: account.role(),
            email: account.email,
            rm_number: account.rm_number,
        },
    }))
}
