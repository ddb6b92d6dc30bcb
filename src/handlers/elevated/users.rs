// handlers/elevated/users.rs - account administration under /api/auth/*

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::hash_password;
use crate::config::config;
use crate::database::models::{Account, Role};
use crate::error::{ApiError, FieldError};
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult};
use crate::services::AccountService;
use crate::validation::{is_valid_email, validate_register};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub rm_number: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: Account,
}

/// POST /api/auth/register - create an RM (or the administrator) account
///
/// Expected Input:
/// ```json
/// { "email": "RM007@batiinvestasi.ai", "password": "secret", "rm_number": "RM007", "role": "user" }
/// ```
///
/// The email must match the RM number; only the configured admin email may
/// register with role `admin` outside that rule.
pub async fn register(ApiJson(body): ApiJson<RegisterRequest>) -> ApiResult<RegisterResponse> {
    let role = body.role.as_deref().map(Role::parse).unwrap_or(Role::User);
    let errors = validate_register(
        &body.email,
        &body.password,
        body.rm_number.as_deref(),
        role,
        &config().accounts,
    );
    if !errors.is_empty() {
        return Err(ApiError::validation_error("Validation failed", errors));
    }
    let rm_number = body.rm_number.as_deref().map(str::trim).unwrap_or_default();

    let accounts = AccountService::new().await?;
    if accounts.find_by_email(&body.email).await?.is_some() {
        return Err(ApiError::bad_request("Email already in use."));
    }

    let password_hash = hash_password(&body.password)?;
    let user = accounts
        .create(&body.email, rm_number, &password_hash, role)
        .await?;

    Ok(ApiResponse::created(RegisterResponse {
        message: "User registered successfully.",
        user,
    }))
}

/// GET /api/auth/users
pub async fn list_users() -> ApiResult<Vec<Account>> {
    let users = AccountService::new().await?.list().await?;
    Ok(ApiResponse::success(users))
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub email: String,
}

/// PUT /api/auth/update-user/:rm_number - change the login email of an account
pub async fn update_user(
    ApiPath(rm_number): ApiPath<String>,
    ApiJson(body): ApiJson<UpdateUserRequest>,
) -> ApiResult<Value> {
    let email = body.email.trim();
    if !is_valid_email(email) {
        return Err(ApiError::validation_error(
            "Validation failed",
            vec![FieldError::new("email", "Invalid email format")],
        ));
    }

    let account = AccountService::new()
        .await?
        .update_email(&rm_number, email)
        .await?;

    tracing::info!("Account {} now signs in as {}", account.rm_number, account.email);
    Ok(ApiResponse::message("User updated successfully."))
}

/// DELETE /api/auth/delete-user/:rm_number - page permissions are removed with the account
pub async fn delete_user(ApiPath(rm_number): ApiPath<String>) -> ApiResult<Value> {
    AccountService::new()
        .await?
        .delete_by_rm_number(&rm_number)
        .await?;
    Ok(ApiResponse::message("User deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_role_defaults_to_user() {
        let body: RegisterRequest = serde_json::from_str(
            r#"{"email": "RM007@batiinvestasi.ai", "password": "secret", "rm_number": "RM007"}"#,
        )
        .unwrap();
        assert_eq!(body.role.as_deref().map(Role::parse).unwrap_or(Role::User), Role::User);
    }

    #[test]
    fn register_response_never_carries_the_hash() {
        let response = RegisterResponse {
            message: "User registered successfully.",
            user: Account {
                rm_account_id: 7,
                email: "RM007@batiinvestasi.ai".to_string(),
                rm_number: "RM007".to_string(),
                password_hash: "$2b$10$abcdefghijklmnopqrstuv".to_string(),
                role: "user".to_string(),
                created_at: chrono::Utc::now(),
            },
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["user"]["rm_number"], "RM007");
        assert!(json["user"].get("password_hash").is_none());
    }
}
