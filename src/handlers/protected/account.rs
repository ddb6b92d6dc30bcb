use axum::Extension;
use serde::Deserialize;
use serde_json::Value;

use crate::auth::hash_password;
use crate::database::models::Account;
use crate::error::{ApiError, FieldError};
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::AccountService;
use crate::validation::MIN_PASSWORD_LENGTH;

/// GET /api/auth/whoami - the caller's account as stored
pub async fn whoami(Extension(user): Extension<AuthUser>) -> ApiResult<Account> {
    let account = AccountService::new()
        .await?
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(ApiResponse::success(account))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default, rename = "newPassword", alias = "new_password")]
    pub new_password: String,
}

/// PUT /api/auth/update-password - administrators may reset anyone, RMs only themselves
pub async fn update_password(
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<UpdatePasswordRequest>,
) -> ApiResult<Value> {
    if !user.is_admin() && !body.email.trim().eq_ignore_ascii_case(&user.email) {
        tracing::warn!("{} tried to change the password of {}", user.rm_number, body.email);
        return Err(ApiError::forbidden("You can only change your own password"));
    }

    if body.new_password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::validation_error(
            "Validation failed",
            vec![FieldError::new(
                "newPassword",
                format!("Password must be at least {} characters long", MIN_PASSWORD_LENGTH),
            )],
        ));
    }

    let password_hash = hash_password(&body.new_password)?;
    let updated = AccountService::new()
        .await?
        .update_password(&body.email, &password_hash)
        .await?;

    if !updated {
        return Err(ApiError::bad_request("Invalid email."));
    }

    tracing::info!("Password changed for {} by {}", body.email, user.rm_number);
    Ok(ApiResponse::message("Password updated successfully."))
}
