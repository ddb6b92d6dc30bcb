use axum::Extension;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::database::models::task::{
    IncreasedNumbers, LastTransaction, ManagedNumbers, OfferProductRisk, PotentialTransaction,
    ReprofileRiskTarget, RmPortfolio, Task,
};
use crate::error::ApiError;
use crate::handlers::{IdQuery, RmQuery};
use crate::middleware::{ApiJson, ApiQuery, ApiResponse, ApiResult, AuthUser};
use crate::services::double_option;
use crate::services::task_service::TaskChanges;
use crate::services::TaskService;

/// GET /api/task-manager/managed-number
pub async fn managed_number(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<RmQuery>,
) -> ApiResult<Vec<ManagedNumbers>> {
    let rm_number = user.resolve_rm_scope(query.rm_number.as_deref())?;
    let rows = TaskService::new().await?.managed_numbers(&rm_number).await?;
    Ok(ApiResponse::success(rows))
}

/// GET /api/task-manager/increased-number - `{currentQuarter, lastQuarter}`
pub async fn increased_number(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<RmQuery>,
) -> ApiResult<IncreasedNumbers> {
    let rm_number = user.resolve_rm_scope(query.rm_number.as_deref())?;
    let numbers = TaskService::new().await?.increased_numbers(&rm_number).await?;
    Ok(ApiResponse::success(numbers))
}

/// GET /api/task-manager/portfolio
pub async fn portfolio(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<RmQuery>,
) -> ApiResult<RmPortfolio> {
    let rm_number = user.resolve_rm_scope(query.rm_number.as_deref())?;
    let portfolio = TaskService::new().await?.portfolio(&rm_number).await?;
    Ok(ApiResponse::success(portfolio))
}

/// GET /api/task-manager/last-transaction
pub async fn last_transaction(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<RmQuery>,
) -> ApiResult<Vec<LastTransaction>> {
    let rm_number = user.resolve_rm_scope(query.rm_number.as_deref())?;
    let rows = TaskService::new().await?.last_transactions(&rm_number).await?;
    Ok(ApiResponse::success(rows))
}

/// GET /api/task-manager/potential-transaction
pub async fn potential_transaction(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<RmQuery>,
) -> ApiResult<Vec<PotentialTransaction>> {
    let rm_number = user.resolve_rm_scope(query.rm_number.as_deref())?;
    let rows = TaskService::new().await?.potential_transactions(&rm_number).await?;
    Ok(ApiResponse::success(rows))
}

/// GET /api/task-manager/offer-product-risk
pub async fn offer_product_risk(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<RmQuery>,
) -> ApiResult<Vec<OfferProductRisk>> {
    let rm_number = user.resolve_rm_scope(query.rm_number.as_deref())?;
    let rows = TaskService::new().await?.offer_product_risk(&rm_number).await?;
    Ok(ApiResponse::success(rows))
}

/// GET /api/task-manager/re-profile-risk-target
pub async fn reprofile_risk_target(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<RmQuery>,
) -> ApiResult<Vec<ReprofileRiskTarget>> {
    let rm_number = user.resolve_rm_scope(query.rm_number.as_deref())?;
    let rows = TaskService::new().await?.reprofile_risk_targets(&rm_number).await?;
    Ok(ApiResponse::success(rows))
}

/// GET /api/task-manager/get-task
pub async fn get_task(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<RmQuery>,
) -> ApiResult<Vec<Task>> {
    let rm_number = user.resolve_rm_scope(query.rm_number.as_deref())?;
    let tasks = TaskService::new().await?.tasks(&rm_number).await?;
    Ok(ApiResponse::success(tasks))
}

#[derive(Debug, Deserialize)]
pub struct NewTaskBody {
    pub description: Option<String>,
    pub invitee: Option<String>,
    pub due_date: Option<String>,
}

/// Due dates come from a date picker (`YYYY-MM-DD`) or as a full timestamp
fn parse_due_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            value
                .parse::<NaiveDate>()
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        })
}

fn due_date_from(value: Option<&str>) -> Result<Option<DateTime<Utc>>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => parse_due_date(v)
            .map(Some)
            .ok_or_else(|| ApiError::bad_request("due_date must be a valid date")),
    }
}

/// POST /api/task-manager/post-task - the task belongs to the caller
pub async fn post_task(
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<NewTaskBody>,
) -> ApiResult<Task> {
    let description = body
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| ApiError::bad_request("description is required"))?;
    let due_date = due_date_from(body.due_date.as_deref())?;

    let task = TaskService::new()
        .await?
        .create_task(&user.rm_number, description, body.invitee.as_deref(), due_date)
        .await?;
    Ok(ApiResponse::created(task))
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskBody {
    pub id: Option<i32>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub invitee: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<String>>,
}

/// PUT /api/task-manager/update-task
pub async fn update_task(
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<UpdateTaskBody>,
) -> ApiResult<Task> {
    let id = body.id.ok_or_else(|| ApiError::bad_request("id is required"))?;

    let due_date = match &body.due_date {
        None => None,
        Some(value) => Some(due_date_from(value.as_deref())?),
    };
    let changes = TaskChanges {
        description: body.description.filter(|d| !d.trim().is_empty()),
        invitee: body.invitee,
        due_date,
    };

    let task = TaskService::new()
        .await?
        .update_task(&user.rm_number, id, &changes)
        .await?;
    Ok(ApiResponse::success(task))
}

/// DELETE /api/task-manager/delete-task?id=
pub async fn delete_task(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> ApiResult<Task> {
    let id = query.id.ok_or_else(|| ApiError::bad_request("id is required"))?;
    let task = TaskService::new().await?.delete_task(&user.rm_number, id).await?;
    Ok(ApiResponse::success(task))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn due_dates_accept_dates_and_timestamps() {
        assert_eq!(
            parse_due_date("2024-06-30"),
            Some(Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_due_date("2024-06-30T09:15:00+07:00"),
            Some(Utc.with_ymd_and_hms(2024, 6, 30, 2, 15, 0).unwrap())
        );
        assert_eq!(parse_due_date("tomorrow"), None);
    }

    #[test]
    fn blank_due_date_means_none() {
        assert_eq!(due_date_from(None).unwrap(), None);
        assert_eq!(due_date_from(Some("  ")).unwrap(), None);
        assert_eq!(due_date_from(Some("soon")).unwrap_err().status_code(), 400);
    }

    #[test]
    fn update_body_distinguishes_cleared_invitee() {
        let body: UpdateTaskBody = serde_json::from_str(r#"{"id": 4, "invitee": null}"#).unwrap();
        assert_eq!(body.invitee, Some(None));
        assert!(body.due_date.is_none());
    }
}
