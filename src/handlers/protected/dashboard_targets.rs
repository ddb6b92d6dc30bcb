// handlers/protected/dashboard_targets.rs - /api/dashboard-targets

use axum::Extension;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::database::models::target::{DashboardTarget, MetricType};
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::services::double_option;
use crate::services::target_service::TargetChanges;
use crate::services::TargetService;

#[derive(Debug, Serialize)]
pub struct TargetsResponse {
    pub targets: Vec<DashboardTarget>,
}

#[derive(Debug, Serialize)]
pub struct TargetResponse {
    pub target: Option<DashboardTarget>,
}

#[derive(Debug, Deserialize)]
pub struct UpsertTargetBody {
    pub metric_type: Option<String>,
    pub target_value: Option<Decimal>,
    pub target_date: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTargetBody {
    pub target_value: Option<Decimal>,
    #[serde(default, deserialize_with = "double_option")]
    pub target_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

fn metric_from(value: Option<&str>) -> Result<MetricType, ApiError> {
    value
        .and_then(MetricType::parse)
        .ok_or_else(|| ApiError::bad_request("Invalid metric_type"))
}

/// Empty strings clear the date, anything else must be `YYYY-MM-DD`
fn target_date_from(value: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v
            .get(..10)
            .and_then(|d| d.parse::<NaiveDate>().ok())
            .map(Some)
            .ok_or_else(|| ApiError::bad_request("target_date must be a valid date")),
    }
}

/// GET /api/dashboard-targets
pub async fn list_targets(Extension(user): Extension<AuthUser>) -> ApiResult<TargetsResponse> {
    let targets = TargetService::new().await?.list(&user.rm_number).await?;
    Ok(ApiResponse::success(TargetsResponse { targets }))
}

/// GET /api/dashboard-targets/:metric_type - `{target: null}` when none is set
pub async fn get_target(
    Extension(user): Extension<AuthUser>,
    ApiPath(metric_type): ApiPath<String>,
) -> ApiResult<TargetResponse> {
    let metric = metric_from(Some(&metric_type))?;
    let target = TargetService::new().await?.get(&user.rm_number, metric).await?;
    Ok(ApiResponse::success(TargetResponse { target }))
}

/// POST /api/dashboard-targets - create or replace
pub async fn upsert_target(
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<UpsertTargetBody>,
) -> ApiResult<TargetResponse> {
    let metric = metric_from(body.metric_type.as_deref())?;
    let target_value = body
        .target_value
        .ok_or_else(|| ApiError::bad_request("target_value is required"))?;
    let target_date = target_date_from(body.target_date.as_deref())?;
    let notes = body.notes.as_deref().filter(|n| !n.is_empty());

    let target = TargetService::new()
        .await?
        .upsert(&user.rm_number, metric, target_value, target_date, notes)
        .await?;

    tracing::info!("{} set {} target to {}", user.rm_number, metric.as_str(), target_value);
    Ok(ApiResponse::success(TargetResponse { target: Some(target) }))
}

/// PUT /api/dashboard-targets/:metric_type - partial update of an existing target
pub async fn update_target(
    Extension(user): Extension<AuthUser>,
    ApiPath(metric_type): ApiPath<String>,
    ApiJson(body): ApiJson<UpdateTargetBody>,
) -> ApiResult<TargetResponse> {
    let metric = metric_from(Some(&metric_type))?;

    let target_date = match &body.target_date {
        None => None,
        Some(value) => Some(target_date_from(value.as_deref())?),
    };
    let changes = TargetChanges {
        target_value: body.target_value,
        target_date,
        notes: body.notes,
    };

    let target = TargetService::new()
        .await?
        .update(&user.rm_number, metric, &changes)
        .await?;
    Ok(ApiResponse::success(TargetResponse { target: Some(target) }))
}

/// DELETE /api/dashboard-targets/:metric_type
pub async fn delete_target(
    Extension(user): Extension<AuthUser>,
    ApiPath(metric_type): ApiPath<String>,
) -> ApiResult<Value> {
    let metric = metric_from(Some(&metric_type))?;
    TargetService::new().await?.delete(&user.rm_number, metric).await?;
    Ok(ApiResponse::message("Target deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn unknown_metrics_are_rejected() {
        assert_eq!(metric_from(Some("aum")).unwrap(), MetricType::Aum);
        assert_eq!(metric_from(Some("revenue")).unwrap_err().message(), "Invalid metric_type");
        assert_eq!(metric_from(None).unwrap_err().status_code(), 400);
    }

    #[test]
    fn target_dates_accept_plain_and_timestamped_dates() {
        let expected = NaiveDate::from_ymd_opt(2025, 12, 31);
        assert_eq!(target_date_from(Some("2025-12-31")).unwrap(), expected);
        assert_eq!(target_date_from(Some("2025-12-31T00:00:00.000Z")).unwrap(), expected);
        assert_eq!(target_date_from(Some("")).unwrap(), None);
        assert!(target_date_from(Some("Dec 31")).is_err());
    }

    #[test]
    fn target_value_accepts_numbers_and_numeric_strings() {
        let body: UpsertTargetBody =
            serde_json::from_str(r#"{"metric_type": "aum", "target_value": 1500000000}"#).unwrap();
        assert_eq!(body.target_value, Some(Decimal::from(1_500_000_000i64)));

        let body: UpsertTargetBody =
            serde_json::from_str(r#"{"metric_type": "fbi", "target_value": "2500.50"}"#).unwrap();
        assert_eq!(body.target_value, Some(Decimal::from_str("2500.50").unwrap()));
    }

    #[test]
    fn update_body_keeps_cleared_notes_apart_from_absent_ones() {
        let body: UpdateTargetBody = serde_json::from_str(r#"{"notes": null}"#).unwrap();
        assert_eq!(body.notes, Some(None));
        assert!(body.target_value.is_none());
        assert!(body.target_date.is_none());
    }
}
