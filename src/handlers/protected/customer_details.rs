// handlers/protected/customer_details.rs - /api/customer-details/*
//
// Read endpoints take `customerID` (and optionally `rm_number`) from the query
// string. Activity and customer edits sit behind page permission guards.

use axum::Extension;
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use serde_json::Value;

use crate::database::models::customer::{
    Activity, BulkUpdateResult, CustomerDetail, CustomerId, CustomerInfo, CustomerPortfolio,
    OptimizedAllocation, OwnedProduct, QuarterlyAum, QuarterlyFum, RecommendationProduct,
    ReturnPercentage,
};
use crate::error::ApiError;
use crate::handlers::{IdQuery, RmQuery};
use crate::middleware::{ApiJson, ApiQuery, ApiResponse, ApiResult, AuthUser};
use crate::services::customer_service::{ActivityInput, CustomerChanges};
use crate::services::CustomerService;

#[derive(Debug, Deserialize)]
pub struct CustomerQuery {
    pub rm_number: Option<String>,
    #[serde(rename = "customerID")]
    pub customer_id: Option<String>,
}

impl CustomerQuery {
    /// (rm_number, customer_id) for a customer-scoped read
    fn resolve(self, user: &AuthUser) -> Result<(String, String), ApiError> {
        let rm_number = user.resolve_rm_scope(self.rm_number.as_deref())?;
        let customer_id = self
            .customer_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ApiError::bad_request("customerID is required"))?;
        Ok((rm_number, customer_id))
    }
}

/// GET /api/customer-details/customer-id-list
pub async fn customer_id_list(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<RmQuery>,
) -> ApiResult<Vec<CustomerId>> {
    let rm_number = user.resolve_rm_scope(query.rm_number.as_deref())?;
    let ids = CustomerService::new().await?.customer_ids(&rm_number).await?;
    Ok(ApiResponse::success(ids))
}

/// GET /api/customer-details/customer-details?customerID=
pub async fn customer_details(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<CustomerQuery>,
) -> ApiResult<CustomerDetail> {
    let (rm_number, customer_id) = query.resolve(&user)?;
    let detail = CustomerService::new()
        .await?
        .details(&rm_number, &customer_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer not found"))?;
    Ok(ApiResponse::success(detail))
}

/// GET /api/customer-details/recommendation-product
pub async fn recommendation_product(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<CustomerQuery>,
) -> ApiResult<Vec<RecommendationProduct>> {
    let (rm_number, customer_id) = query.resolve(&user)?;
    let rows = CustomerService::new()
        .await?
        .recommendation(&rm_number, &customer_id)
        .await?;
    Ok(ApiResponse::success(rows))
}

/// GET /api/customer-details/customer-portfolio - null before the first quarter is loaded
pub async fn customer_portfolio(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<CustomerQuery>,
) -> ApiResult<Option<CustomerPortfolio>> {
    let (rm_number, customer_id) = query.resolve(&user)?;
    let portfolio = CustomerService::new()
        .await?
        .portfolio(&rm_number, &customer_id)
        .await?;
    Ok(ApiResponse::success(portfolio))
}

/// GET /api/customer-details/optimized-portfolio
pub async fn optimized_portfolio(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<CustomerQuery>,
) -> ApiResult<Vec<OptimizedAllocation>> {
    let (rm_number, customer_id) = query.resolve(&user)?;
    let rows = CustomerService::new()
        .await?
        .optimized_portfolio(&rm_number, &customer_id)
        .await?;
    Ok(ApiResponse::success(rows))
}

/// GET /api/customer-details/return-percentage
pub async fn return_percentage(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<CustomerQuery>,
) -> ApiResult<ReturnPercentage> {
    let (rm_number, customer_id) = query.resolve(&user)?;
    let returns = CustomerService::new()
        .await?
        .return_percentage(&rm_number, &customer_id)
        .await?;
    Ok(ApiResponse::success(returns))
}

/// GET /api/customer-details/owned-product
pub async fn owned_product(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<CustomerQuery>,
) -> ApiResult<Vec<OwnedProduct>> {
    let (rm_number, customer_id) = query.resolve(&user)?;
    let rows = CustomerService::new()
        .await?
        .owned_products(&rm_number, &customer_id)
        .await?;
    Ok(ApiResponse::success(rows))
}

/// GET /api/customer-details/quarterly-aum
pub async fn quarterly_aum(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<CustomerQuery>,
) -> ApiResult<Vec<QuarterlyAum>> {
    let (rm_number, customer_id) = query.resolve(&user)?;
    let rows = CustomerService::new()
        .await?
        .quarterly_aum(&rm_number, &customer_id)
        .await?;
    Ok(ApiResponse::success(rows))
}

/// GET /api/customer-details/quarterly-fum
pub async fn quarterly_fum(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<CustomerQuery>,
) -> ApiResult<Vec<QuarterlyFum>> {
    let (rm_number, customer_id) = query.resolve(&user)?;
    let rows = CustomerService::new()
        .await?
        .quarterly_fum(&rm_number, &customer_id)
        .await?;
    Ok(ApiResponse::success(rows))
}

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub bp_number_wm_core: Option<String>,
}

/// GET /api/customer-details/get-activity?bp_number_wm_core=
pub async fn get_activity(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<ActivityQuery>,
) -> ApiResult<Vec<Activity>> {
    let customer_id = query
        .bp_number_wm_core
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("bp_number_wm_core is required"))?;

    let rows = CustomerService::new()
        .await?
        .activities(user.owner_filter(), &customer_id)
        .await?;
    Ok(ApiResponse::success(rows))
}

#[derive(Debug, Deserialize)]
pub struct ActivityBody {
    pub id: Option<i32>,
    pub bp_number_wm_core: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
}

impl ActivityBody {
    fn input(&self) -> Result<ActivityInput, ApiError> {
        let title = self
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::bad_request("title is required"))?;
        let date = self
            .date
            .as_deref()
            .and_then(parse_activity_date)
            .ok_or_else(|| ApiError::bad_request("date must be a valid date"))?;

        Ok(ActivityInput {
            title: title.to_string(),
            description: self.description.clone(),
            date,
        })
    }
}

/// Dates arrive either as `YYYY-MM-DD` or as a full RFC 3339 timestamp
fn parse_activity_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    value
        .parse::<NaiveDate>()
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

/// POST /api/customer-details/post-activity
pub async fn post_activity(
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<ActivityBody>,
) -> ApiResult<Activity> {
    let customer_id = body
        .bp_number_wm_core
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("bp_number_wm_core is required"))?;
    let input = body.input()?;

    let activity = CustomerService::new()
        .await?
        .create_activity(user.owner_filter(), customer_id, &input)
        .await?;
    Ok(ApiResponse::created(activity))
}

/// PUT /api/customer-details/update-activity
pub async fn update_activity(
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<ActivityBody>,
) -> ApiResult<Activity> {
    let id = body.id.ok_or_else(|| ApiError::bad_request("id is required"))?;
    let input = body.input()?;

    let activity = CustomerService::new()
        .await?
        .update_activity(user.owner_filter(), id, &input)
        .await?;
    Ok(ApiResponse::success(activity))
}

/// DELETE /api/customer-details/delete-activity?id=
pub async fn delete_activity(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> ApiResult<Activity> {
    let id = query.id.ok_or_else(|| ApiError::bad_request("id is required"))?;
    let activity = CustomerService::new()
        .await?
        .delete_activity(user.owner_filter(), id)
        .await?;
    Ok(ApiResponse::success(activity))
}

/// Customer ids are numeric strings, but clients sometimes send them as numbers
fn customer_id_from(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// PUT /api/customer-details/update-customer-info
///
/// Body is `{customerID, ...fields}`; only the fields present are written.
pub async fn update_customer_info(
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<CustomerInfo> {
    let body = body
        .as_object()
        .ok_or_else(|| ApiError::bad_request("Request body must be an object"))?;
    let customer_id = customer_id_from(body.get("customerID"))
        .ok_or_else(|| ApiError::bad_request("customerID is required"))?;

    let changes = CustomerChanges::from_json(body, false).map_err(ApiError::bad_request)?;
    if changes.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let customer = CustomerService::new()
        .await?
        .update_customer(user.owner_filter(), &customer_id, &changes)
        .await?;

    tracing::info!("{} updated customer {}", user.rm_number, customer_id);
    Ok(ApiResponse::success(customer))
}

/// PUT /api/customer-details/bulk-update-customers
///
/// Body is `{customerIDs: [...], ...fields}`; blank fields are ignored.
pub async fn bulk_update_customers(
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<BulkUpdateResult> {
    let body = body
        .as_object()
        .ok_or_else(|| ApiError::bad_request("Request body must be an object"))?;

    let customer_ids: Vec<String> = body
        .get("customerIDs")
        .and_then(Value::as_array)
        .map(|ids| ids.iter().filter_map(|id| customer_id_from(Some(id))).collect())
        .unwrap_or_default();
    if customer_ids.is_empty() {
        return Err(ApiError::bad_request("customerIDs must be a non-empty array"));
    }

    let changes = CustomerChanges::from_json(body, true).map_err(ApiError::bad_request)?;
    if changes.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let result = CustomerService::new()
        .await?
        .bulk_update_customers(user.owner_filter(), &customer_ids, &changes)
        .await?;
    Ok(ApiResponse::success(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn activity_dates_accept_plain_and_timestamp_forms() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15);
        assert_eq!(parse_activity_date("2024-03-15"), expected);
        assert_eq!(parse_activity_date("2024-03-15T08:30:00.000Z"), expected);
        assert_eq!(parse_activity_date("15/03/2024"), None);
    }

    #[test]
    fn activity_requires_title_and_date() {
        let body = ActivityBody {
            id: None,
            bp_number_wm_core: Some("1001".into()),
            title: Some("  ".into()),
            description: None,
            date: Some("2024-03-15".into()),
        };
        assert_eq!(body.input().unwrap_err().status_code(), 400);

        let body = ActivityBody {
            title: Some("Call".into()),
            date: None,
            ..body
        };
        assert_eq!(body.input().unwrap_err().message(), "date must be a valid date");
    }

    #[test]
    fn customer_ids_may_be_numbers() {
        assert_eq!(customer_id_from(Some(&json!("1001"))), Some("1001".to_string()));
        assert_eq!(customer_id_from(Some(&json!(1001))), Some("1001".to_string()));
        assert_eq!(customer_id_from(Some(&json!(""))), None);
        assert_eq!(customer_id_from(None), None);
    }
}
