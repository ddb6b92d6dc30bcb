// handlers/protected/overview.rs - /api/overview/*
//
// Headline numbers for the dashboard overview page. Every endpoint reports on
// one RM's book: the caller's, or the `rm_number` an administrator names.

use axum::Extension;
use serde::Deserialize;

use crate::database::models::customer::CustomerListRow;
use crate::database::models::overview::{QuarterlyYear, RiskBreakdown, TopProduct};
use crate::error::ApiError;
use crate::handlers::RmQuery;
use crate::middleware::{ApiQuery, ApiResponse, ApiResult, AuthUser};
use crate::services::OverviewService;

/// GET /api/overview/total-customer
pub async fn total_customer(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<RmQuery>,
) -> ApiResult<RiskBreakdown<i64>> {
    let rm_number = user.resolve_rm_scope(query.rm_number.as_deref())?;
    let counts = OverviewService::new().await?.total_customers(&rm_number).await?;
    Ok(ApiResponse::success(counts))
}

/// GET /api/overview/total-aum
pub async fn total_aum(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<RmQuery>,
) -> ApiResult<RiskBreakdown<f64>> {
    let rm_number = user.resolve_rm_scope(query.rm_number.as_deref())?;
    let sums = OverviewService::new().await?.total_aum(&rm_number).await?;
    Ok(ApiResponse::success(sums))
}

/// GET /api/overview/total-fbi
pub async fn total_fbi(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<RmQuery>,
) -> ApiResult<RiskBreakdown<f64>> {
    let rm_number = user.resolve_rm_scope(query.rm_number.as_deref())?;
    let sums = OverviewService::new().await?.total_fbi(&rm_number).await?;
    Ok(ApiResponse::success(sums))
}

/// GET /api/overview/quarterly-fum - up to six recent quarters, grouped by year
pub async fn quarterly_fum(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<RmQuery>,
) -> ApiResult<Vec<QuarterlyYear>> {
    let rm_number = user.resolve_rm_scope(query.rm_number.as_deref())?;
    let years = OverviewService::new().await?.quarterly_fum(&rm_number).await?;
    Ok(ApiResponse::success(years))
}

/// GET /api/overview/quarterly-fbi - up to six recent quarters, grouped by year
pub async fn quarterly_fbi(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<RmQuery>,
) -> ApiResult<Vec<QuarterlyYear>> {
    let rm_number = user.resolve_rm_scope(query.rm_number.as_deref())?;
    let years = OverviewService::new().await?.quarterly_fbi(&rm_number).await?;
    Ok(ApiResponse::success(years))
}

/// GET /api/overview/top-products
pub async fn top_products(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<RmQuery>,
) -> ApiResult<RiskBreakdown<Vec<TopProduct>>> {
    let rm_number = user.resolve_rm_scope(query.rm_number.as_deref())?;
    let products = OverviewService::new().await?.top_products(&rm_number).await?;
    Ok(ApiResponse::success(products))
}

#[derive(Debug, Deserialize)]
pub struct RiskListQuery {
    pub rm_number: Option<String>,
    #[serde(rename = "customerRisk")]
    pub customer_risk: Option<String>,
}

/// GET /api/overview/certain-customer-list?customerRisk=
pub async fn certain_customer_list(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<RiskListQuery>,
) -> ApiResult<Vec<CustomerListRow>> {
    let rm_number = user.resolve_rm_scope(query.rm_number.as_deref())?;
    let risk = query
        .customer_risk
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("customerRisk is required"))?;

    let rows = OverviewService::new()
        .await?
        .customers_with_risk(&rm_number, &risk)
        .await?;
    Ok(ApiResponse::success(rows))
}
