use axum::Extension;
use serde::Deserialize;

use crate::database::models::customer::CustomerListRow;
use crate::handlers::RmQuery;
use crate::middleware::{ApiQuery, ApiResponse, ApiResult, AuthUser};
use crate::services::CustomerService;

/// GET /api/customer-list/customer-list - the RM's customers with latest totals
pub async fn customer_list(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<RmQuery>,
) -> ApiResult<Vec<CustomerListRow>> {
    let rm_number = user.resolve_rm_scope(query.rm_number.as_deref())?;
    let rows = CustomerService::new().await?.customer_list(&rm_number).await?;
    Ok(ApiResponse::success(rows))
}

#[derive(Debug, Deserialize)]
pub struct CustomerFilterQuery {
    pub rm_number: Option<String>,
    pub propensity: Option<String>,
    pub aum: Option<String>,
}

/// GET /api/customer-list/certain-customer-list?propensity=&aum=
pub async fn certain_customer_list(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<CustomerFilterQuery>,
) -> ApiResult<Vec<CustomerListRow>> {
    let rm_number = user.resolve_rm_scope(query.rm_number.as_deref())?;
    let propensity = query.propensity.as_deref().filter(|s| !s.is_empty());
    let aum = query.aum.as_deref().filter(|s| !s.is_empty());

    let rows = CustomerService::new()
        .await?
        .filtered_customer_list(&rm_number, propensity, aum)
        .await?;
    Ok(ApiResponse::success(rows))
}
