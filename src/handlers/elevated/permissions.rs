// handlers/elevated/permissions.rs - /api/permissions/* administration
//
// The matrix editor in the admin screen. Every write stores `can_download =
// true`; only the four flags below are under administrator control.

use serde::Serialize;
use serde_json::Value;

use crate::database::models::permission::{PagePermissionWithPage, UserPermissionMatrix};
use crate::database::models::{Page, PagePermission, PermissionFlags};
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult};
use crate::services::permission_service::PageGrantRequest;
use crate::services::PermissionService;

const FLAG_FIELDS: [&str; 4] = ["can_view", "can_add", "can_update", "can_delete"];

#[derive(Debug, Serialize)]
pub struct PermissionSaved {
    pub message: &'static str,
    pub permission: PagePermission,
}

#[derive(Debug, Serialize)]
pub struct PermissionsSaved {
    pub message: &'static str,
    pub permissions: Vec<PagePermission>,
}

#[derive(Debug, Serialize)]
pub struct DefaultsApplied {
    pub message: &'static str,
    #[serde(rename = "totalUpdated")]
    pub total_updated: u64,
}

fn parse_user_id(raw: &str) -> Result<i32, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid user ID"))
}

fn parse_user_and_page(raw_user: &str, raw_page: &str) -> Result<(i32, i32), ApiError> {
    match (raw_user.trim().parse(), raw_page.trim().parse()) {
        (Ok(user), Ok(page)) => Ok((user, page)),
        _ => Err(ApiError::bad_request("Invalid user ID or page ID")),
    }
}

/// All four flags must be present and boolean
fn strict_flags(body: &Value) -> Result<PermissionFlags, ApiError> {
    let mut values = [false; 4];
    for (slot, field) in values.iter_mut().zip(FLAG_FIELDS) {
        *slot = body
            .get(field)
            .and_then(Value::as_bool)
            .ok_or_else(|| ApiError::bad_request("All permission fields must be boolean"))?;
    }
    let [can_view, can_add, can_update, can_delete] = values;
    Ok(PermissionFlags {
        can_view,
        can_add,
        can_update,
        can_delete,
    })
}

/// `{permissions: [{page_id, can_*?}]}`; a missing or non-boolean flag counts as false
fn grant_list(body: &Value) -> Result<Vec<PageGrantRequest>, ApiError> {
    let items = body
        .get("permissions")
        .and_then(Value::as_array)
        .ok_or_else(|| ApiError::bad_request("Permissions must be an array"))?;

    items
        .iter()
        .map(|item| {
            let page_id = item
                .get("page_id")
                .and_then(Value::as_i64)
                .and_then(|id| i32::try_from(id).ok())
                .ok_or_else(|| ApiError::bad_request("Each permission needs a numeric page_id"))?;
            let flag = |field: &str| item.get(field).and_then(Value::as_bool).unwrap_or(false);
            Ok(PageGrantRequest {
                page_id,
                flags: PermissionFlags {
                    can_view: flag("can_view"),
                    can_add: flag("can_add"),
                    can_update: flag("can_update"),
                    can_delete: flag("can_delete"),
                },
            })
        })
        .collect()
}

/// GET /api/permissions/pages
pub async fn list_pages() -> ApiResult<Vec<Page>> {
    let pages = PermissionService::new().await?.list_pages().await?;
    Ok(ApiResponse::success(pages))
}

/// GET /api/permissions/users - every RM with a full page matrix
pub async fn list_users() -> ApiResult<Vec<UserPermissionMatrix>> {
    let users = PermissionService::new().await?.list_user_matrices().await?;
    Ok(ApiResponse::success(users))
}

/// GET /api/permissions/users/:rm_account_id
pub async fn user_permissions(
    ApiPath(rm_account_id): ApiPath<String>,
) -> ApiResult<Vec<PagePermissionWithPage>> {
    let rm_account_id = parse_user_id(&rm_account_id)?;
    let rows = PermissionService::new()
        .await?
        .user_permissions(rm_account_id)
        .await?;
    Ok(ApiResponse::success(rows))
}

/// PUT /api/permissions/users/:rm_account_id/pages/:page_id
pub async fn update_user_page(
    ApiPath((rm_account_id, page_id)): ApiPath<(String, String)>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<PermissionSaved> {
    let (rm_account_id, page_id) = parse_user_and_page(&rm_account_id, &page_id)?;
    let flags = strict_flags(&body)?;

    let permission = PermissionService::new()
        .await?
        .upsert(rm_account_id, PageGrantRequest { page_id, flags })
        .await?;

    tracing::info!("Permissions of account {} on page {} set to {:?}", rm_account_id, page_id, flags);
    Ok(ApiResponse::success(PermissionSaved {
        message: "Permissions updated successfully",
        permission,
    }))
}

/// PUT /api/permissions/users/:rm_account_id/bulk - all pages in one transaction
pub async fn bulk_update_user(
    ApiPath(rm_account_id): ApiPath<String>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<PermissionsSaved> {
    let rm_account_id = parse_user_id(&rm_account_id)?;
    let grants = grant_list(&body)?;

    let permissions = PermissionService::new()
        .await?
        .bulk_upsert(rm_account_id, &grants)
        .await?;

    tracing::info!("Saved {} page permissions for account {}", permissions.len(), rm_account_id);
    Ok(ApiResponse::success(PermissionsSaved {
        message: "Permissions updated successfully",
        permissions,
    }))
}

/// DELETE /api/permissions/users/:rm_account_id/pages/:page_id
pub async fn delete_user_page(
    ApiPath((rm_account_id, page_id)): ApiPath<(String, String)>,
) -> ApiResult<Value> {
    let (rm_account_id, page_id) = parse_user_and_page(&rm_account_id, &page_id)?;
    PermissionService::new()
        .await?
        .delete(rm_account_id, page_id)
        .await?;
    Ok(ApiResponse::message("Permission deleted successfully"))
}

/// POST /api/permissions/defaults/apply-to-all-rm
pub async fn apply_defaults(ApiJson(body): ApiJson<Value>) -> ApiResult<DefaultsApplied> {
    let grants = grant_list(&body)?;
    let total_updated = PermissionService::new()
        .await?
        .apply_to_all_users(&grants)
        .await?;

    tracing::info!("Applied {} default page grants, {} rows written", grants.len(), total_updated);
    Ok(ApiResponse::success(DefaultsApplied {
        message: "Default permissions applied to all RM users successfully",
        total_updated,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ids_must_be_integers() {
        assert_eq!(parse_user_id("12").unwrap(), 12);
        assert_eq!(parse_user_id("abc").unwrap_err().message(), "Invalid user ID");
        assert_eq!(parse_user_and_page("3", "9").unwrap(), (3, 9));
        assert_eq!(
            parse_user_and_page("3", "x").unwrap_err().message(),
            "Invalid user ID or page ID"
        );
    }

    #[test]
    fn single_page_update_requires_every_flag_as_boolean() {
        let flags = strict_flags(&json!({
            "can_view": true, "can_add": false, "can_update": true, "can_delete": false
        }))
        .unwrap();
        assert!(flags.can_view && flags.can_update);
        assert!(!flags.can_add && !flags.can_delete);

        let missing = strict_flags(&json!({"can_view": true, "can_add": true, "can_update": true}));
        assert_eq!(missing.unwrap_err().message(), "All permission fields must be boolean");

        let stringly = strict_flags(&json!({
            "can_view": "true", "can_add": false, "can_update": false, "can_delete": false
        }));
        assert!(stringly.is_err());
    }

    #[test]
    fn bulk_grants_default_missing_flags_to_false() {
        let grants = grant_list(&json!({
            "permissions": [
                {"page_id": 1, "can_view": true},
                {"page_id": 2, "can_view": true, "can_add": true, "can_update": true, "can_delete": true}
            ]
        }))
        .unwrap();

        assert_eq!(grants.len(), 2);
        assert_eq!(grants[0].page_id, 1);
        assert_eq!(
            grants[0].flags,
            PermissionFlags { can_view: true, ..PermissionFlags::default() }
        );
        assert_eq!(grants[1].flags, PermissionFlags::all());
    }

    #[test]
    fn bulk_grants_reject_non_arrays() {
        let err = grant_list(&json!({"permissions": {"page_id": 1}})).unwrap_err();
        assert_eq!(err.message(), "Permissions must be an array");
        assert!(grant_list(&json!({})).is_err());
        assert!(grant_list(&json!({"permissions": [{"can_view": true}]})).is_err());
    }
}
