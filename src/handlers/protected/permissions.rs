use axum::Extension;

use crate::database::models::permission::{normalize_page_path, PermissionCheck};
use crate::database::models::PermissionFlags;
use crate::middleware::{ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::services::PermissionService;

/// GET /api/permissions/check/*page_path - what the caller may do on one page
///
/// The dashboard calls this before rendering action buttons. Administrators
/// hold every permission; a user without a row for the page holds none.
pub async fn check_permission(
    Extension(user): Extension<AuthUser>,
    ApiPath(page_path): ApiPath<String>,
) -> ApiResult<PermissionCheck> {
    let page_path = normalize_page_path(&page_path);
    if user.is_admin() {
        return Ok(ApiResponse::success(PermissionCheck::new(
            page_path,
            PermissionFlags::all(),
        )));
    }

    let rows = PermissionService::new()
        .await?
        .permissions_for_pages(user.id, std::slice::from_ref(&page_path))
        .await?;

    let flags = rows
        .first()
        .map(|row| PermissionFlags {
            can_view: row.can_view,
            can_add: row.can_add,
            can_update: row.can_update,
            can_delete: row.can_delete,
        })
        .unwrap_or_default();

    tracing::debug!("{} checked {}: {:?}", user.rm_number, page_path, flags);
    Ok(ApiResponse::success(PermissionCheck::new(page_path, flags)))
}
