use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::database::models::permission::{normalize_page_path, PagePermissionWithPage};
use crate::database::models::PageAction;
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::services::PermissionService;

/// Route-level page permission requirement.
/// Passes when the user holds `action` on any of `pages`; administrators always pass.
#[derive(Debug, Clone, Copy)]
pub struct PermissionGuard {
    pages: &'static [&'static str],
    action: PageAction,
    denied_verb: Option<&'static str>,
}

impl PermissionGuard {
    pub const fn new(pages: &'static [&'static str], action: PageAction) -> Self {
        Self {
            pages,
            action,
            denied_verb: None,
        }
    }

    pub const fn view(page: &'static [&'static str]) -> Self {
        Self::new(page, PageAction::View)
    }

    pub const fn add(page: &'static [&'static str]) -> Self {
        Self::new(page, PageAction::Add)
    }

    pub const fn update(page: &'static [&'static str]) -> Self {
        Self::new(page, PageAction::Update)
    }

    pub const fn delete(page: &'static [&'static str]) -> Self {
        Self::new(page, PageAction::Delete)
    }

    fn denied_message(&self) -> String {
        access_denied_message(self.denied_verb.unwrap_or_else(|| self.action.verb()))
    }
}

pub const CUSTOMER_DETAILS: &[&str] = &["/customer-details"];
pub const DASHBOARD_OVERVIEW: &[&str] = &["/dashboard-overview"];

/// Customer profile edits are allowed from either the details page or the overview table
pub const UPDATE_CUSTOMER_INFO: PermissionGuard = PermissionGuard {
    pages: &["/customer-details", "/dashboard-overview"],
    action: PageAction::Update,
    denied_verb: Some("memperbarui"),
};

pub fn access_denied_message(verb: &str) -> String {
    format!(
        "Akses ditolak. Anda tidak memiliki izin untuk {} di halaman ini. \
         Silakan hubungi administrator Anda jika Anda memerlukan akses.",
        verb
    )
}

/// True when any of the user's rows for the guarded pages grants the action
pub fn grants_action(rows: &[PagePermissionWithPage], action: PageAction) -> bool {
    rows.iter().any(|row| row.allows(action))
}

/// Page permission middleware; must run after `jwt_auth_middleware`.
/// Attach with `axum::middleware::from_fn_with_state(guard, require_page_permission)`.
pub async fn require_page_permission(
    State(guard): State<PermissionGuard>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;

    if user.is_admin() {
        return Ok(next.run(request).await);
    }

    let page_paths: Vec<String> = guard.pages.iter().map(|p| normalize_page_path(p)).collect();

    let rows = lookup(user.id, &page_paths).await.map_err(|e| {
        tracing::error!("Permission lookup failed for {}: {}", user.rm_number, e);
        ApiError::internal_server_error("Internal server error")
    })?;

    if !grants_action(&rows, guard.action) {
        tracing::warn!(
            "{} denied {:?} on {:?}",
            user.rm_number,
            guard.action,
            guard.pages
        );
        return Err(ApiError::forbidden(guard.denied_message()));
    }

    Ok(next.run(request).await)
}

async fn lookup(
    rm_account_id: i32,
    page_paths: &[String],
) -> Result<Vec<PagePermissionWithPage>, crate::database::DatabaseError> {
    PermissionService::new()
        .await?
        .permissions_for_pages(rm_account_id, page_paths)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn row(page_path: &str, can_update: bool) -> PagePermissionWithPage {
        PagePermissionWithPage {
            permission_id: 1,
            rm_account_id: 9,
            page_id: 1,
            can_view: true,
            can_add: false,
            can_update,
            can_delete: false,
            can_download: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            page_path: page_path.to_string(),
            page_name: page_path.trim_start_matches('/').to_string(),
            page_label: page_path.to_string(),
        }
    }

    #[test]
    fn any_guarded_page_may_grant() {
        let rows = vec![row("/customer-details", false), row("/dashboard-overview", true)];
        assert!(grants_action(&rows, PageAction::Update));
        assert!(grants_action(&rows, PageAction::View));
        assert!(!grants_action(&rows, PageAction::Delete));
    }

    #[test]
    fn no_rows_means_no_access() {
        assert!(!grants_action(&[], PageAction::View));
    }

    #[test]
    fn denial_names_the_action() {
        let message = PermissionGuard::add(CUSTOMER_DETAILS).denied_message();
        assert!(message.starts_with("Akses ditolak. Anda tidak memiliki izin untuk create di halaman ini."));
        assert!(message.ends_with("jika Anda memerlukan akses."));

        let message = UPDATE_CUSTOMER_INFO.denied_message();
        assert!(message.contains("izin untuk memperbarui di halaman ini"));
    }
}
