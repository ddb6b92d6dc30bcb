use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Page {
    pub page_id: i32,
    pub page_path: String,
    pub page_name: String,
    pub page_label: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of the user x page matrix
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PagePermission {
    pub permission_id: i32,
    pub rm_account_id: i32,
    pub page_id: i32,
    pub can_view: bool,
    pub can_add: bool,
    pub can_update: bool,
    pub can_delete: bool,
    pub can_download: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A permission row joined with the page it grants access to
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PagePermissionWithPage {
    pub permission_id: i32,
    pub rm_account_id: i32,
    pub page_id: i32,
    pub can_view: bool,
    pub can_add: bool,
    pub can_update: bool,
    pub can_delete: bool,
    pub can_download: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub page_path: String,
    pub page_name: String,
    pub page_label: String,
}

impl PagePermissionWithPage {
    pub fn allows(&self, action: PageAction) -> bool {
        action.granted_by(&PermissionFlags {
            can_view: self.can_view,
            can_add: self.can_add,
            can_update: self.can_update,
            can_delete: self.can_delete,
        }) || (action == PageAction::Download && self.can_download)
    }
}

/// Matrix cell as reported in the admin overview; missing rows read as all-false
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageGrant {
    pub page_id: i32,
    pub page_path: String,
    pub page_name: String,
    pub page_label: String,
    pub can_view: bool,
    pub can_add: bool,
    pub can_update: bool,
    pub can_delete: bool,
    pub can_download: bool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserPermissionMatrix {
    pub rm_account_id: i32,
    pub email: String,
    pub rm_number: String,
    pub role: String,
    pub permissions: Json<Vec<PageGrant>>,
}

/// The four flags an administrator controls. `can_download` is always granted on write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionFlags {
    pub can_view: bool,
    pub can_add: bool,
    pub can_update: bool,
    pub can_delete: bool,
}

impl PermissionFlags {
    pub fn all() -> Self {
        Self {
            can_view: true,
            can_add: true,
            can_update: true,
            can_delete: true,
        }
    }
}

/// Effective permission for the current user on one page
#[derive(Debug, Clone, Serialize)]
pub struct PermissionCheck {
    pub can_view: bool,
    pub can_add: bool,
    pub can_update: bool,
    pub can_delete: bool,
    pub can_download: bool,
    pub page_path: String,
}

impl PermissionCheck {
    /// Download is never restricted
    pub fn new(page_path: String, flags: PermissionFlags) -> Self {
        Self {
            can_view: flags.can_view,
            can_add: flags.can_add,
            can_update: flags.can_update,
            can_delete: flags.can_delete,
            can_download: true,
            page_path,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageAction {
    View,
    Add,
    Update,
    Delete,
    Download,
}

impl PageAction {
    /// Whether the given flags grant this action. Download is governed by `can_download`,
    /// which is not part of `PermissionFlags`, so it is never granted here.
    pub fn granted_by(&self, flags: &PermissionFlags) -> bool {
        match self {
            PageAction::View => flags.can_view,
            PageAction::Add => flags.can_add,
            PageAction::Update => flags.can_update,
            PageAction::Delete => flags.can_delete,
            PageAction::Download => false,
        }
    }

    /// Verb used in the localized access-denied message
    pub fn verb(&self) -> &'static str {
        match self {
            PageAction::View => "view",
            PageAction::Add => "create",
            PageAction::Update => "update",
            PageAction::Delete => "delete",
            PageAction::Download => "download",
        }
    }
}

/// Page paths are stored with a leading slash; callers may omit it.
pub fn normalize_page_path(page_path: &str) -> String {
    if page_path.starts_with('/') {
        page_path.to_string()
    } else {
        format!("/{}", page_path)
    }
}
