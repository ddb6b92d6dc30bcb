pub mod auth;
pub mod extract;
pub mod permissions;
pub mod response;

pub use auth::{jwt_auth_middleware, require_admin_middleware, AuthUser};
pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use permissions::{require_page_permission, PermissionGuard};
pub use response::{ApiResponse, ApiResult};
