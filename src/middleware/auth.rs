use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::{validate_jwt, Claims};
use crate::database::models::Role;
use crate::error::ApiError;

/// Authenticated user context extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: i32,
    pub email: String,
    pub rm_number: String,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.id,
            email: claims.email,
            rm_number: claims.rm_number,
            role: claims.role,
        }
    }
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// RM whose book a read endpoint should report on. Admins may name any RM;
    /// everyone else may only name themselves.
    pub fn resolve_rm_scope(&self, requested: Option<&str>) -> Result<String, ApiError> {
        match requested.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(self.rm_number.clone()),
            Some(rm) if self.is_admin() || rm == self.rm_number => Ok(rm.to_string()),
            Some(rm) => {
                tracing::warn!(
                    "RM {} attempted to read the book of {}",
                    self.rm_number,
                    rm
                );
                Err(ApiError::forbidden("You can only access your own customers"))
            }
        }
    }

    /// Ownership filter for writes on customer data: admins are unrestricted
    pub fn owner_filter(&self) -> Option<&str> {
        if self.is_admin() {
            None
        } else {
            Some(self.rm_number.as_str())
        }
    }
}

/// JWT authentication middleware that validates tokens and extracts user context
pub async fn jwt_auth_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;

    let claims = validate_jwt(&token).map_err(|e| {
        tracing::debug!("Rejected bearer token: {}", e);
        ApiError::unauthorized("Invalid token")
    })?;

    request.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(request).await)
}

/// Admin gate; must run after `jwt_auth_middleware`
pub async fn require_admin_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;

    if !user.is_admin() {
        tracing::warn!("Non-admin {} denied access to {}", user.rm_number, request.uri().path());
        return Err(ApiError::forbidden("Access denied. Admin privileges required."));
    }

    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, &'static str> {
    let auth_str = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or("No token provided")?;

    match auth_str.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim().to_string())
        }
        _ => Err("No token provided"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            id: 1,
            email: "RM001@batiinvestasi.ai".to_string(),
            rm_number: "RM001".to_string(),
            role,
        }
    }

    #[test]
    fn extracts_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_jwt_from_headers(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn missing_or_malformed_header_has_no_token() {
        let headers = HeaderMap::new();
        assert_eq!(extract_jwt_from_headers(&headers), Err("No token provided"));

        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer "));
        assert!(extract_jwt_from_headers(&headers).is_err());

        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(extract_jwt_from_headers(&headers).is_err());
    }

    #[test]
    fn rm_scope_defaults_to_own_book() {
        assert_eq!(user(Role::User).resolve_rm_scope(None).unwrap(), "RM001");
        assert_eq!(user(Role::User).resolve_rm_scope(Some("")).unwrap(), "RM001");
        assert_eq!(user(Role::User).resolve_rm_scope(Some("RM001")).unwrap(), "RM001");
    }

    #[test]
    fn rm_scope_blocks_other_books_for_non_admins() {
        let err = user(Role::User).resolve_rm_scope(Some("RM002")).unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert_eq!(user(Role::Admin).resolve_rm_scope(Some("RM002")).unwrap(), "RM002");
    }

    #[test]
    fn owner_filter_is_open_for_admins() {
        assert_eq!(user(Role::Admin).owner_filter(), None);
        assert_eq!(user(Role::User).owner_filter(), Some("RM001"));
    }
}
