use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::config;
use crate::database::models::PageAction;
use crate::handlers::{elevated, protected, public};
use crate::is_development;
use crate::middleware::permissions::{
    CUSTOMER_DETAILS, DASHBOARD_OVERVIEW, UPDATE_CUSTOMER_INFO,
};
use crate::middleware::{
    jwt_auth_middleware, require_admin_middleware, require_page_permission, PermissionGuard,
};

/// The full application router
pub fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/api/auth/login", post(public::login))
        // Protected API
        .merge(protected_routes())
        // Admin only
        .merge(elevated_routes())
        .fallback(public::fallback)
        // Global middleware
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn cors_layer() -> CorsLayer {
    if is_development!() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config()
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

fn protected_routes() -> Router {
    Router::new()
        .merge(auth_routes())
        .merge(overview_routes())
        .merge(customer_list_routes())
        .merge(customer_details_routes())
        .merge(task_manager_routes())
        .merge(market_indices_routes())
        .merge(market_news_routes())
        .merge(dashboard_target_routes())
        .route(
            "/api/permissions/check/*page_path",
            get(protected::permissions::check_permission),
        )
        .route_layer(from_fn(jwt_auth_middleware))
}

fn elevated_routes() -> Router {
    use elevated::{permissions, users};

    Router::new()
        // Account administration
        .route("/api/auth/register", post(users::register))
        .route("/api/auth/users", get(users::list_users))
        .route("/api/auth/update-user/:rm_number", put(users::update_user))
        .route("/api/auth/delete-user/:rm_number", delete(users::delete_user))
        // Page permission matrix
        .route("/api/permissions/pages", get(permissions::list_pages))
        .route("/api/permissions/users", get(permissions::list_users))
        .route(
            "/api/permissions/users/:rm_account_id",
            get(permissions::user_permissions),
        )
        .route(
            "/api/permissions/users/:rm_account_id/pages/:page_id",
            put(permissions::update_user_page).delete(permissions::delete_user_page),
        )
        .route(
            "/api/permissions/users/:rm_account_id/bulk",
            put(permissions::bulk_update_user),
        )
        .route(
            "/api/permissions/defaults/apply-to-all-rm",
            post(permissions::apply_defaults),
        )
        // Layers run bottom-up: the token is checked before the role
        .route_layer(from_fn(require_admin_middleware))
        .route_layer(from_fn(jwt_auth_middleware))
}

fn auth_routes() -> Router {
    use protected::account;

    Router::new()
        .route("/api/auth/whoami", get(account::whoami))
        .route("/api/auth/update-password", put(account::update_password))
}

fn overview_routes() -> Router {
    use protected::overview;

    Router::new()
        .route("/api/overview/total-customer", get(overview::total_customer))
        .route("/api/overview/total-aum", get(overview::total_aum))
        .route("/api/overview/total-fbi", get(overview::total_fbi))
        .route("/api/overview/quarterly-fum", get(overview::quarterly_fum))
        .route("/api/overview/quarterly-fbi", get(overview::quarterly_fbi))
        .route("/api/overview/top-products", get(overview::top_products))
        .route(
            "/api/overview/certain-customer-list",
            get(overview::certain_customer_list),
        )
}

fn customer_list_routes() -> Router {
    use protected::customer_list;

    Router::new()
        .route(
            "/api/customer-list/customer-list",
            get(customer_list::customer_list),
        )
        .route(
            "/api/customer-list/certain-customer-list",
            get(customer_list::certain_customer_list),
        )
}

fn customer_details_routes() -> Router {
    use protected::customer_details as details;

    Router::new()
        .route("/api/customer-details/customer-id-list", get(details::customer_id_list))
        .route("/api/customer-details/customer-details", get(details::customer_details))
        .route(
            "/api/customer-details/recommendation-product",
            get(details::recommendation_product),
        )
        .route(
            "/api/customer-details/customer-portfolio",
            get(details::customer_portfolio),
        )
        .route(
            "/api/customer-details/optimized-portfolio",
            get(details::optimized_portfolio),
        )
        .route(
            "/api/customer-details/return-percentage",
            get(details::return_percentage),
        )
        .route("/api/customer-details/owned-product", get(details::owned_product))
        .route("/api/customer-details/quarterly-aum", get(details::quarterly_aum))
        .route("/api/customer-details/quarterly-fum", get(details::quarterly_fum))
        // Activities, gated by the customer-details page permissions
        .route(
            "/api/customer-details/get-activity",
            get(details::get_activity).layer(from_fn_with_state(
                PermissionGuard::view(CUSTOMER_DETAILS),
                require_page_permission,
            )),
        )
        .route(
            "/api/customer-details/post-activity",
            post(details::post_activity).layer(from_fn_with_state(
                PermissionGuard::add(CUSTOMER_DETAILS),
                require_page_permission,
            )),
        )
        .route(
            "/api/customer-details/update-activity",
            put(details::update_activity).layer(from_fn_with_state(
                PermissionGuard::update(CUSTOMER_DETAILS),
                require_page_permission,
            )),
        )
        .route(
            "/api/customer-details/delete-activity",
            delete(details::delete_activity).layer(from_fn_with_state(
                PermissionGuard::delete(CUSTOMER_DETAILS),
                require_page_permission,
            )),
        )
        // Profile edits
        .route(
            "/api/customer-details/update-customer-info",
            put(details::update_customer_info).layer(from_fn_with_state(
                UPDATE_CUSTOMER_INFO,
                require_page_permission,
            )),
        )
        .route(
            "/api/customer-details/bulk-update-customers",
            put(details::bulk_update_customers).layer(from_fn_with_state(
                PermissionGuard::new(DASHBOARD_OVERVIEW, PageAction::Update),
                require_page_permission,
            )),
        )
}

fn task_manager_routes() -> Router {
    use protected::task_manager as tasks;

    Router::new()
        .route("/api/task-manager/managed-number", get(tasks::managed_number))
        .route("/api/task-manager/increased-number", get(tasks::increased_number))
        .route("/api/task-manager/portfolio", get(tasks::portfolio))
        .route("/api/task-manager/last-transaction", get(tasks::last_transaction))
        .route(
            "/api/task-manager/potential-transaction",
            get(tasks::potential_transaction),
        )
        .route("/api/task-manager/offer-product-risk", get(tasks::offer_product_risk))
        .route(
            "/api/task-manager/re-profile-risk-target",
            get(tasks::reprofile_risk_target),
        )
        .route("/api/task-manager/get-task", get(tasks::get_task))
        .route("/api/task-manager/post-task", post(tasks::post_task))
        .route("/api/task-manager/update-task", put(tasks::update_task))
        .route("/api/task-manager/delete-task", delete(tasks::delete_task))
}

fn market_indices_routes() -> Router {
    use protected::market_indices as market;

    Router::new()
        .route(
            "/api/market-indices/watchlists",
            get(market::get_watchlists)
                .post(market::create_watchlist)
                .put(market::update_watchlist)
                .delete(market::delete_watchlist),
        )
        .route(
            "/api/market-indices/notes",
            get(market::get_notes)
                .post(market::create_note)
                .put(market::update_note)
                .delete(market::delete_note),
        )
}

fn market_news_routes() -> Router {
    use protected::market_news as news;

    Router::new()
        .route(
            "/api/market-news/product-picks",
            get(news::get_product_picks).post(news::create_product_pick),
        )
        .route(
            "/api/market-news/product-picks/:id",
            put(news::update_product_pick).delete(news::delete_product_pick),
        )
        .route(
            "/api/market-news/news-notes",
            get(news::get_news_notes).post(news::create_news_note),
        )
        .route(
            "/api/market-news/news-notes/:id",
            put(news::update_news_note).delete(news::delete_news_note),
        )
}

fn dashboard_target_routes() -> Router {
    use protected::dashboard_targets as targets;

    Router::new()
        .route(
            "/api/dashboard-targets",
            get(targets::list_targets).post(targets::upsert_target),
        )
        .route(
            "/api/dashboard-targets/:metric_type",
            get(targets::get_target)
                .put(targets::update_target)
                .delete(targets::delete_target),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::auth::{generate_jwt, Claims};
    use crate::database::models::Role;

    fn bearer(role: Role) -> String {
        let claims = Claims::new(
            1,
            "RM001@batiinvestasi.ai".to_string(),
            "RM001".to_string(),
            role,
        );
        format!("Bearer {}", generate_jwt(&claims).unwrap())
    }

    async fn call(request: Request<Body>) -> (StatusCode, Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get_request(uri: &str, auth: Option<String>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let (status, body) = call(get_request("/api/overview/total-customer", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "No token provided");
    }

    #[tokio::test]
    async fn garbage_tokens_are_rejected() {
        let request = get_request("/api/task-manager/get-task", Some("Bearer not.a.jwt".into()));
        let (status, body) = call(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid token");
    }

    #[tokio::test]
    async fn admin_routes_reject_regular_users() {
        let (status, body) = call(get_request("/api/auth/users", Some(bearer(Role::User)))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Access denied. Admin privileges required.");

        let (status, _) = call(get_request("/api/permissions/pages", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn users_cannot_read_another_rms_book() {
        let request = get_request(
            "/api/overview/total-customer?rm_number=RM002",
            Some(bearer(Role::User)),
        );
        let (status, body) = call(request).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "You can only access your own customers");
    }

    #[tokio::test]
    async fn unknown_routes_get_json_404() {
        let (status, body) = call(get_request("/api/does-not-exist", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Resource not found");
    }
}
