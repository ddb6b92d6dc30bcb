mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use rm_dashboard_api::database::models::Role;

// Applying defaults writes a row for every regular account in the database, so
// this runs in its own binary, away from tests that create and drop accounts.
// Needs TEST_DATABASE_URL like the other live tests.

#[tokio::test]
async fn default_grants_reach_every_rm() -> Result<()> {
    let Some((server, mut ctx)) = common::live().await? else {
        return Ok(());
    };
    let admin = common::bearer(1, "RM000", Role::Admin);

    let first = ctx.create_account(Role::User).await?;
    let second = ctx.create_account(Role::User).await?;
    let page = ctx.page_id("/recommendation-centre").await?;

    let res = reqwest::Client::new()
        .post(server.url("/api/permissions/defaults/apply-to-all-rm"))
        .header("Authorization", &admin)
        .json(&json!({"permissions": [{"page_id": page, "can_view": true}]}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert!(body["data"]["totalUpdated"].as_u64().unwrap_or(0) >= 2, "{}", body);

    for account in [&first, &second] {
        let (can_view, can_add): (bool, bool) = sqlx::query_as(
            "SELECT can_view, can_add FROM page_permissions
             WHERE rm_account_id = $1 AND page_id = $2",
        )
        .bind(account.id)
        .bind(page)
        .fetch_one(ctx.pool())
        .await?;
        assert!(can_view);
        assert!(!can_add);
    }

    ctx.cleanup().await
}
