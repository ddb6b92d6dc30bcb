mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use rm_dashboard_api::database::models::{PermissionFlags, Role};
use rm_dashboard_api::testing::AllocationSeed;

// These tests need a disposable, migratable Postgres in TEST_DATABASE_URL.
// Without it they return early. Seeded rows are removed at the end of each test.

const CONSERVATIVE: &str = "1 - Conservative";
const UNPROFILED: &str = "0";

fn number(value: &Value) -> f64 {
    value.as_f64().unwrap_or(f64::NAN)
}

#[tokio::test]
async fn page_guard_follows_granted_flags() -> Result<()> {
    let Some((server, mut ctx)) = common::live().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();

    let viewer = ctx.create_account(Role::User).await?;
    let outsider = ctx.create_account(Role::User).await?;
    ctx.grant(
        &viewer,
        "/customer-details",
        PermissionFlags {
            can_view: true,
            ..PermissionFlags::default()
        },
    )
    .await?;
    let customer = ctx.add_customer(&viewer.rm_number, CONSERVATIVE).await?;
    let activity_url = server.url(&format!(
        "/api/customer-details/get-activity?bp_number_wm_core={}",
        customer
    ));

    // A granted view flag lets the request through to the handler
    let res = client
        .get(&activity_url)
        .header("Authorization", common::bearer_for(&viewer))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"], json!([]));

    // No row for the page means no access
    let res = client
        .get(&activity_url)
        .header("Authorization", common::bearer_for(&outsider))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let error = res.json::<Value>().await?["error"].as_str().unwrap_or_default().to_string();
    assert!(error.starts_with("Akses ditolak"), "{}", error);
    assert!(error.contains("view"), "{}", error);

    // View alone does not allow adding
    let res = client
        .post(server.url("/api/customer-details/post-activity"))
        .header("Authorization", common::bearer_for(&viewer))
        .json(&json!({"bp_number_wm_core": customer, "title": "Call", "date": "2024-05-02"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .get(server.url("/api/permissions/check/customer-details"))
        .header("Authorization", common::bearer_for(&viewer))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let check = res.json::<Value>().await?["data"].clone();
    assert_eq!(check["can_view"], true);
    assert_eq!(check["can_add"], false);
    assert_eq!(check["can_download"], true);
    assert_eq!(check["page_path"], "/customer-details");

    ctx.cleanup().await
}

#[tokio::test]
async fn bulk_grants_are_all_or_nothing() -> Result<()> {
    let Some((server, mut ctx)) = common::live().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let admin = common::bearer(1, "RM000", Role::Admin);

    let rm = ctx.create_account(Role::User).await?;
    let news = ctx.page_id("/market-news").await?;
    let indices = ctx.page_id("/market-indices").await?;
    let bulk_url = server.url(&format!("/api/permissions/users/{}/bulk", rm.id));
    let rows_url = server.url(&format!("/api/permissions/users/{}", rm.id));

    // The unknown page fails the whole batch
    let res = client
        .put(&bulk_url)
        .header("Authorization", &admin)
        .json(&json!({"permissions": [
            {"page_id": news, "can_view": true},
            {"page_id": 999_999, "can_view": true}
        ]}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client.get(&rows_url).header("Authorization", &admin).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["data"], json!([]));

    let res = client
        .put(&bulk_url)
        .header("Authorization", &admin)
        .json(&json!({"permissions": [
            {"page_id": news, "can_view": true},
            {"page_id": indices, "can_view": true, "can_update": true}
        ]}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let saved = res.json::<Value>().await?;
    assert_eq!(saved["data"]["permissions"].as_array().map(Vec::len), Some(2));

    let res = client.get(&rows_url).header("Authorization", &admin).send().await?;
    let rows = res.json::<Value>().await?["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(rows.len(), 2);
    let news_row = rows
        .iter()
        .find(|row| row["page_path"] == "/market-news")
        .cloned()
        .unwrap_or_default();
    assert_eq!(news_row["can_view"], true);
    assert_eq!(news_row["can_add"], false);
    assert_eq!(news_row["can_download"], true);

    ctx.cleanup().await
}

#[tokio::test]
async fn duplicate_product_pick_is_a_conflict() -> Result<()> {
    let Some((server, mut ctx)) = common::live().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let rm = ctx.create_account(Role::User).await?;
    let pick = json!({"ticker": "BBCA", "pick_date": "2024-05-02", "reason": "Earnings"});

    let res = client
        .post(server.url("/api/market-news/product-picks"))
        .header("Authorization", common::bearer_for(&rm))
        .json(&pick)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .post(server.url("/api/market-news/product-picks"))
        .header("Authorization", common::bearer_for(&rm))
        .json(&pick)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(
        res.json::<Value>().await?["error"],
        "Product pick already exists for this date"
    );

    let res = client
        .get(server.url("/api/market-news/product-picks?pick_date=2024-05-02"))
        .header("Authorization", common::bearer_for(&rm))
        .send()
        .await?;
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["picks"].as_array().map(Vec::len), Some(1));

    ctx.cleanup().await
}

#[tokio::test]
async fn book_totals_sum_quarters_and_skip_unprofiled_customers() -> Result<()> {
    let Some((server, mut ctx)) = common::live().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();
    let rm = ctx.create_account(Role::User).await?;
    let token = common::bearer_for(&rm);

    let profiled = ctx.add_customer(&rm.rm_number, CONSERVATIVE).await?;
    ctx.add_allocation(
        &profiled,
        AllocationSeed { year: 2024, quarter: 1, fum: 100.0, aum: 100.0, fbi: 10.0 },
    )
    .await?;
    ctx.add_allocation(
        &profiled,
        AllocationSeed { year: 2024, quarter: 2, fum: 200.0, aum: 200.0, fbi: 20.0 },
    )
    .await?;

    let unprofiled = ctx.add_customer(&rm.rm_number, UNPROFILED).await?;
    ctx.add_allocation(
        &unprofiled,
        AllocationSeed { year: 2024, quarter: 2, fum: 1000.0, aum: 1000.0, fbi: 5.0 },
    )
    .await?;

    let get = |path: &str| {
        client
            .get(server.url(path))
            .header("Authorization", token.clone())
            .send()
    };

    // Customer rows carry totals over every quarter
    let list = get("/api/customer-list/customer-list").await?.json::<Value>().await?;
    let rows = list["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(rows.len(), 2);
    let row = rows
        .iter()
        .find(|row| row["Customer ID"] == profiled.as_str())
        .cloned()
        .unwrap_or_default();
    assert_eq!(number(&row["Total FUM"]), 300.0);
    assert_eq!(number(&row["Total AUM"]), 300.0);
    assert_eq!(number(&row["Total FBI"]), 30.0);

    let detail = get(&format!("/api/customer-details/customer-details?customerID={}", profiled))
        .await?
        .json::<Value>()
        .await?;
    assert_eq!(number(&detail["data"]["Total_FUM"]), 300.0);
    assert_eq!(number(&detail["data"]["Total_AUM"]), 300.0);

    // Task manager counts and AUM leave out the unprofiled customer; FBI does not
    let managed = get("/api/task-manager/managed-number").await?.json::<Value>().await?;
    let managed = &managed["data"][0];
    assert_eq!(managed["all_customers"], 1);
    assert_eq!(number(&managed["all_aum"]), 300.0);
    assert_eq!(number(&managed["all_fbi"]), 35.0);

    let customers = get("/api/overview/total-customer").await?.json::<Value>().await?;
    assert_eq!(customers["data"]["all"], 1);
    assert_eq!(customers["data"]["conservative"], 1);

    // Quarterly views include every customer in `all`
    let quarterly = get("/api/overview/quarterly-fum").await?.json::<Value>().await?;
    let years = quarterly["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(years.len(), 1);
    assert_eq!(years[0]["year"], 2024);
    let quarters = &years[0]["quarters"];
    assert_eq!(number(&quarters["all"]["q1"]), 100.0);
    assert_eq!(number(&quarters["all"]["q2"]), 1200.0);
    assert_eq!(number(&quarters["conservative"]["q2"]), 200.0);

    ctx.cleanup().await
}
