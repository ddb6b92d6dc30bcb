mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn login(body: Value) -> Result<(StatusCode, Value)> {
    let server = common::ensure_server().await?;
    let res = reqwest::Client::new()
        .post(server.url("/api/auth/login"))
        .json(&body)
        .send()
        .await?;
    let status = res.status();
    Ok((status, res.json::<Value>().await?))
}

fn failed_fields(body: &Value) -> Vec<String> {
    body["errors"]
        .as_array()
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e["field"].as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn login_rejects_emails_outside_the_rm_format() -> Result<()> {
    let (status, body) = login(json!({"email": "someone@example.com", "password": "secret123"})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(failed_fields(&body), vec!["email"]);
    Ok(())
}

#[tokio::test]
async fn login_requires_six_character_password() -> Result<()> {
    let (status, body) = login(json!({"email": "RM001@batiinvestasi.ai", "password": "123"})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(failed_fields(&body), vec!["password"]);
    Ok(())
}

#[tokio::test]
async fn login_reports_every_failed_field() -> Result<()> {
    let (status, body) = login(json!({})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(failed_fields(&body), vec!["email", "password"]);
    Ok(())
}

#[tokio::test]
async fn login_rejects_malformed_json() -> Result<()> {
    let server = common::ensure_server().await?;
    let res = reqwest::Client::new()
        .post(server.url("/api/auth/login"))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn valid_login_reaches_the_database() -> Result<()> {
    let (status, body) = login(json!({"email": "RM001@batiinvestasi.ai", "password": "secret123"})).await?;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Database temporarily unavailable");
    Ok(())
}
