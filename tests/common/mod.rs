#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::StatusCode;

use rm_dashboard_api::auth::Claims;
use rm_dashboard_api::database::models::Role;
use rm_dashboard_api::testing::{test_database_url, TestAccount, TestContext};

/// Secret the spawned server signs and verifies tokens with
pub const TEST_JWT_SECRET: &str = "integration-test-secret";

/// Nothing listens on port 1, so every database call fails fast
const UNREACHABLE_DATABASE_URL: &str = "postgres://rm:rm@127.0.0.1:1/rm_dashboard";

static SERVER: OnceLock<TestServer> = OnceLock::new();
static LIVE_SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn(database_url: &str, run_migrations: bool) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_rm-dashboard-api"));
        cmd.env("APP_ENV", "development")
            .env("HOST", "127.0.0.1")
            .env("RM_API_PORT", port.to_string())
            .env("JWT_SECRET", TEST_JWT_SECRET)
            .env("DATABASE_URL", database_url)
            .env("DATABASE_CONNECTION_TIMEOUT", if run_migrations { "5" } else { "1" })
            .env("DATABASE_RUN_MIGRATIONS", run_migrations.to_string())
            .env("RUST_LOG", "rm_dashboard_api=warn")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                // Without a database the server still answers, just degraded
                if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| {
        TestServer::spawn(UNREACHABLE_DATABASE_URL, false).expect("failed to spawn server binary")
    });
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Server backed by the database in TEST_DATABASE_URL, migrated on startup,
/// plus a seeding context on the same database. `None` when no database is configured.
pub async fn live() -> Result<Option<(&'static TestServer, TestContext)>> {
    let Some(database_url) = test_database_url() else {
        eprintln!("TEST_DATABASE_URL not set; skipping database-backed test");
        return Ok(None);
    };

    let server = LIVE_SERVER.get_or_init(|| {
        TestServer::spawn(&database_url, true).expect("failed to spawn server binary")
    });
    server.wait_ready(Duration::from_secs(30)).await?;

    let ctx = TestContext::connect(&database_url).await?;
    Ok(Some((server, ctx)))
}

/// Bearer header for a seeded account
pub fn bearer_for(account: &TestAccount) -> String {
    bearer(account.id, &account.rm_number, account.role)
}

/// Bearer header value for a token the test server accepts
pub fn bearer(id: i32, rm_number: &str, role: Role) -> String {
    let email = format!("{}@batiinvestasi.ai", rm_number);
    let claims = Claims::new(id, email, rm_number.to_string(), role);
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("sign test token");
    format!("Bearer {}", token)
}
