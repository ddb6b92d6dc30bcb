// testing/mod.rs - seeding helpers for tests that run against a live database
//
// Everything a context creates is keyed by a generated RM number or customer
// id, and `cleanup` removes it again. Customer child rows and page grants go
// with their parent through ON DELETE CASCADE.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::database::models::{PermissionFlags, Role};

/// Environment variable naming the disposable database live tests may write to
pub const TEST_DATABASE_URL: &str = "TEST_DATABASE_URL";

/// The live test database, when one is configured
pub fn test_database_url() -> Option<String> {
    std::env::var(TEST_DATABASE_URL)
        .ok()
        .filter(|url| !url.trim().is_empty())
}

/// Numeric suffix unique within a run and unlikely to repeat across runs.
/// Stays below `i32::MAX` because customer ids are ordered as integers.
fn unique_suffix() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(0);
    let seq = NEXT.fetch_add(1, Ordering::SeqCst) % 100;
    let micros = Utc::now().timestamp_micros().unsigned_abs();
    (micros % 10_000_000) * 100 + seq
}

#[derive(Debug, Clone)]
pub struct TestAccount {
    pub id: i32,
    pub email: String,
    pub rm_number: String,
    pub role: Role,
}

/// One quarter of a customer's allocation; FBI is stored entirely as `fbi_rd`
#[derive(Debug, Clone, Copy, Default)]
pub struct AllocationSeed {
    pub year: i32,
    pub quarter: i32,
    pub fum: f64,
    pub aum: f64,
    pub fbi: f64,
}

pub struct TestContext {
    pool: PgPool,
    rm_numbers: Vec<String>,
    customers: Vec<String>,
}

impl TestContext {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to test database: {}", e))?;

        Ok(Self {
            pool,
            rm_numbers: Vec::new(),
            customers: Vec::new(),
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// A fresh RM number with no rows behind it yet
    pub fn new_rm_number(&mut self) -> String {
        let rm_number = format!("RMT{}", unique_suffix());
        self.rm_numbers.push(rm_number.clone());
        rm_number
    }

    pub async fn create_account(&mut self, role: Role) -> anyhow::Result<TestAccount> {
        let rm_number = self.new_rm_number();
        let email = format!("{}@test.invalid", rm_number.to_lowercase());

        let (id,): (i32,) = sqlx::query_as(
            "INSERT INTO rm_account (email, rm_number, password_hash, role)
             VALUES ($1, $2, 'not-a-bcrypt-hash', $3)
             RETURNING rm_account_id",
        )
        .bind(&email)
        .bind(&rm_number)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(TestAccount {
            id,
            email,
            rm_number,
            role,
        })
    }

    pub async fn page_id(&self, page_path: &str) -> anyhow::Result<i32> {
        let (page_id,): (i32,) = sqlx::query_as("SELECT page_id FROM pages WHERE page_path = $1")
            .bind(page_path)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| anyhow::anyhow!("Page {} is not seeded: {}", page_path, e))?;
        Ok(page_id)
    }

    pub async fn grant(
        &self,
        account: &TestAccount,
        page_path: &str,
        flags: PermissionFlags,
    ) -> anyhow::Result<()> {
        let page_id = self.page_id(page_path).await?;
        sqlx::query(
            "INSERT INTO page_permissions
                 (rm_account_id, page_id, can_view, can_add, can_update, can_delete)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (rm_account_id, page_id) DO UPDATE SET
                 can_view = EXCLUDED.can_view,
                 can_add = EXCLUDED.can_add,
                 can_update = EXCLUDED.can_update,
                 can_delete = EXCLUDED.can_delete",
        )
        .bind(account.id)
        .bind(page_id)
        .bind(flags.can_view)
        .bind(flags.can_add)
        .bind(flags.can_update)
        .bind(flags.can_delete)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Insert a customer for `rm_number`; `risk_profile` '0' marks an unprofiled customer
    pub async fn add_customer(&mut self, rm_number: &str, risk_profile: &str) -> anyhow::Result<String> {
        let customer_id = unique_suffix().to_string();
        sqlx::query(
            "INSERT INTO customer_info (bp_number_wm_core, assigned_rm, risk_profile)
             VALUES ($1, $2, $3)",
        )
        .bind(&customer_id)
        .bind(rm_number)
        .bind(risk_profile)
        .execute(&self.pool)
        .await?;

        self.customers.push(customer_id.clone());
        Ok(customer_id)
    }

    pub async fn add_allocation(&self, customer_id: &str, seed: AllocationSeed) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO current_allocation
                 (bp_number_wm_core, year, quarter, fum, aum, fbi_rd)
             VALUES ($1, $2, $3, $4::float8::numeric, $5::float8::numeric, $6::float8::numeric)",
        )
        .bind(customer_id)
        .bind(seed.year)
        .bind(seed.quarter)
        .bind(seed.fum)
        .bind(seed.aum)
        .bind(seed.fbi)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Remove every row created through this context
    pub async fn cleanup(&mut self) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM customer_info WHERE bp_number_wm_core = ANY($1)")
            .bind(&self.customers)
            .execute(&mut *tx)
            .await?;

        for table in [
            "rm_task_manager",
            "market_watchlists",
            "market_notes",
            "product_picks",
            "news_notes",
            "dashboard_targets",
            "rm_account",
        ] {
            sqlx::query(&format!("DELETE FROM {} WHERE rm_number = ANY($1)", table))
                .bind(&self.rm_numbers)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        self.customers.clear();
        self.rm_numbers.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffixes_are_unique_and_fit_an_integer_id() {
        let a = unique_suffix();
        let b = unique_suffix();
        assert_ne!(a, b);
        assert!(a < i32::MAX as u64);
        assert!(b < i32::MAX as u64);
    }
}
