use sqlx::PgPool;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::customer::CustomerListRow;
use crate::database::models::overview::{
    group_top_products, pivot_quarterly, QuarterlyRiskRow, QuarterlyYear, RankedProductRow,
    RiskBreakdown, RiskProfile, TopProduct,
};
use crate::services::customer_service::customer_rows_sql;

type SixCounts = (i64, i64, i64, i64, i64, i64);
type SixSums = (f64, f64, f64, f64, f64, f64);

const FBI: &str = "(ca.fbi_rd + ca.fbi_sb + ca.fbi_bac)";

/// `aggregate` is applied once for the profiled total and once per risk bucket,
/// e.g. `SUM(ca.aum)` or `COUNT(DISTINCT ci.bp_number_wm_core)`.
fn risk_columns(aggregate: &str, all_condition: &str, cast: &str) -> String {
    let mut columns = vec![format!(
        "COALESCE({} FILTER (WHERE {}), 0)::{} AS \"all\"",
        aggregate, all_condition, cast
    )];

    for profile in RiskProfile::ALL {
        columns.push(format!(
            "COALESCE({} FILTER (WHERE ci.risk_profile = '{}'), 0)::{} AS {}",
            aggregate,
            profile.label(),
            cast,
            profile.name().to_lowercase()
        ));
    }

    columns.join(",\n       ")
}

/// Quarterly `all` includes unprofiled customers, unlike the headline totals
fn quarterly_sql(value: &str) -> String {
    format!(
        "SELECT ca.year, ca.quarter,
       {}
FROM customer_info ci
JOIN current_allocation ca ON ca.bp_number_wm_core = ci.bp_number_wm_core
WHERE ci.assigned_rm = $1
GROUP BY ca.year, ca.quarter
HAVING SUM({}) > 0
ORDER BY ca.year DESC, ca.quarter DESC
LIMIT 6",
        risk_columns(&format!("SUM({})", value), "ci.risk_profile IS NOT NULL", "float8"),
        value
    )
}

/// Aggregates behind the dashboard overview page, scoped to one RM's book
pub struct OverviewService {
    pool: PgPool,
}

impl OverviewService {
    pub async fn new() -> Result<Self, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    /// Customer counts; `all` leaves out unprofiled customers
    pub async fn total_customers(&self, rm_number: &str) -> Result<RiskBreakdown<i64>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM customer_info ci WHERE ci.assigned_rm = $1",
            risk_columns(
                "COUNT(DISTINCT ci.bp_number_wm_core)",
                "ci.risk_profile <> '0'",
                "int8"
            )
        );

        let counts: SixCounts = sqlx::query_as(&sql)
            .bind(rm_number)
            .fetch_one(&self.pool)
            .await?;

        Ok(counts.into())
    }

    pub async fn total_aum(&self, rm_number: &str) -> Result<RiskBreakdown<f64>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM customer_info ci
             LEFT JOIN current_allocation ca ON ca.bp_number_wm_core = ci.bp_number_wm_core
             WHERE ci.assigned_rm = $1",
            risk_columns("SUM(ca.aum)", "ci.risk_profile <> '0'", "float8")
        );

        let sums: SixSums = sqlx::query_as(&sql)
            .bind(rm_number)
            .fetch_one(&self.pool)
            .await?;

        Ok(sums.into())
    }

    /// Fee-based income is the sum of the RD, SB and BAC fee columns
    pub async fn total_fbi(&self, rm_number: &str) -> Result<RiskBreakdown<f64>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM customer_info ci
             LEFT JOIN current_allocation ca ON ca.bp_number_wm_core = ci.bp_number_wm_core
             WHERE ci.assigned_rm = $1",
            risk_columns(&format!("SUM({})", FBI), "ci.risk_profile IS NOT NULL", "float8")
        );

        let sums: SixSums = sqlx::query_as(&sql)
            .bind(rm_number)
            .fetch_one(&self.pool)
            .await?;

        Ok(sums.into())
    }

    pub async fn quarterly_fum(&self, rm_number: &str) -> Result<Vec<QuarterlyYear>, DatabaseError> {
        self.quarterly("ca.fum", rm_number).await
    }

    pub async fn quarterly_fbi(&self, rm_number: &str) -> Result<Vec<QuarterlyYear>, DatabaseError> {
        self.quarterly(FBI, rm_number).await
    }

    async fn quarterly(&self, value: &str, rm_number: &str) -> Result<Vec<QuarterlyYear>, DatabaseError> {
        let rows = sqlx::query_as::<_, QuarterlyRiskRow>(&quarterly_sql(value))
            .bind(rm_number)
            .fetch_all(&self.pool)
            .await?;

        Ok(pivot_quarterly(rows))
    }

    /// Five largest products by transacted amount, overall and per risk bucket
    pub async fn top_products(
        &self,
        rm_number: &str,
    ) -> Result<RiskBreakdown<Vec<TopProduct>>, DatabaseError> {
        let rows = sqlx::query_as::<_, RankedProductRow>(
            "WITH ranked AS (
                SELECT 'All'::text AS category,
                       ht.nama_produk,
                       SUM(ht.jumlah_amount) AS total_amount,
                       ROW_NUMBER() OVER (ORDER BY SUM(ht.jumlah_amount) DESC) AS rn
                FROM historical_transaction ht
                JOIN customer_info ci ON ci.bp_number_wm_core = ht.bp_number_wm_core
                WHERE ci.assigned_rm = $1 AND ci.risk_profile <> '0'
                GROUP BY ht.nama_produk
                UNION ALL
                SELECT ci.risk_profile AS category,
                       ht.nama_produk,
                       SUM(ht.jumlah_amount) AS total_amount,
                       ROW_NUMBER() OVER (
                           PARTITION BY ci.risk_profile
                           ORDER BY SUM(ht.jumlah_amount) DESC
                       ) AS rn
                FROM historical_transaction ht
                JOIN customer_info ci ON ci.bp_number_wm_core = ht.bp_number_wm_core
                WHERE ci.assigned_rm = $1 AND ci.risk_profile <> '0'
                GROUP BY ci.risk_profile, ht.nama_produk
            )
            SELECT category, nama_produk, total_amount::float8 AS total_amount
            FROM ranked
            WHERE rn <= 5
            ORDER BY category, total_amount DESC",
        )
        .bind(rm_number)
        .fetch_all(&self.pool)
        .await?;

        Ok(group_top_products(rows))
    }

    /// Drill-down list behind one risk-profile tile
    pub async fn customers_with_risk(
        &self,
        rm_number: &str,
        risk_profile: &str,
    ) -> Result<Vec<CustomerListRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, CustomerListRow>(&customer_rows_sql(
            "ci.assigned_rm = $1 AND ci.risk_profile = $2",
        ))
        .bind(rm_number)
        .bind(risk_profile)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_columns_cover_every_bucket() {
        let sql = risk_columns("SUM(ca.aum)", "ci.risk_profile <> '0'", "float8");
        assert!(sql.starts_with("COALESCE(SUM(ca.aum) FILTER (WHERE ci.risk_profile <> '0'), 0)::float8 AS \"all\""));
        for profile in RiskProfile::ALL {
            assert!(sql.contains(&format!("ci.risk_profile = '{}'", profile.label())));
        }
        assert!(sql.ends_with("AS aggressive"));
        assert_eq!(sql.matches(" AS ").count(), 6);
    }

    #[test]
    fn quarterly_sql_keeps_six_positive_quarters() {
        let sql = quarterly_sql("ca.fum");
        assert!(sql.contains("HAVING SUM(ca.fum) > 0"));
        assert!(sql.contains("ORDER BY ca.year DESC, ca.quarter DESC"));
        assert!(sql.ends_with("LIMIT 6"));
    }

    #[test]
    fn quarterly_all_includes_unprofiled_customers() {
        let sql = quarterly_sql(FBI);
        assert!(sql.contains(&format!(
            "COALESCE(SUM({}) FILTER (WHERE ci.risk_profile IS NOT NULL), 0)::float8 AS \"all\"",
            FBI
        )));
        assert!(!sql.contains("<> '0'"));
    }
}
