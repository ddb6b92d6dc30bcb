use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::task::{
    IncreasedNumbers, LastTransaction, ManagedNumbers, OfferProductRisk, PotentialTransaction,
    QuarterNumbers, ReprofileRiskTarget, RmPortfolio, Task,
};

/// Customer count and AUM cover profiled customers only; FBI counts every customer
const BOOK_TOTALS: &str = "
    COUNT(DISTINCT ci.bp_number_wm_core) FILTER (WHERE ci.risk_profile <> '0')::int8 AS all_customers,
    COALESCE(SUM(ca.aum) FILTER (WHERE ci.risk_profile <> '0'), 0)::float8 AS all_aum,
    COALESCE(SUM(ca.fbi_rd + ca.fbi_sb + ca.fbi_bac), 0)::float8 AS all_fbi";

/// Partial task edit; absent fields keep their stored value
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub description: Option<String>,
    pub invitee: Option<Option<String>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
}

/// Task manager page: book-level numbers for one RM and the RM's own to-do list
pub struct TaskService {
    pool: PgPool,
}

impl TaskService {
    pub async fn new() -> Result<Self, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    pub async fn managed_numbers(&self, rm_number: &str) -> Result<Vec<ManagedNumbers>, DatabaseError> {
        let rows = sqlx::query_as::<_, ManagedNumbers>(&format!(
            "SELECT ci.assigned_rm AS rm_number, {}
             FROM customer_info ci
             JOIN current_allocation ca ON ca.bp_number_wm_core = ci.bp_number_wm_core
             WHERE ci.assigned_rm = $1
             GROUP BY ci.assigned_rm",
            BOOK_TOTALS
        ))
        .bind(rm_number)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Book totals for the two most recent quarters that have data
    pub async fn increased_numbers(&self, rm_number: &str) -> Result<IncreasedNumbers, DatabaseError> {
        let rows = sqlx::query_as::<_, QuarterNumbers>(&format!(
            "WITH last_quarters AS (
                 SELECT year, quarter,
                        ROW_NUMBER() OVER (ORDER BY year DESC, quarter DESC) AS rn
                 FROM (
                     SELECT DISTINCT ca.year, ca.quarter
                     FROM current_allocation ca
                     JOIN customer_info ci ON ci.bp_number_wm_core = ca.bp_number_wm_core
                     WHERE ci.assigned_rm = $1
                 ) quarters
             )
             SELECT ci.assigned_rm AS rm_number, lq.year, lq.quarter, {}
             FROM last_quarters lq
             JOIN current_allocation ca ON ca.year = lq.year AND ca.quarter = lq.quarter
             JOIN customer_info ci ON ci.bp_number_wm_core = ca.bp_number_wm_core
             WHERE lq.rn <= 2 AND ci.assigned_rm = $1
             GROUP BY ci.assigned_rm, lq.year, lq.quarter
             ORDER BY lq.year DESC, lq.quarter DESC",
            BOOK_TOTALS
        ))
        .bind(rm_number)
        .fetch_all(&self.pool)
        .await?;

        Ok(IncreasedNumbers::from_rows(rows))
    }

    /// Asset mix of the whole book in its latest quarter
    pub async fn portfolio(&self, rm_number: &str) -> Result<RmPortfolio, DatabaseError> {
        let portfolio = sqlx::query_as::<_, RmPortfolio>(
            "WITH latest AS (
                 SELECT ca.year, ca.quarter
                 FROM current_allocation ca
                 JOIN customer_info ci ON ci.bp_number_wm_core = ca.bp_number_wm_core
                 WHERE ci.assigned_rm = $1
                 ORDER BY ca.year DESC, ca.quarter DESC
                 LIMIT 1
             )
             SELECT COALESCE(SUM(ca.casa), 0)::float8 AS casa,
                    COALESCE(SUM(ca.sb), 0)::float8 AS sb,
                    COALESCE(SUM(ca.deposito), 0)::float8 AS deposito,
                    COALESCE(SUM(ca.rd), 0)::float8 AS rd
             FROM current_allocation ca
             JOIN latest l ON l.year = ca.year AND l.quarter = ca.quarter
             JOIN customer_info ci ON ci.bp_number_wm_core = ca.bp_number_wm_core
             WHERE ci.assigned_rm = $1",
        )
        .bind(rm_number)
        .fetch_one(&self.pool)
        .await?;

        Ok(portfolio)
    }

    pub async fn last_transactions(&self, rm_number: &str) -> Result<Vec<LastTransaction>, DatabaseError> {
        let rows = sqlx::query_as::<_, LastTransaction>(
            "SELECT ht.bp_number_wm_core, ht.transaction_id,
                    ht.jumlah_amount::float8 AS jumlah_amount
             FROM historical_transaction ht
             JOIN customer_info ci ON ci.bp_number_wm_core = ht.bp_number_wm_core
             WHERE ci.assigned_rm = $1
             ORDER BY ht.transaction_id DESC
             LIMIT 5",
        )
        .bind(rm_number)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn potential_transactions(
        &self,
        rm_number: &str,
    ) -> Result<Vec<PotentialTransaction>, DatabaseError> {
        let rows = sqlx::query_as::<_, PotentialTransaction>(
            "SELECT ht.bp_number_wm_core AS id_nasabah, ht.nama_produk,
                    ht.profit::float8 AS profit
             FROM historical_transaction ht
             JOIN customer_info ci ON ci.bp_number_wm_core = ht.bp_number_wm_core
             WHERE ci.assigned_rm = $1
             ORDER BY ht.transaction_id DESC",
        )
        .bind(rm_number)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn offer_product_risk(&self, rm_number: &str) -> Result<Vec<OfferProductRisk>, DatabaseError> {
        let rows = sqlx::query_as::<_, OfferProductRisk>(
            "SELECT cso.bp_number_wm_core, cso.risk_profile,
                    cso.offer_product_risk_1, cso.offer_product_risk_2, cso.offer_product_risk_3,
                    cso.offer_product_risk_4, cso.offer_product_risk_5
             FROM customer_segmentation_offer cso
             JOIN customer_info ci ON ci.bp_number_wm_core = cso.bp_number_wm_core
             WHERE ci.assigned_rm = $1
             ORDER BY CAST(cso.bp_number_wm_core AS INTEGER)",
        )
        .bind(rm_number)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Customers whose segmentation suggests moving to another risk profile
    pub async fn reprofile_risk_targets(
        &self,
        rm_number: &str,
    ) -> Result<Vec<ReprofileRiskTarget>, DatabaseError> {
        let rows = sqlx::query_as::<_, ReprofileRiskTarget>(
            "SELECT cso.bp_number_wm_core, cso.risk_profile, cso.offer_reprofile_risk_target
             FROM customer_segmentation_offer cso
             JOIN customer_info ci ON ci.bp_number_wm_core = cso.bp_number_wm_core
             WHERE ci.assigned_rm = $1 AND cso.offer_reprofile_risk_target <> '0'
             ORDER BY CAST(cso.bp_number_wm_core AS INTEGER)",
        )
        .bind(rm_number)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn tasks(&self, rm_number: &str) -> Result<Vec<Task>, DatabaseError> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT id, rm_number, description, invitee, due_date
             FROM rm_task_manager
             WHERE rm_number = $1
             ORDER BY due_date ASC NULLS LAST, id",
        )
        .bind(rm_number)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    pub async fn create_task(
        &self,
        rm_number: &str,
        description: &str,
        invitee: Option<&str>,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<Task, DatabaseError> {
        let task = sqlx::query_as::<_, Task>(
            "INSERT INTO rm_task_manager (rm_number, description, invitee, due_date)
             VALUES ($1, $2, $3, $4)
             RETURNING id, rm_number, description, invitee, due_date",
        )
        .bind(rm_number)
        .bind(description)
        .bind(invitee)
        .bind(due_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(task)
    }

    pub async fn update_task(
        &self,
        rm_number: &str,
        id: i32,
        changes: &TaskChanges,
    ) -> Result<Task, DatabaseError> {
        sqlx::query_as::<_, Task>(
            "UPDATE rm_task_manager
             SET description = COALESCE($3, description),
                 invitee = CASE WHEN $4 THEN $5 ELSE invitee END,
                 due_date = CASE WHEN $6 THEN $7 ELSE due_date END
             WHERE id = $1 AND rm_number = $2
             RETURNING id, rm_number, description, invitee, due_date",
        )
        .bind(id)
        .bind(rm_number)
        .bind(&changes.description)
        .bind(changes.invitee.is_some())
        .bind(changes.invitee.clone().flatten())
        .bind(changes.due_date.is_some())
        .bind(changes.due_date.flatten())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Task not found".to_string()))
    }

    pub async fn delete_task(&self, rm_number: &str, id: i32) -> Result<Task, DatabaseError> {
        sqlx::query_as::<_, Task>(
            "DELETE FROM rm_task_manager
             WHERE id = $1 AND rm_number = $2
             RETURNING id, rm_number, description, invitee, due_date",
        )
        .bind(id)
        .bind(rm_number)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Task not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_totals_skip_unprofiled_customers_except_for_fbi() {
        assert!(BOOK_TOTALS.contains(
            "COUNT(DISTINCT ci.bp_number_wm_core) FILTER (WHERE ci.risk_profile <> '0')"
        ));
        assert!(BOOK_TOTALS.contains("SUM(ca.aum) FILTER (WHERE ci.risk_profile <> '0')"));
        assert!(BOOK_TOTALS.contains("COALESCE(SUM(ca.fbi_rd + ca.fbi_sb + ca.fbi_bac), 0)"));
        assert_eq!(BOOK_TOTALS.matches("FILTER").count(), 2);
    }
}
