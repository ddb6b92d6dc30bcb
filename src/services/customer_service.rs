use chrono::NaiveDate;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::customer::{
    Activity, BulkUpdateResult, CustomerDetail, CustomerId, CustomerInfo, CustomerListRow,
    CustomerPortfolio, OptimizedAllocation, OwnedProduct, QuarterlyAum, QuarterlyFum,
    RecommendationProduct, ReturnPercentage,
};

/// Customer rows with FUM/AUM/FBI summed over every reported quarter.
/// Customers without any allocation row are left out.
pub(crate) fn customer_rows_sql(condition: &str) -> String {
    format!(
        "SELECT ci.bp_number_wm_core AS customer_id,
                ci.risk_profile, ci.aum_label, ci.propensity, ci.priority_private,
                ci.customer_type, ci.pekerjaan, ci.status_nikah, ci.usia,
                ci.annual_income::float8 AS annual_income,
                SUM(ca.fum)::float8 AS total_fum,
                SUM(ca.aum)::float8 AS total_aum,
                SUM(ca.fbi_rd + ca.fbi_sb + ca.fbi_bac)::float8 AS total_fbi
         FROM customer_info ci
         JOIN current_allocation ca ON ca.bp_number_wm_core = ci.bp_number_wm_core
         WHERE {}
         GROUP BY ci.bp_number_wm_core
         ORDER BY CAST(ci.bp_number_wm_core AS INTEGER)",
        condition
    )
}

const TEXT_FIELDS: [&str; 7] = [
    "risk_profile",
    "aum_label",
    "propensity",
    "priority_private",
    "customer_type",
    "pekerjaan",
    "status_nikah",
];

/// Editable customer_info columns from an update payload. Absent keys are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerChanges {
    pub text: Vec<(&'static str, String)>,
    pub usia: Option<i32>,
    pub annual_income: Option<Decimal>,
}

impl CustomerChanges {
    /// Read the editable fields out of a JSON body. Null values are ignored; with
    /// `skip_empty`, so are empty strings (bulk edits leave blank inputs untouched).
    pub fn from_json(body: &Map<String, Value>, skip_empty: bool) -> Result<Self, String> {
        let mut changes = CustomerChanges::default();

        for field in TEXT_FIELDS {
            let value = match body.get(field) {
                None | Some(Value::Null) => continue,
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                Some(Value::Bool(b)) => b.to_string(),
                Some(_) => return Err(format!("{} must be a string", field)),
            };
            if skip_empty && value.trim().is_empty() {
                continue;
            }
            changes.text.push((field, value));
        }

        match body.get("usia") {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) if skip_empty && s.trim().is_empty() => {}
            Some(value) => changes.usia = Some(parse_integer(value).ok_or("usia must be an integer")?),
        }

        match body.get("annual_income") {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) if skip_empty && s.trim().is_empty() => {}
            Some(value) => {
                changes.annual_income =
                    Some(parse_decimal(value).ok_or("annual_income must be a number")?)
            }
        }

        Ok(changes)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.usia.is_none() && self.annual_income.is_none()
    }

    fn push_assignments(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        let mut assignments = builder.separated(", ");
        for (column, value) in &self.text {
            assignments.push(format!("{} = ", column));
            assignments.push_bind_unseparated(value.clone());
        }
        if let Some(usia) = self.usia {
            assignments.push("usia = ");
            assignments.push_bind_unseparated(usia);
        }
        if let Some(income) = self.annual_income {
            assignments.push("annual_income = ");
            assignments.push_bind_unseparated(income);
        }
    }
}

fn parse_integer(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(v) => Some(Decimal::from(v)),
            None => n.as_f64().and_then(Decimal::from_f64),
        },
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Fields for a new or edited activity
#[derive(Debug, Clone)]
pub struct ActivityInput {
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
}

/// Customer detail page queries and customer edits.
/// Every read is scoped to the RM the customer is assigned to; writes take an
/// optional owner so administrators can edit any customer.
pub struct CustomerService {
    pool: PgPool,
}

impl CustomerService {
    pub async fn new() -> Result<Self, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    pub async fn customer_list(&self, rm_number: &str) -> Result<Vec<CustomerListRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, CustomerListRow>(&customer_rows_sql("ci.assigned_rm = $1"))
        .bind(rm_number)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Customers in one propensity and AUM band; a missing filter matches everything
    pub async fn filtered_customer_list(
        &self,
        rm_number: &str,
        propensity: Option<&str>,
        aum_label: Option<&str>,
    ) -> Result<Vec<CustomerListRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, CustomerListRow>(&customer_rows_sql(
            "ci.assigned_rm = $1
               AND ($2::text IS NULL OR ci.propensity = $2)
               AND ($3::text IS NULL OR ci.aum_label = $3)",
        ))
        .bind(rm_number)
        .bind(propensity)
        .bind(aum_label)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn customer_ids(&self, rm_number: &str) -> Result<Vec<CustomerId>, DatabaseError> {
        let ids = sqlx::query_as::<_, CustomerId>(
            "SELECT bp_number_wm_core FROM customer_info
             WHERE assigned_rm = $1
             ORDER BY CAST(bp_number_wm_core AS INTEGER)",
        )
        .bind(rm_number)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    pub async fn details(
        &self,
        rm_number: &str,
        customer_id: &str,
    ) -> Result<Option<CustomerDetail>, DatabaseError> {
        let detail = sqlx::query_as::<_, CustomerDetail>(
            "SELECT ci.bp_number_wm_core AS id,
                    ci.risk_profile, ci.aum_label, ci.propensity, ci.priority_private,
                    ci.customer_type, ci.pekerjaan, ci.status_nikah, ci.usia,
                    ci.annual_income::float8 AS annual_income,
                    EXTRACT(YEAR FROM AGE(CURRENT_DATE, ci.tanggal_join_wealth))::int4 AS vintage,
                    SUM(ca.fum)::float8 AS total_fum,
                    SUM(ca.aum)::float8 AS total_aum,
                    SUM(ca.fbi_rd + ca.fbi_sb + ca.fbi_bac)::float8 AS total_fbi
             FROM customer_info ci
             JOIN current_allocation ca ON ca.bp_number_wm_core = ci.bp_number_wm_core
             WHERE ci.bp_number_wm_core = $1 AND ci.assigned_rm = $2
             GROUP BY ci.bp_number_wm_core",
        )
        .bind(customer_id)
        .bind(rm_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(detail)
    }

    /// The customer's most recent product, with the segmentation offer attached
    pub async fn recommendation(
        &self,
        rm_number: &str,
        customer_id: &str,
    ) -> Result<Vec<RecommendationProduct>, DatabaseError> {
        let rows = sqlx::query_as::<_, RecommendationProduct>(
            "SELECT ht.bp_number_wm_core AS id_nasabah,
                    ht.nama_produk,
                    ht.profit::float8 AS profit,
                    cso.risk_profile AS offer_risk_profile,
                    cso.offer_product_risk_1, cso.offer_product_risk_2, cso.offer_product_risk_3,
                    cso.offer_product_risk_4, cso.offer_product_risk_5,
                    cso.offer_reprofile_risk_target
             FROM historical_transaction ht
             JOIN customer_info ci ON ci.bp_number_wm_core = ht.bp_number_wm_core
             LEFT JOIN customer_segmentation_offer cso
                    ON cso.bp_number_wm_core = ht.bp_number_wm_core
             WHERE ht.bp_number_wm_core = $1 AND ci.assigned_rm = $2
             ORDER BY ht.transaction_id DESC
             LIMIT 1",
        )
        .bind(customer_id)
        .bind(rm_number)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Asset mix in the latest reporting quarter
    pub async fn portfolio(
        &self,
        rm_number: &str,
        customer_id: &str,
    ) -> Result<Option<CustomerPortfolio>, DatabaseError> {
        let portfolio = sqlx::query_as::<_, CustomerPortfolio>(
            "SELECT ca.casa::float8 AS casa, ca.sb::float8 AS sb, ca.deposito::float8 AS deposito,
                    ca.rd::float8 AS rd, ca.bac::float8 AS bac
             FROM current_allocation ca
             JOIN customer_info ci ON ci.bp_number_wm_core = ca.bp_number_wm_core
             WHERE ca.bp_number_wm_core = $1 AND ci.assigned_rm = $2
             ORDER BY ca.year DESC, ca.quarter DESC
             LIMIT 1",
        )
        .bind(customer_id)
        .bind(rm_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(portfolio)
    }

    pub async fn optimized_portfolio(
        &self,
        rm_number: &str,
        customer_id: &str,
    ) -> Result<Vec<OptimizedAllocation>, DatabaseError> {
        let rows = sqlx::query_as::<_, OptimizedAllocation>(
            "SELECT oa.bp_number_wm_core, oa.asset_type,
                    oa.usd_allocation::float8 AS usd_allocation,
                    ci.assigned_rm
             FROM optimized_allocation oa
             JOIN customer_info ci ON ci.bp_number_wm_core = oa.bp_number_wm_core
             WHERE oa.bp_number_wm_core = $1 AND ci.assigned_rm = $2
             ORDER BY oa.asset_type",
        )
        .bind(customer_id)
        .bind(rm_number)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Both sums are null when the optimiser has not produced an allocation yet
    pub async fn return_percentage(
        &self,
        rm_number: &str,
        customer_id: &str,
    ) -> Result<ReturnPercentage, DatabaseError> {
        let returns = sqlx::query_as::<_, ReturnPercentage>(
            "SELECT SUM(oa.current_expected_return)::float8 AS current_return,
                    SUM(oa.expected_return)::float8 AS expected_return
             FROM optimized_allocation oa
             JOIN customer_info ci ON ci.bp_number_wm_core = oa.bp_number_wm_core
             WHERE oa.bp_number_wm_core = $1 AND ci.assigned_rm = $2",
        )
        .bind(customer_id)
        .bind(rm_number)
        .fetch_one(&self.pool)
        .await?;

        Ok(returns)
    }

    pub async fn owned_products(
        &self,
        rm_number: &str,
        customer_id: &str,
    ) -> Result<Vec<OwnedProduct>, DatabaseError> {
        let rows = sqlx::query_as::<_, OwnedProduct>(
            "SELECT ht.nama_produk, ht.keterangan,
                    ht.jumlah_amount::float8 AS jumlah_amount,
                    ht.price_bought::float8 AS price_bought,
                    ht.jumlah_transaksi,
                    ht.profit::float8 AS profit,
                    ht.return_value::float8 AS return_value
             FROM historical_transaction ht
             JOIN customer_info ci ON ci.bp_number_wm_core = ht.bp_number_wm_core
             WHERE ht.bp_number_wm_core = $1 AND ci.assigned_rm = $2
             ORDER BY ht.transaction_id DESC",
        )
        .bind(customer_id)
        .bind(rm_number)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Last four quarters, oldest first
    pub async fn quarterly_aum(
        &self,
        rm_number: &str,
        customer_id: &str,
    ) -> Result<Vec<QuarterlyAum>, DatabaseError> {
        let rows = sqlx::query_as::<_, QuarterlyAum>(
            "SELECT * FROM (
                 SELECT ca.bp_number_wm_core, ca.year, ca.quarter,
                        ca.rd::float8 AS rd, ca.sb::float8 AS sb, ca.bac::float8 AS bac,
                        (ca.rd + ca.sb + ca.bac)::float8 AS total_aum
                 FROM current_allocation ca
                 JOIN customer_info ci ON ci.bp_number_wm_core = ca.bp_number_wm_core
                 WHERE ca.bp_number_wm_core = $1 AND ci.assigned_rm = $2
                 ORDER BY ca.year DESC, ca.quarter DESC
                 LIMIT 4
             ) recent
             ORDER BY year, quarter",
        )
        .bind(customer_id)
        .bind(rm_number)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Last four quarters, oldest first
    pub async fn quarterly_fum(
        &self,
        rm_number: &str,
        customer_id: &str,
    ) -> Result<Vec<QuarterlyFum>, DatabaseError> {
        let rows = sqlx::query_as::<_, QuarterlyFum>(
            "SELECT * FROM (
                 SELECT ca.bp_number_wm_core, ca.year, ca.quarter,
                        ca.casa::float8 AS casa, ca.deposito::float8 AS deposito,
                        (ca.casa + ca.deposito)::float8 AS total_fum
                 FROM current_allocation ca
                 JOIN customer_info ci ON ci.bp_number_wm_core = ca.bp_number_wm_core
                 WHERE ca.bp_number_wm_core = $1 AND ci.assigned_rm = $2
                 ORDER BY ca.year DESC, ca.quarter DESC
                 LIMIT 4
             ) recent
             ORDER BY year, quarter",
        )
        .bind(customer_id)
        .bind(rm_number)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn activities(
        &self,
        owner: Option<&str>,
        customer_id: &str,
    ) -> Result<Vec<Activity>, DatabaseError> {
        let rows = sqlx::query_as::<_, Activity>(
            "SELECT a.id, a.bp_number_wm_core, a.title, a.description, a.date
             FROM customer_activity a
             JOIN customer_info ci ON ci.bp_number_wm_core = a.bp_number_wm_core
             WHERE a.bp_number_wm_core = $1
               AND ($2::text IS NULL OR ci.assigned_rm = $2)
             ORDER BY a.date DESC, a.id DESC",
        )
        .bind(customer_id)
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn create_activity(
        &self,
        owner: Option<&str>,
        customer_id: &str,
        input: &ActivityInput,
    ) -> Result<Activity, DatabaseError> {
        sqlx::query_as::<_, Activity>(
            "INSERT INTO customer_activity (bp_number_wm_core, title, description, date)
             SELECT ci.bp_number_wm_core, $2, $3, $4
             FROM customer_info ci
             WHERE ci.bp_number_wm_core = $1
               AND ($5::text IS NULL OR ci.assigned_rm = $5)
             RETURNING id, bp_number_wm_core, title, description, date",
        )
        .bind(customer_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.date)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Customer not found".to_string()))
    }

    pub async fn update_activity(
        &self,
        owner: Option<&str>,
        id: i32,
        input: &ActivityInput,
    ) -> Result<Activity, DatabaseError> {
        sqlx::query_as::<_, Activity>(
            "UPDATE customer_activity a
             SET title = $2, description = $3, date = $4
             FROM customer_info ci
             WHERE a.id = $1
               AND ci.bp_number_wm_core = a.bp_number_wm_core
               AND ($5::text IS NULL OR ci.assigned_rm = $5)
             RETURNING a.id, a.bp_number_wm_core, a.title, a.description, a.date",
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.date)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Activity not found".to_string()))
    }

    pub async fn delete_activity(&self, owner: Option<&str>, id: i32) -> Result<Activity, DatabaseError> {
        sqlx::query_as::<_, Activity>(
            "DELETE FROM customer_activity a
             USING customer_info ci
             WHERE a.id = $1
               AND ci.bp_number_wm_core = a.bp_number_wm_core
               AND ($2::text IS NULL OR ci.assigned_rm = $2)
             RETURNING a.id, a.bp_number_wm_core, a.title, a.description, a.date",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Activity not found".to_string()))
    }

    pub async fn update_customer(
        &self,
        owner: Option<&str>,
        customer_id: &str,
        changes: &CustomerChanges,
    ) -> Result<CustomerInfo, DatabaseError> {
        if changes.is_empty() {
            return Err(DatabaseError::InvalidInput("No fields to update".to_string()));
        }

        let mut builder = QueryBuilder::<Postgres>::new("UPDATE customer_info SET ");
        changes.push_assignments(&mut builder);
        builder.push(" WHERE bp_number_wm_core = ");
        builder.push_bind(customer_id.to_string());
        if let Some(rm_number) = owner {
            builder.push(" AND assigned_rm = ");
            builder.push_bind(rm_number.to_string());
        }
        builder.push(" RETURNING *");

        builder
            .build_query_as::<CustomerInfo>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Customer not found".to_string()))
    }

    /// Apply the same edit to many customers. Each customer is updated on its own;
    /// failures are counted and reported rather than aborting the batch.
    pub async fn bulk_update_customers(
        &self,
        owner: Option<&str>,
        customer_ids: &[String],
        changes: &CustomerChanges,
    ) -> Result<BulkUpdateResult, DatabaseError> {
        if changes.is_empty() {
            return Err(DatabaseError::InvalidInput("No fields to update".to_string()));
        }

        let mut result = BulkUpdateResult {
            updated: 0,
            failed: 0,
            errors: Vec::new(),
        };

        for customer_id in customer_ids {
            match self.update_customer(owner, customer_id, changes).await {
                Ok(_) => result.updated += 1,
                Err(DatabaseError::NotFound(_)) => {
                    result.failed += 1;
                    result.errors.push(format!("{}: customer not found", customer_id));
                }
                Err(e) => {
                    tracing::error!("Bulk update failed for customer {}: {}", customer_id, e);
                    result.failed += 1;
                    result.errors.push(format!("{}: update failed", customer_id));
                }
            }
        }

        tracing::info!(
            "Bulk customer update: {} updated, {} failed",
            result.updated,
            result.failed
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn reads_only_known_fields() {
        let changes = CustomerChanges::from_json(
            &body(json!({
                "customerID": "1001",
                "propensity": "High",
                "usia": 41,
                "unknown": "ignored"
            })),
            false,
        )
        .unwrap();

        assert_eq!(changes.text, vec![("propensity", "High".to_string())]);
        assert_eq!(changes.usia, Some(41));
        assert_eq!(changes.annual_income, None);
    }

    #[test]
    fn nothing_to_update_is_empty() {
        let changes = CustomerChanges::from_json(&body(json!({"customerID": "1001"})), false).unwrap();
        assert!(changes.is_empty());

        let changes =
            CustomerChanges::from_json(&body(json!({"pekerjaan": null, "usia": null})), false).unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn bulk_edits_skip_blank_inputs() {
        let changes = CustomerChanges::from_json(
            &body(json!({"aum_label": "", "usia": "", "annual_income": " ", "status_nikah": "Married"})),
            true,
        )
        .unwrap();

        assert_eq!(changes.text, vec![("status_nikah", "Married".to_string())]);
        assert_eq!(changes.usia, None);
        assert_eq!(changes.annual_income, None);
    }

    #[test]
    fn numeric_fields_accept_numeric_strings() {
        let changes = CustomerChanges::from_json(
            &body(json!({"usia": "35", "annual_income": "125000000.50"})),
            true,
        )
        .unwrap();

        assert_eq!(changes.usia, Some(35));
        assert_eq!(changes.annual_income, Some("125000000.50".parse::<Decimal>().unwrap()));
    }

    #[test]
    fn rejects_unparseable_numbers() {
        let err = CustomerChanges::from_json(&body(json!({"usia": "forty"})), true).unwrap_err();
        assert_eq!(err, "usia must be an integer");

        let err = CustomerChanges::from_json(&body(json!({"usia": 41.5})), true).unwrap_err();
        assert_eq!(err, "usia must be an integer");

        let err =
            CustomerChanges::from_json(&body(json!({"annual_income": "lots"})), true).unwrap_err();
        assert_eq!(err, "annual_income must be a number");
    }

    #[test]
    fn annual_income_accepts_json_numbers() {
        let changes =
            CustomerChanges::from_json(&body(json!({"annual_income": 90000000})), false).unwrap();
        assert_eq!(changes.annual_income, Some(Decimal::from(90_000_000)));
    }

    #[test]
    fn customer_rows_sum_every_quarter() {
        let sql = customer_rows_sql("ci.assigned_rm = $1");
        assert!(sql.contains("SUM(ca.fum)::float8 AS total_fum"));
        assert!(sql.contains("SUM(ca.aum)::float8 AS total_aum"));
        assert!(sql.contains("JOIN current_allocation ca ON"));
        assert!(!sql.contains("LEFT JOIN"));
        assert!(!sql.contains("LIMIT"));

        let filter = sql.find("WHERE ci.assigned_rm = $1").unwrap();
        let group = sql.find("GROUP BY ci.bp_number_wm_core").unwrap();
        let order = sql.find("ORDER BY").unwrap();
        assert!(filter < group && group < order);
    }
}
