use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::target::{DashboardTarget, MetricType};

/// Partial target edit; `Some(None)` clears a nullable column
#[derive(Debug, Clone, Default)]
pub struct TargetChanges {
    pub target_value: Option<Decimal>,
    pub target_date: Option<Option<NaiveDate>>,
    pub notes: Option<Option<String>>,
}

impl TargetChanges {
    pub fn is_empty(&self) -> bool {
        self.target_value.is_none() && self.target_date.is_none() && self.notes.is_none()
    }
}

/// One target per RM and headline metric
pub struct TargetService {
    pool: PgPool,
}

impl TargetService {
    pub async fn new() -> Result<Self, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    pub async fn list(&self, rm_number: &str) -> Result<Vec<DashboardTarget>, DatabaseError> {
        let targets = sqlx::query_as::<_, DashboardTarget>(
            "SELECT * FROM dashboard_targets WHERE rm_number = $1 ORDER BY metric_type",
        )
        .bind(rm_number)
        .fetch_all(&self.pool)
        .await?;

        Ok(targets)
    }

    pub async fn get(
        &self,
        rm_number: &str,
        metric: MetricType,
    ) -> Result<Option<DashboardTarget>, DatabaseError> {
        let target = sqlx::query_as::<_, DashboardTarget>(
            "SELECT * FROM dashboard_targets WHERE rm_number = $1 AND metric_type = $2",
        )
        .bind(rm_number)
        .bind(metric.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(target)
    }

    /// Create the target or replace every field of the existing one
    pub async fn upsert(
        &self,
        rm_number: &str,
        metric: MetricType,
        target_value: Decimal,
        target_date: Option<NaiveDate>,
        notes: Option<&str>,
    ) -> Result<DashboardTarget, DatabaseError> {
        let target = sqlx::query_as::<_, DashboardTarget>(
            "INSERT INTO dashboard_targets (rm_number, metric_type, target_value, target_date, notes)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (rm_number, metric_type) DO UPDATE SET
                 target_value = EXCLUDED.target_value,
                 target_date = EXCLUDED.target_date,
                 notes = EXCLUDED.notes,
                 updated_at = CURRENT_TIMESTAMP
             RETURNING *",
        )
        .bind(rm_number)
        .bind(metric.as_str())
        .bind(target_value)
        .bind(target_date)
        .bind(notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(target)
    }

    pub async fn update(
        &self,
        rm_number: &str,
        metric: MetricType,
        changes: &TargetChanges,
    ) -> Result<DashboardTarget, DatabaseError> {
        if changes.is_empty() {
            return Err(DatabaseError::InvalidInput("No fields to update".to_string()));
        }

        let mut builder = QueryBuilder::<Postgres>::new("UPDATE dashboard_targets SET ");
        {
            let mut set = builder.separated(", ");
            if let Some(value) = changes.target_value {
                set.push("target_value = ");
                set.push_bind_unseparated(value);
            }
            if let Some(date) = changes.target_date {
                set.push("target_date = ");
                set.push_bind_unseparated(date);
            }
            if let Some(notes) = &changes.notes {
                set.push("notes = ");
                set.push_bind_unseparated(notes.clone());
            }
            set.push("updated_at = CURRENT_TIMESTAMP");
        }
        builder.push(" WHERE rm_number = ");
        builder.push_bind(rm_number.to_string());
        builder.push(" AND metric_type = ");
        builder.push_bind(metric.as_str());
        builder.push(" RETURNING *");

        builder
            .build_query_as::<DashboardTarget>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Target not found".to_string()))
    }

    /// Deleting a target that is not set is not an error
    pub async fn delete(&self, rm_number: &str, metric: MetricType) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM dashboard_targets WHERE rm_number = $1 AND metric_type = $2")
            .bind(rm_number)
            .bind(metric.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
