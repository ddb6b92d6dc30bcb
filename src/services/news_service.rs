use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::news::{NewsNote, ProductPick};
use crate::services::double_option;

const PICK_COLUMNS: &str =
    "id, rm_number, ticker, pick_date, reason, priority, is_active, created_at, updated_at";
const NOTE_COLUMNS: &str =
    "id, rm_number, news_id, note_title, note_content, relevance_tags, created_at, updated_at";

#[derive(Debug, Clone, Deserialize)]
pub struct NewProductPick {
    pub ticker: Option<String>,
    pub pick_date: Option<NaiveDate>,
    pub reason: Option<String>,
    pub priority: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPickChanges {
    pub ticker: Option<String>,
    pub pick_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "double_option")]
    pub reason: Option<Option<String>>,
    pub priority: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewNewsNote {
    pub news_id: Option<i32>,
    pub note_title: Option<String>,
    pub note_content: Option<String>,
    pub relevance_tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsNoteChanges {
    pub note_title: Option<String>,
    pub note_content: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub news_id: Option<Option<i32>>,
    pub relevance_tags: Option<Vec<String>>,
}

/// Daily product picks and notes on news items, each owned by one RM
pub struct NewsService {
    pool: PgPool,
}

impl NewsService {
    pub async fn new() -> Result<Self, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    /// Active picks for one day (today when no date is given), highest priority first
    pub async fn product_picks(
        &self,
        rm_number: &str,
        pick_date: Option<NaiveDate>,
    ) -> Result<Vec<ProductPick>, DatabaseError> {
        let picks = sqlx::query_as::<_, ProductPick>(&format!(
            "SELECT {} FROM product_picks
             WHERE rm_number = $1 AND is_active = true
               AND pick_date = COALESCE($2, CURRENT_DATE)
             ORDER BY priority ASC, created_at DESC",
            PICK_COLUMNS
        ))
        .bind(rm_number)
        .bind(pick_date)
        .fetch_all(&self.pool)
        .await?;

        Ok(picks)
    }

    pub async fn create_product_pick(
        &self,
        rm_number: &str,
        ticker: &str,
        pick_date: NaiveDate,
        reason: Option<&str>,
        priority: Option<i32>,
    ) -> Result<ProductPick, DatabaseError> {
        let result = sqlx::query_as::<_, ProductPick>(&format!(
            "INSERT INTO product_picks (rm_number, ticker, pick_date, reason, priority)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            PICK_COLUMNS
        ))
        .bind(rm_number)
        .bind(ticker)
        .bind(pick_date)
        .bind(reason)
        .bind(priority.unwrap_or(0))
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(pick) => Ok(pick),
            Err(e) => {
                let err = DatabaseError::from(e);
                if err.is_unique_violation() {
                    Err(DatabaseError::Conflict(
                        "Product pick already exists for this date".to_string(),
                    ))
                } else {
                    Err(err)
                }
            }
        }
    }

    pub async fn update_product_pick(
        &self,
        rm_number: &str,
        id: i32,
        changes: &ProductPickChanges,
    ) -> Result<ProductPick, DatabaseError> {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE product_picks SET ");
        {
            let mut set = builder.separated(", ");
            if let Some(ticker) = &changes.ticker {
                set.push("ticker = ");
                set.push_bind_unseparated(ticker.clone());
            }
            if let Some(pick_date) = changes.pick_date {
                set.push("pick_date = ");
                set.push_bind_unseparated(pick_date);
            }
            if let Some(reason) = &changes.reason {
                set.push("reason = ");
                set.push_bind_unseparated(reason.clone());
            }
            if let Some(priority) = changes.priority {
                set.push("priority = ");
                set.push_bind_unseparated(priority);
            }
            if let Some(is_active) = changes.is_active {
                set.push("is_active = ");
                set.push_bind_unseparated(is_active);
            }
            set.push("updated_at = CURRENT_TIMESTAMP");
        }
        push_owner_filter(&mut builder, id, rm_number);
        builder.push(format!(" RETURNING {}", PICK_COLUMNS));

        let result = builder
            .build_query_as::<ProductPick>()
            .fetch_optional(&self.pool)
            .await;

        match result {
            Ok(Some(pick)) => Ok(pick),
            Ok(None) => Err(pick_not_found()),
            Err(e) => {
                let err = DatabaseError::from(e);
                if err.is_unique_violation() {
                    Err(DatabaseError::Conflict(
                        "Product pick already exists for this date".to_string(),
                    ))
                } else {
                    Err(err)
                }
            }
        }
    }

    pub async fn delete_product_pick(&self, rm_number: &str, id: i32) -> Result<ProductPick, DatabaseError> {
        sqlx::query_as::<_, ProductPick>(&format!(
            "DELETE FROM product_picks WHERE id = $1 AND rm_number = $2 RETURNING {}",
            PICK_COLUMNS
        ))
        .bind(id)
        .bind(rm_number)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(pick_not_found)
    }

    pub async fn news_notes(
        &self,
        rm_number: &str,
        news_id: Option<i32>,
    ) -> Result<Vec<NewsNote>, DatabaseError> {
        let notes = sqlx::query_as::<_, NewsNote>(&format!(
            "SELECT {} FROM news_notes
             WHERE rm_number = $1 AND ($2::int4 IS NULL OR news_id = $2)
             ORDER BY created_at DESC",
            NOTE_COLUMNS
        ))
        .bind(rm_number)
        .bind(news_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notes)
    }

    pub async fn create_news_note(
        &self,
        rm_number: &str,
        title: &str,
        content: &str,
        news_id: Option<i32>,
        relevance_tags: &[String],
    ) -> Result<NewsNote, DatabaseError> {
        let note = sqlx::query_as::<_, NewsNote>(&format!(
            "INSERT INTO news_notes (rm_number, news_id, note_title, note_content, relevance_tags)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            NOTE_COLUMNS
        ))
        .bind(rm_number)
        .bind(news_id)
        .bind(title)
        .bind(content)
        .bind(relevance_tags)
        .fetch_one(&self.pool)
        .await?;

        Ok(note)
    }

    pub async fn update_news_note(
        &self,
        rm_number: &str,
        id: i32,
        changes: &NewsNoteChanges,
    ) -> Result<NewsNote, DatabaseError> {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE news_notes SET ");
        {
            let mut set = builder.separated(", ");
            if let Some(title) = &changes.note_title {
                set.push("note_title = ");
                set.push_bind_unseparated(title.clone());
            }
            if let Some(content) = &changes.note_content {
                set.push("note_content = ");
                set.push_bind_unseparated(content.clone());
            }
            if let Some(news_id) = changes.news_id {
                set.push("news_id = ");
                set.push_bind_unseparated(news_id);
            }
            if let Some(tags) = &changes.relevance_tags {
                set.push("relevance_tags = ");
                set.push_bind_unseparated(tags.clone());
            }
            set.push("updated_at = CURRENT_TIMESTAMP");
        }
        push_owner_filter(&mut builder, id, rm_number);
        builder.push(format!(" RETURNING {}", NOTE_COLUMNS));

        builder
            .build_query_as::<NewsNote>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(note_not_found)
    }

    pub async fn delete_news_note(&self, rm_number: &str, id: i32) -> Result<NewsNote, DatabaseError> {
        sqlx::query_as::<_, NewsNote>(&format!(
            "DELETE FROM news_notes WHERE id = $1 AND rm_number = $2 RETURNING {}",
            NOTE_COLUMNS
        ))
        .bind(id)
        .bind(rm_number)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(note_not_found)
    }
}

fn push_owner_filter(builder: &mut QueryBuilder<'_, Postgres>, id: i32, rm_number: &str) {
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" AND rm_number = ");
    builder.push_bind(rm_number.to_string());
}

fn pick_not_found() -> DatabaseError {
    DatabaseError::NotFound("Product pick not found or unauthorized".to_string())
}

fn note_not_found() -> DatabaseError {
    DatabaseError::NotFound("News note not found or unauthorized".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_changes_keep_absent_fields_untouched() {
        let changes: ProductPickChanges =
            serde_json::from_str(r#"{"priority": 2, "reason": null}"#).unwrap();
        assert_eq!(changes.priority, Some(2));
        assert_eq!(changes.reason, Some(None));
        assert!(changes.ticker.is_none());
        assert!(changes.is_active.is_none());
    }

    #[test]
    fn new_pick_parses_iso_dates() {
        let pick: NewProductPick =
            serde_json::from_str(r#"{"ticker": "BBCA", "pick_date": "2024-05-02"}"#).unwrap();
        assert_eq!(pick.pick_date, NaiveDate::from_ymd_opt(2024, 5, 2));
        assert_eq!(pick.priority, None);
    }
}
