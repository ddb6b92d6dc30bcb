use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProductPick {
    pub id: i32,
    pub rm_number: String,
    pub ticker: String,
    pub pick_date: NaiveDate,
    pub reason: Option<String>,
    pub priority: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NewsNote {
    pub id: i32,
    pub rm_number: String,
    pub news_id: Option<i32>,
    pub note_title: String,
    pub note_content: String,
    pub relevance_tags: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
