use sqlx::types::Json;
use sqlx::PgPool;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::market::{MarketNote, Watchlist};

/// Watchlists and index notes, each owned by one RM
pub struct MarketService {
    pool: PgPool,
}

impl MarketService {
    pub async fn new() -> Result<Self, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    pub async fn watchlists(&self, rm_number: &str) -> Result<Vec<Watchlist>, DatabaseError> {
        let rows = sqlx::query_as::<_, Watchlist>(
            "SELECT id, rm_number, watchlist_name, indices, created_at
             FROM market_watchlists
             WHERE rm_number = $1
             ORDER BY created_at DESC",
        )
        .bind(rm_number)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn create_watchlist(
        &self,
        rm_number: &str,
        name: &str,
        indices: &[String],
    ) -> Result<Watchlist, DatabaseError> {
        let watchlist = sqlx::query_as::<_, Watchlist>(
            "INSERT INTO market_watchlists (rm_number, watchlist_name, indices)
             VALUES ($1, $2, $3)
             RETURNING id, rm_number, watchlist_name, indices, created_at",
        )
        .bind(rm_number)
        .bind(name)
        .bind(Json(indices))
        .fetch_one(&self.pool)
        .await?;

        Ok(watchlist)
    }

    pub async fn update_watchlist(
        &self,
        rm_number: &str,
        id: i32,
        name: &str,
        indices: &[String],
    ) -> Result<Watchlist, DatabaseError> {
        sqlx::query_as::<_, Watchlist>(
            "UPDATE market_watchlists
             SET watchlist_name = $3, indices = $4
             WHERE id = $1 AND rm_number = $2
             RETURNING id, rm_number, watchlist_name, indices, created_at",
        )
        .bind(id)
        .bind(rm_number)
        .bind(name)
        .bind(Json(indices))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Watchlist not found".to_string()))
    }

    pub async fn delete_watchlist(&self, rm_number: &str, id: i32) -> Result<Watchlist, DatabaseError> {
        sqlx::query_as::<_, Watchlist>(
            "DELETE FROM market_watchlists
             WHERE id = $1 AND rm_number = $2
             RETURNING id, rm_number, watchlist_name, indices, created_at",
        )
        .bind(id)
        .bind(rm_number)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Watchlist not found".to_string()))
    }

    pub async fn notes(
        &self,
        rm_number: &str,
        index_name: Option<&str>,
    ) -> Result<Vec<MarketNote>, DatabaseError> {
        let rows = sqlx::query_as::<_, MarketNote>(
            "SELECT id, rm_number, index_name, note_title, note_content, created_at, updated_at
             FROM market_notes
             WHERE rm_number = $1 AND ($2::text IS NULL OR index_name = $2)
             ORDER BY created_at DESC",
        )
        .bind(rm_number)
        .bind(index_name)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn create_note(
        &self,
        rm_number: &str,
        index_name: &str,
        title: &str,
        content: &str,
    ) -> Result<MarketNote, DatabaseError> {
        let note = sqlx::query_as::<_, MarketNote>(
            "INSERT INTO market_notes (rm_number, index_name, note_title, note_content)
             VALUES ($1, $2, $3, $4)
             RETURNING id, rm_number, index_name, note_title, note_content, created_at, updated_at",
        )
        .bind(rm_number)
        .bind(index_name)
        .bind(title)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        Ok(note)
    }

    pub async fn update_note(
        &self,
        rm_number: &str,
        id: i32,
        title: &str,
        content: &str,
    ) -> Result<MarketNote, DatabaseError> {
        sqlx::query_as::<_, MarketNote>(
            "UPDATE market_notes
             SET note_title = $3, note_content = $4, updated_at = CURRENT_TIMESTAMP
             WHERE id = $1 AND rm_number = $2
             RETURNING id, rm_number, index_name, note_title, note_content, created_at, updated_at",
        )
        .bind(id)
        .bind(rm_number)
        .bind(title)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Note not found".to_string()))
    }

    pub async fn delete_note(&self, rm_number: &str, id: i32) -> Result<MarketNote, DatabaseError> {
        sqlx::query_as::<_, MarketNote>(
            "DELETE FROM market_notes
             WHERE id = $1 AND rm_number = $2
             RETURNING id, rm_number, index_name, note_title, note_content, created_at, updated_at",
        )
        .bind(id)
        .bind(rm_number)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Note not found".to_string()))
    }
}
