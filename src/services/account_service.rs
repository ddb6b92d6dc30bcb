use sqlx::PgPool;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{Account, Role};

const ACCOUNT_COLUMNS: &str = "rm_account_id, email, rm_number, password_hash, role, created_at";

/// Reads and writes `rm_account`
pub struct AccountService {
    pool: PgPool,
}

impl AccountService {
    pub async fn new() -> Result<Self, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    /// Case-insensitive lookup, matching how emails are typed at login
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>, DatabaseError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM rm_account WHERE LOWER(email) = LOWER($1)",
            ACCOUNT_COLUMNS
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    pub async fn find_by_id(&self, rm_account_id: i32) -> Result<Option<Account>, DatabaseError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM rm_account WHERE rm_account_id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(rm_account_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    pub async fn list(&self) -> Result<Vec<Account>, DatabaseError> {
        let accounts = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM rm_account ORDER BY rm_number",
            ACCOUNT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(accounts)
    }

    pub async fn create(
        &self,
        email: &str,
        rm_number: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<Account, DatabaseError> {
        let result = sqlx::query_as::<_, Account>(&format!(
            "INSERT INTO rm_account (email, rm_number, password_hash, role)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(email.trim())
        .bind(rm_number.trim())
        .bind(password_hash)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(account) => {
                tracing::info!("Registered account {} ({})", account.rm_number, account.role);
                Ok(account)
            }
            Err(e) => {
                let err = DatabaseError::from(e);
                if err.is_unique_violation() {
                    Err(DatabaseError::Conflict(
                        "An account with this email or RM number already exists".to_string(),
                    ))
                } else {
                    Err(err)
                }
            }
        }
    }

    pub async fn update_email(&self, rm_number: &str, email: &str) -> Result<Account, DatabaseError> {
        let result = sqlx::query_as::<_, Account>(&format!(
            "UPDATE rm_account SET email = $1 WHERE rm_number = $2 RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(email.trim())
        .bind(rm_number)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(account)) => Ok(account),
            Ok(None) => Err(DatabaseError::NotFound("User not found".to_string())),
            Err(e) => {
                let err = DatabaseError::from(e);
                if err.is_unique_violation() {
                    Err(DatabaseError::Conflict("Email already in use.".to_string()))
                } else {
                    Err(err)
                }
            }
        }
    }

    pub async fn set_role(&self, rm_number: &str, role: Role) -> Result<Account, DatabaseError> {
        sqlx::query_as::<_, Account>(&format!(
            "UPDATE rm_account SET role = $1 WHERE rm_number = $2 RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(role.as_str())
        .bind(rm_number)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("User not found".to_string()))
    }

    /// Page permissions go with the account through the cascading foreign key
    pub async fn delete_by_rm_number(&self, rm_number: &str) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM rm_account WHERE rm_number = $1")
            .bind(rm_number)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("User not found".to_string()));
        }

        tracing::info!("Deleted account {}", rm_number);
        Ok(())
    }

    /// Returns false when no account has this email
    pub async fn update_password(&self, email: &str, password_hash: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE rm_account SET password_hash = $1 WHERE LOWER(email) = LOWER($2)")
            .bind(password_hash)
            .bind(email.trim())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
