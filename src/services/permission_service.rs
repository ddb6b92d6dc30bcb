use sqlx::PgPool;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::permission::{PagePermissionWithPage, UserPermissionMatrix};
use crate::database::models::{Page, PagePermission, PermissionFlags};

const UPSERT_PERMISSION: &str = "
    INSERT INTO page_permissions
        (rm_account_id, page_id, can_view, can_add, can_update, can_delete, can_download)
    VALUES ($1, $2, $3, $4, $5, $6, true)
    ON CONFLICT (rm_account_id, page_id) DO UPDATE SET
        can_view = EXCLUDED.can_view,
        can_add = EXCLUDED.can_add,
        can_update = EXCLUDED.can_update,
        can_delete = EXCLUDED.can_delete,
        can_download = true,
        updated_at = CURRENT_TIMESTAMP
    RETURNING *";

const PERMISSION_WITH_PAGE: &str = "
    SELECT pp.permission_id, pp.rm_account_id, pp.page_id,
           pp.can_view, pp.can_add, pp.can_update, pp.can_delete, pp.can_download,
           pp.created_at, pp.updated_at,
           p.page_path, p.page_name, p.page_label
    FROM page_permissions pp
    JOIN pages p ON p.page_id = pp.page_id";

/// One requested cell of the permission matrix
#[derive(Debug, Clone, Copy)]
pub struct PageGrantRequest {
    pub page_id: i32,
    pub flags: PermissionFlags,
}

/// Page catalogue and the per-user page permission matrix
pub struct PermissionService {
    pool: PgPool,
}

impl PermissionService {
    pub async fn new() -> Result<Self, DatabaseError> {
        let pool = DatabaseManager::pool().await?;
        Ok(Self { pool })
    }

    pub async fn list_pages(&self) -> Result<Vec<Page>, DatabaseError> {
        let pages = sqlx::query_as::<_, Page>("SELECT * FROM pages ORDER BY page_label")
            .fetch_all(&self.pool)
            .await?;
        Ok(pages)
    }

    /// Every regular RM with a cell for every page; pages without a row read as all false
    pub async fn list_user_matrices(&self) -> Result<Vec<UserPermissionMatrix>, DatabaseError> {
        let users = sqlx::query_as::<_, UserPermissionMatrix>(
            "SELECT a.rm_account_id, a.email, a.rm_number, a.role,
                    COALESCE(
                        json_agg(
                            json_build_object(
                                'page_id', p.page_id,
                                'page_path', p.page_path,
                                'page_name', p.page_name,
                                'page_label', p.page_label,
                                'can_view', COALESCE(pp.can_view, false),
                                'can_add', COALESCE(pp.can_add, false),
                                'can_update', COALESCE(pp.can_update, false),
                                'can_delete', COALESCE(pp.can_delete, false),
                                'can_download', COALESCE(pp.can_download, false)
                            ) ORDER BY p.page_label
                        ) FILTER (WHERE p.page_id IS NOT NULL),
                        '[]'::json
                    ) AS permissions
             FROM rm_account a
             LEFT JOIN pages p ON true
             LEFT JOIN page_permissions pp
                    ON pp.rm_account_id = a.rm_account_id AND pp.page_id = p.page_id
             WHERE a.role = 'user'
             GROUP BY a.rm_account_id
             ORDER BY a.email",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    pub async fn user_permissions(
        &self,
        rm_account_id: i32,
    ) -> Result<Vec<PagePermissionWithPage>, DatabaseError> {
        let rows = sqlx::query_as::<_, PagePermissionWithPage>(&format!(
            "{} WHERE pp.rm_account_id = $1 ORDER BY p.page_label",
            PERMISSION_WITH_PAGE
        ))
        .bind(rm_account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Rows for any of the given page paths; used by the page guards
    pub async fn permissions_for_pages(
        &self,
        rm_account_id: i32,
        page_paths: &[String],
    ) -> Result<Vec<PagePermissionWithPage>, DatabaseError> {
        let rows = sqlx::query_as::<_, PagePermissionWithPage>(&format!(
            "{} WHERE pp.rm_account_id = $1 AND p.page_path = ANY($2)",
            PERMISSION_WITH_PAGE
        ))
        .bind(rm_account_id)
        .bind(page_paths)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn upsert(
        &self,
        rm_account_id: i32,
        grant: PageGrantRequest,
    ) -> Result<PagePermission, DatabaseError> {
        let permission = sqlx::query_as::<_, PagePermission>(UPSERT_PERMISSION)
            .bind(rm_account_id)
            .bind(grant.page_id)
            .bind(grant.flags.can_view)
            .bind(grant.flags.can_add)
            .bind(grant.flags.can_update)
            .bind(grant.flags.can_delete)
            .fetch_one(&self.pool)
            .await
            .map_err(missing_reference)?;

        Ok(permission)
    }

    /// All-or-nothing upsert of several pages for one user
    pub async fn bulk_upsert(
        &self,
        rm_account_id: i32,
        grants: &[PageGrantRequest],
    ) -> Result<Vec<PagePermission>, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let mut saved = Vec::with_capacity(grants.len());

        for grant in grants {
            let permission = sqlx::query_as::<_, PagePermission>(UPSERT_PERMISSION)
                .bind(rm_account_id)
                .bind(grant.page_id)
                .bind(grant.flags.can_view)
                .bind(grant.flags.can_add)
                .bind(grant.flags.can_update)
                .bind(grant.flags.can_delete)
                .fetch_one(&mut *tx)
                .await
                .map_err(missing_reference)?;
            saved.push(permission);
        }

        tx.commit().await?;
        Ok(saved)
    }

    pub async fn delete(&self, rm_account_id: i32, page_id: i32) -> Result<(), DatabaseError> {
        let result =
            sqlx::query("DELETE FROM page_permissions WHERE rm_account_id = $1 AND page_id = $2")
                .bind(rm_account_id)
                .bind(page_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("Permission not found".to_string()));
        }
        Ok(())
    }

    /// Apply the same grants to every regular RM in one transaction.
    /// Returns the number of rows written.
    pub async fn apply_to_all_users(&self, grants: &[PageGrantRequest]) -> Result<u64, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let user_ids: Vec<(i32,)> =
            sqlx::query_as("SELECT rm_account_id FROM rm_account WHERE role = 'user'")
                .fetch_all(&mut *tx)
                .await?;

        let mut total = 0u64;
        for (rm_account_id,) in &user_ids {
            for grant in grants {
                sqlx::query(UPSERT_PERMISSION)
                    .bind(*rm_account_id)
                    .bind(grant.page_id)
                    .bind(grant.flags.can_view)
                    .bind(grant.flags.can_add)
                    .bind(grant.flags.can_update)
                    .bind(grant.flags.can_delete)
                    .execute(&mut *tx)
                    .await
                    .map_err(missing_reference)?;
                total += 1;
            }
        }

        tx.commit().await?;
        tracing::info!(
            "Applied {} page grants to {} accounts",
            grants.len(),
            user_ids.len()
        );
        Ok(total)
    }
}

fn missing_reference(err: sqlx::Error) -> DatabaseError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            DatabaseError::NotFound("User or page not found".to_string())
        }
        _ => DatabaseError::Sqlx(err),
    }
}
