// ============================================================================
// Menu Infrastructure - PostgreSQL Role Grant Repository
// File: crates/menu-infrastructure/src/database/postgres/role_grant_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};

use menu_core::error::DomainError;
use menu_core::repositories::RoleGrantRepository;
use menu_shared::{MenuId, UserId};

pub struct PgRoleGrantRepository {
    pool: PgPool,
}

impl PgRoleGrantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleGrantRepository for PgRoleGrantRepository {
    async fn menu_ids_for_user(&self, user_id: UserId) -> Result<Vec<MenuId>, DomainError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT DISTINCT rm.menu_id
            FROM role_menus rm
            JOIN user_roles ur ON ur.role_id = rm.role_id
            WHERE ur.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error querying user menu grants: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    async fn remove_grants_for_menus(&self, menu_ids: &[MenuId]) -> Result<u64, DomainError> {
        let result = sqlx::query(
            r#"
            DELETE FROM role_menus WHERE menu_id = ANY($1)
            "#,
        )
        .bind(menu_ids)
        .execute(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error removing menu grants: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        info!("Removed {} role grants for {} menus", result.rows_affected(), menu_ids.len());
        Ok(result.rows_affected())
    }
}
