// ============================================================================
// Menu Infrastructure - PostgreSQL Menu Repository
// File: crates/menu-infrastructure/src/database/postgres/menu_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::{error, info};

use menu_core::domain::{MenuNode, MenuNodeType};
use menu_core::error::DomainError;
use menu_core::repositories::{DerivedUpdate, MenuFilter, MenuRepository};
use menu_shared::{MenuId, UserId};

pub struct PgMenuRepository {
    pool: PgPool,
}

impl PgMenuRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal row type for SQLx mapping
#[derive(Debug, FromRow)]
struct MenuNodeRow {
    pub id: String,
    pub parent_id: String,
    pub name: String,
    pub title: String,
    pub path: String,
    pub component: Option<String>,
    pub redirect: Option<String>,
    pub icon: Option<String>,
    pub permission_code: Option<String>,
    pub node_type: String,
    pub sort_order: i32,
    pub is_link: bool,
    pub is_hidden: bool,
    pub depth: i32,
    pub has_children: bool,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<i64>,
    pub modified_at: Option<DateTime<Utc>>,
    pub modified_by: Option<i64>,
    pub removed_at: Option<DateTime<Utc>>,
    pub removed_by: Option<i64>,
}

impl From<MenuNodeRow> for MenuNode {
    fn from(row: MenuNodeRow) -> Self {
        MenuNode {
            id: row.id,
            parent_id: row.parent_id,
            name: row.name,
            title: row.title,
            path: row.path,
            component: row.component,
            redirect: row.redirect,
            icon: row.icon,
            permission_code: row.permission_code,
            node_type: MenuNodeType::from_str(&row.node_type).unwrap_or_default(),
            sort_order: row.sort_order,
            is_link: row.is_link,
            is_hidden: row.is_hidden,
            depth: row.depth,
            has_children: row.has_children,
            deleted: row.deleted,
            created_at: row.created_at,
            created_by: row.created_by,
            modified_at: row.modified_at,
            modified_by: row.modified_by,
            removed_at: row.removed_at,
            removed_by: row.removed_by,
        }
    }
}

/// Translates the port's predicate into conjunctive SQL conditions. Shared
/// by `list` and `count` so the two can never drift apart.
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &MenuFilter) {
    if !filter.include_deleted {
        qb.push(" AND deleted = FALSE");
    }
    if !filter.include_buttons {
        qb.push(" AND node_type <> 'button'");
    }
    if let Some(ids) = &filter.ids_in {
        qb.push(" AND id = ANY(");
        qb.push_bind(ids.clone());
        qb.push(")");
    }
    if let Some(ids) = &filter.ids_not_in {
        qb.push(" AND NOT (id = ANY(");
        qb.push_bind(ids.clone());
        qb.push("))");
    }
    if let Some(id) = &filter.id_ne {
        qb.push(" AND id <> ");
        qb.push_bind(id.clone());
    }
    if let Some(name) = &filter.name_eq {
        qb.push(" AND name = ");
        qb.push_bind(name.clone());
    }
    if let Some(path) = &filter.path_eq {
        qb.push(" AND path = ");
        qb.push_bind(path.clone());
    }
    if let Some(code) = &filter.permission_code_eq {
        qb.push(" AND permission_code = ");
        qb.push_bind(code.clone());
    }
    if let Some(parent) = &filter.parent_id_eq {
        qb.push(" AND parent_id = ");
        qb.push_bind(parent.clone());
    }
}

fn map_db_err(e: sqlx::Error, context: &str) -> DomainError {
    error!("Database error {}: {}", context, e);
    DomainError::DatabaseError(e.to_string())
}

#[async_trait]
impl MenuRepository for PgMenuRepository {
    async fn list(&self, filter: &MenuFilter) -> Result<Vec<MenuNode>, DomainError> {
        let mut qb = QueryBuilder::new(
            "SELECT \
                id, parent_id, name, title, path, component, redirect, icon, \
                permission_code, node_type, sort_order, is_link, is_hidden, \
                depth, has_children, deleted, \
                created_at, created_by, modified_at, modified_by, \
                removed_at, removed_by \
            FROM menu_nodes WHERE 1=1",
        );
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY sort_order ASC, id ASC");

        let rows: Vec<MenuNodeRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_err(e, "listing menus"))?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn count(&self, filter: &MenuFilter) -> Result<i64, DomainError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM menu_nodes WHERE 1=1");
        push_filter(&mut qb, filter);

        qb.build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_err(e, "counting menus"))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<MenuNode>, DomainError> {
        let row: Option<MenuNodeRow> = sqlx::query_as(
            r#"
            SELECT
                id, parent_id, name, title, path, component, redirect, icon,
                permission_code, node_type, sort_order, is_link, is_hidden,
                depth, has_children, deleted,
                created_at, created_by, modified_at, modified_by,
                removed_at, removed_by
            FROM menu_nodes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "finding menu by id"))?;

        Ok(row.map(|r| r.into()))
    }

    async fn insert(&self, node: &MenuNode) -> Result<MenuNode, DomainError> {
        info!("Creating menu record: {}", node.id);

        let row: MenuNodeRow = sqlx::query_as(
            r#"
            INSERT INTO menu_nodes (
                id, parent_id, name, title, path, component, redirect, icon,
                permission_code, node_type, sort_order, is_link, is_hidden,
                depth, has_children, deleted,
                created_at, created_by, modified_at, modified_by,
                removed_at, removed_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                    $14, $15, $16, $17, $18, $19, $20, $21, $22)
            RETURNING
                id, parent_id, name, title, path, component, redirect, icon,
                permission_code, node_type, sort_order, is_link, is_hidden,
                depth, has_children, deleted,
                created_at, created_by, modified_at, modified_by,
                removed_at, removed_by
            "#,
        )
        .bind(&node.id)
        .bind(&node.parent_id)
        .bind(&node.name)
        .bind(&node.title)
        .bind(&node.path)
        .bind(&node.component)
        .bind(&node.redirect)
        .bind(&node.icon)
        .bind(&node.permission_code)
        .bind(node.node_type.as_str())
        .bind(node.sort_order)
        .bind(node.is_link)
        .bind(node.is_hidden)
        .bind(node.depth)
        .bind(node.has_children)
        .bind(node.deleted)
        .bind(node.created_at)
        .bind(node.created_by)
        .bind(node.modified_at)
        .bind(node.modified_by)
        .bind(node.removed_at)
        .bind(node.removed_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error creating menu: {}", e);
            let msg = e.to_string();
            if msg.contains("unique") || msg.contains("duplicate") {
                if msg.contains("path") {
                    DomainError::MenuPathAlreadyExists(node.path.clone())
                } else {
                    DomainError::MenuNameAlreadyExists(node.name.clone())
                }
            } else {
                DomainError::DatabaseError(msg)
            }
        })?;

        Ok(row.into())
    }

    async fn update(&self, node: &MenuNode) -> Result<MenuNode, DomainError> {
        let row: MenuNodeRow = sqlx::query_as(
            r#"
            UPDATE menu_nodes
            SET
                parent_id = $2,
                name = $3,
                title = $4,
                path = $5,
                component = $6,
                redirect = $7,
                icon = $8,
                permission_code = $9,
                node_type = $10,
                sort_order = $11,
                is_link = $12,
                is_hidden = $13,
                depth = $14,
                has_children = $15,
                deleted = $16,
                modified_at = $17,
                modified_by = $18,
                removed_at = $19,
                removed_by = $20
            WHERE id = $1
            RETURNING
                id, parent_id, name, title, path, component, redirect, icon,
                permission_code, node_type, sort_order, is_link, is_hidden,
                depth, has_children, deleted,
                created_at, created_by, modified_at, modified_by,
                removed_at, removed_by
            "#,
        )
        .bind(&node.id)
        .bind(&node.parent_id)
        .bind(&node.name)
        .bind(&node.title)
        .bind(&node.path)
        .bind(&node.component)
        .bind(&node.redirect)
        .bind(&node.icon)
        .bind(&node.permission_code)
        .bind(node.node_type.as_str())
        .bind(node.sort_order)
        .bind(node.is_link)
        .bind(node.is_hidden)
        .bind(node.depth)
        .bind(node.has_children)
        .bind(node.deleted)
        .bind(node.modified_at)
        .bind(node.modified_by)
        .bind(node.removed_at)
        .bind(node.removed_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "updating menu"))?;

        Ok(row.into())
    }

    async fn soft_delete_many(
        &self,
        ids: &[MenuId],
        removed_by: UserId,
    ) -> Result<u64, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE menu_nodes
            SET deleted = TRUE, removed_at = NOW(), removed_by = $2
            WHERE id = ANY($1) AND deleted = FALSE
            "#,
        )
        .bind(ids)
        .bind(removed_by)
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "soft-deleting menus"))?;

        Ok(result.rows_affected())
    }

    async fn descendant_closure(&self, root_ids: &[MenuId]) -> Result<Vec<MenuId>, DomainError> {
        // UNION (not UNION ALL) keeps the recursion finite even if stored
        // data ever holds a parent cycle.
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            WITH RECURSIVE descendants AS (
                SELECT id FROM menu_nodes WHERE id = ANY($1)
                UNION
                SELECT n.id FROM menu_nodes n
                JOIN descendants d ON n.parent_id = d.id
            )
            SELECT id FROM descendants
            "#,
        )
        .bind(root_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_err(e, "resolving descendant closure"))?;

        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    async fn sync_derived(&self, updates: &[DerivedUpdate]) -> Result<u64, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_db_err(e, "opening derived-sync transaction"))?;

        for update in updates {
            sqlx::query(
                r#"
                UPDATE menu_nodes
                SET depth = $2, has_children = $3
                WHERE id = $1
                "#,
            )
            .bind(&update.id)
            .bind(update.depth)
            .bind(update.has_children)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_db_err(e, "writing derived fields"))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_db_err(e, "committing derived sync"))?;

        Ok(updates.len() as u64)
    }
}
