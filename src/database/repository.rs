use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::navigation::model::{Assignment, Page};
use crate::navigation::store::{AssignmentStore, PageCatalog, RoleMembership};
use crate::types::{PageId, RoleId, UserId};

/// Postgres-backed page catalog, assignment store and role membership.
///
/// Tables (see `sql/schema.sql`):
/// - `pages(id, name, url, is_external, active)`
/// - `role_pages(role_id, page_id, parent_page_id, display_order)`
/// - `user_roles(user_id, role_id, position)`
#[derive(Clone)]
pub struct PgNavigationStore {
    pool: PgPool,
}

impl PgNavigationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Store over the shared pool managed by `DatabaseManager`
    pub async fn connect() -> Result<Self, DatabaseError> {
        Ok(Self::new(DatabaseManager::pool().await?))
    }
}

#[async_trait]
impl PageCatalog for PgNavigationStore {
    async fn list_active_pages(&self) -> Result<Vec<Page>, DatabaseError> {
        let pages = sqlx::query_as::<_, Page>(
            "SELECT id, name, url, is_external, active
             FROM pages
             WHERE active = true
             ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(pages)
    }

    async fn get_page(&self, id: PageId) -> Result<Option<Page>, DatabaseError> {
        let page = sqlx::query_as::<_, Page>(
            "SELECT id, name, url, is_external, active
             FROM pages
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(page)
    }
}

#[async_trait]
impl AssignmentStore for PgNavigationStore {
    async fn get_by_role(&self, role_id: RoleId) -> Result<Vec<Assignment>, DatabaseError> {
        let rows = sqlx::query_as::<_, Assignment>(
            "SELECT role_id, page_id, parent_page_id, display_order
             FROM role_pages
             WHERE role_id = $1
             ORDER BY parent_page_id NULLS FIRST, display_order",
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;

        debug!("Loaded {} assignment(s) for role {}", rows.len(), role_id);
        Ok(rows)
    }

    async fn replace_for_role(&self, role_id: RoleId, rows: &[Assignment]) -> Result<(), DatabaseError> {
        // Delete and re-insert in one transaction: a save applies fully or not at all
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM role_pages WHERE role_id = $1")
            .bind(role_id)
            .execute(&mut *tx)
            .await?;

        for row in rows {
            sqlx::query(
                "INSERT INTO role_pages (role_id, page_id, parent_page_id, display_order)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(role_id)
            .bind(row.page_id)
            .bind(row.parent_page_id)
            .bind(row.display_order)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("Replaced page assignments for role {} ({} rows)", role_id, rows.len());
        Ok(())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl RoleMembership for PgNavigationStore {
    async fn roles_for_user(&self, user_id: UserId) -> Result<Vec<RoleId>, DatabaseError> {
        let roles = sqlx::query_scalar::<_, RoleId>(
            "SELECT role_id
             FROM user_roles
             WHERE user_id = $1
             ORDER BY position, role_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }
}
