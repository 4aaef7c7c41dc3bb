use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::model::{Assignment, Page};
use crate::database::DatabaseError;
use crate::types::{PageId, RoleId, UserId};

/// Read access to the universe of definable pages (owned by the CRUD layer)
#[async_trait]
pub trait PageCatalog: Send + Sync {
    async fn list_active_pages(&self) -> Result<Vec<Page>, DatabaseError>;

    /// Any page by id, active or not; `None` once it has been deleted
    async fn get_page(&self, id: PageId) -> Result<Option<Page>, DatabaseError>;
}

/// Persisted role → page assignments
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    async fn get_by_role(&self, role_id: RoleId) -> Result<Vec<Assignment>, DatabaseError>;

    /// Atomically replace every assignment of `role_id` with `rows`
    async fn replace_for_role(&self, role_id: RoleId, rows: &[Assignment]) -> Result<(), DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

/// User → role membership, primary role first
#[async_trait]
pub trait RoleMembership: Send + Sync {
    async fn roles_for_user(&self, user_id: UserId) -> Result<Vec<RoleId>, DatabaseError>;
}

#[derive(Default)]
struct MemoryState {
    pages: Vec<Page>,
    assignments: HashMap<RoleId, Vec<Assignment>>,
    memberships: HashMap<UserId, Vec<RoleId>>,
    fail_writes: bool,
}

/// In-process implementation of all three collaborators.
///
/// Backs the server when no `DATABASE_URL` is configured, and the test suites.
#[derive(Clone, Default)]
pub struct MemoryNavigationStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryNavigationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a page, or replace the page with the same id
    pub async fn upsert_page(&self, page: Page) {
        let mut state = self.state.write().await;
        match state.pages.iter_mut().find(|p| p.id == page.id) {
            Some(existing) => *existing = page,
            None => state.pages.push(page),
        }
    }

    /// Delete a page upstream without touching assignments that reference it
    pub async fn delete_page(&self, id: PageId) {
        self.state.write().await.pages.retain(|p| p.id != id);
    }

    pub async fn set_roles_for_user(&self, user_id: UserId, roles: Vec<RoleId>) {
        self.state.write().await.memberships.insert(user_id, roles);
    }

    /// Make every subsequent `replace_for_role` fail until switched off
    pub async fn fail_writes(&self, fail: bool) {
        self.state.write().await.fail_writes = fail;
    }
}

#[async_trait]
impl PageCatalog for MemoryNavigationStore {
    async fn list_active_pages(&self) -> Result<Vec<Page>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.pages.iter().filter(|p| p.active).cloned().collect())
    }

    async fn get_page(&self, id: PageId) -> Result<Option<Page>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.pages.iter().find(|p| p.id == id).cloned())
    }
}

#[async_trait]
impl AssignmentStore for MemoryNavigationStore {
    async fn get_by_role(&self, role_id: RoleId) -> Result<Vec<Assignment>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.assignments.get(&role_id).cloned().unwrap_or_default())
    }

    async fn replace_for_role(&self, role_id: RoleId, rows: &[Assignment]) -> Result<(), DatabaseError> {
        let mut state = self.state.write().await;
        if state.fail_writes {
            return Err(DatabaseError::Unavailable("assignment store rejected the write".to_string()));
        }
        let rows = rows
            .iter()
            .map(|a| Assignment {
                role_id,
                ..a.clone()
            })
            .collect();
        state.assignments.insert(role_id, rows);
        Ok(())
    }
}

#[async_trait]
impl RoleMembership for MemoryNavigationStore {
    async fn roles_for_user(&self, user_id: UserId) -> Result<Vec<RoleId>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.memberships.get(&user_id).cloned().unwrap_or_default())
    }
}
