use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use super::builder::build_tree;
use super::model::{Assignment, Page, PageTreeNode};
use super::store::{AssignmentStore, PageCatalog, RoleMembership};
use crate::database::DatabaseError;
use crate::types::{PageId, RoleId, UserId};

/// Rows of one role plus every page those rows can legitimately render
#[derive(Debug, Clone)]
pub struct RoleSnapshot {
    pub assignments: Vec<Assignment>,
    /// Active catalog pages, plus inactive pages still assigned to the role
    pub pages: Vec<Page>,
}

/// Resolves persisted assignments into the navigation trees the UI renders.
///
/// Stateless: every call reads a fresh snapshot of the store and catalog, so
/// it can be shared and called concurrently.
#[derive(Clone)]
pub struct ResolutionService {
    catalog: Arc<dyn PageCatalog>,
    store: Arc<dyn AssignmentStore>,
    membership: Arc<dyn RoleMembership>,
}

impl ResolutionService {
    pub fn new(
        catalog: Arc<dyn PageCatalog>,
        store: Arc<dyn AssignmentStore>,
        membership: Arc<dyn RoleMembership>,
    ) -> Self {
        Self {
            catalog,
            store,
            membership,
        }
    }

    pub async fn role_snapshot(&self, role_id: RoleId) -> Result<RoleSnapshot, DatabaseError> {
        let assignments = self.store.get_by_role(role_id).await?;
        let pages = self.known_pages(assignments.iter().map(|a| a.page_id)).await?;
        Ok(RoleSnapshot { assignments, pages })
    }

    /// Active catalog pages plus any of `referenced` that still exist but are inactive.
    ///
    /// Inactive pages are absent from the active listing but must stay
    /// distinguishable from deleted ones, so their subtrees can be pruned
    /// instead of demoted.
    pub async fn known_pages(
        &self,
        referenced: impl Iterator<Item = PageId>,
    ) -> Result<Vec<Page>, DatabaseError> {
        let mut pages = self.catalog.list_active_pages().await?;
        let mut known: HashSet<_> = pages.iter().map(|p| p.id).collect();
        for page_id in referenced {
            if known.insert(page_id) {
                if let Some(page) = self.catalog.get_page(page_id).await? {
                    pages.push(page);
                }
            }
        }
        Ok(pages)
    }

    pub fn store(&self) -> &dyn AssignmentStore {
        self.store.as_ref()
    }

    /// Navigation tree for one role, inactive pages pruned with their subtrees
    pub async fn resolve_for_role(&self, role_id: RoleId) -> Result<Vec<PageTreeNode>, DatabaseError> {
        let snapshot = self.role_snapshot(role_id).await?;
        let tree = build_tree(&snapshot.assignments, &snapshot.pages);
        Ok(prune_inactive(tree))
    }

    /// Merged navigation tree over every role of the user, primary role first
    pub async fn resolve_for_user(&self, user_id: UserId) -> Result<Vec<PageTreeNode>, DatabaseError> {
        let roles = self.membership.roles_for_user(user_id).await?;
        self.resolve_for_roles(&roles).await
    }

    pub async fn resolve_for_roles(&self, roles: &[RoleId]) -> Result<Vec<PageTreeNode>, DatabaseError> {
        let mut seen = HashSet::new();
        let mut trees = Vec::with_capacity(roles.len());
        for role_id in roles {
            if seen.insert(*role_id) {
                trees.push(self.resolve_for_role(*role_id).await?);
            }
        }
        let merged = merge_trees(trees);
        debug!(
            "Merged navigation of {} role(s) into {} page(s)",
            seen.len(),
            merged.iter().map(PageTreeNode::subtree_size).sum::<usize>()
        );
        Ok(merged)
    }
}

fn prune_inactive(nodes: Vec<PageTreeNode>) -> Vec<PageTreeNode> {
    nodes
        .into_iter()
        .filter(|n| n.page.active)
        .map(|mut n| {
            n.children = prune_inactive(std::mem::take(&mut n.children));
            n
        })
        .collect()
}

/// Union per-role trees by page id; the first occurrence of a page wins.
///
/// A page met again is never duplicated: its children are merged into the
/// node that was placed first, wherever that node sits. Only pages already
/// placed are dropped, so every page any role grants stays reachable. Each
/// level is then ordered by the display order each node had in its role of
/// origin, earlier roles first on ties.
pub fn merge_trees(trees: Vec<Vec<PageTreeNode>>) -> Vec<PageTreeNode> {
    let mut merged = Vec::new();
    let mut placed = HashSet::new();
    for tree in trees {
        let mut pending = Vec::new();
        merge_level(&mut merged, tree, &mut placed, &mut pending);
        // Children of pages that were placed at another level
        while let Some((page_id, children)) = pending.pop() {
            if let Some(survivor) = find_node_mut(&mut merged, page_id) {
                merge_level(&mut survivor.children, children, &mut placed, &mut pending);
            }
        }
    }
    sort_levels(&mut merged);
    merged
}

fn merge_level(
    target: &mut Vec<PageTreeNode>,
    incoming: Vec<PageTreeNode>,
    placed: &mut HashSet<PageId>,
    pending: &mut Vec<(PageId, Vec<PageTreeNode>)>,
) {
    for mut node in incoming {
        let children = std::mem::take(&mut node.children);
        if let Some(existing) = target.iter_mut().find(|n| n.page_id() == node.page_id()) {
            merge_level(&mut existing.children, children, placed, pending);
            continue;
        }
        if !placed.insert(node.page_id()) {
            if !children.is_empty() {
                pending.push((node.page_id(), children));
            }
            continue;
        }
        let index = target.len();
        target.push(node);
        merge_level(&mut target[index].children, children, placed, pending);
    }
}

fn find_node_mut(nodes: &mut [PageTreeNode], page_id: PageId) -> Option<&mut PageTreeNode> {
    for node in nodes {
        if node.page_id() == page_id {
            return Some(node);
        }
        if let Some(found) = find_node_mut(&mut node.children, page_id) {
            return Some(found);
        }
    }
    None
}

fn sort_levels(nodes: &mut [PageTreeNode]) {
    nodes.sort_by_key(|n| n.display_order);
    for node in nodes.iter_mut() {
        sort_levels(&mut node.children);
    }
}
