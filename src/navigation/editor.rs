use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::builder::{build_tree, flatten};
use super::error::HierarchyError;
use super::model::{Assignment, Page, PageTreeNode};
use super::store::AssignmentStore;
use crate::config::HierarchyConfig;
use crate::database::DatabaseError;
use crate::types::{PageId, RoleId};

/// Editor lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorState {
    /// No working list loaded yet
    Empty,
    /// Working list present and editable
    Loaded,
    /// Flattened and ready to persist; the working tree is kept for display
    Committed,
}

/// Structural limits applied by the editor (the data model itself is depth-agnostic)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorPolicy {
    /// Maximum number of levels, roots included. `None` disables the check.
    pub max_depth: Option<usize>,
}

impl Default for EditorPolicy {
    fn default() -> Self {
        Self { max_depth: Some(2) }
    }
}

impl EditorPolicy {
    pub fn unlimited() -> Self {
        Self { max_depth: None }
    }

    pub fn from_config(config: &HierarchyConfig) -> Self {
        Self {
            max_depth: config.max_depth,
        }
    }
}

/// A single operator action, as submitted by the role-edit UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditOperation {
    Add {
        page_id: PageId,
        #[serde(default)]
        parent_page_id: Option<PageId>,
    },
    Remove {
        page_id: PageId,
    },
    MoveUp {
        page_id: PageId,
    },
    MoveDown {
        page_id: PageId,
    },
    SetParent {
        page_id: PageId,
        parent_page_id: Option<PageId>,
    },
    ToRoot {
        page_id: PageId,
    },
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    #[error(transparent)]
    Store(#[from] DatabaseError),
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    parent: Option<PageId>,
    order: i32,
}

/// Working copy of one role's page hierarchy for a single editing session.
///
/// Rows live in an arena keyed by page id; sibling groups are derived on
/// demand and renumbered after every mutation, so each operation leaves every
/// group's display orders at exactly `0..n`.
pub struct HierarchyEditor {
    role_id: RoleId,
    catalog: HashMap<PageId, Page>,
    policy: EditorPolicy,
    state: EditorState,
    slots: HashMap<PageId, Slot>,
}

impl HierarchyEditor {
    /// Start an empty session against a snapshot of the page catalog
    pub fn new(role_id: RoleId, pages: Vec<Page>, policy: EditorPolicy) -> Self {
        Self {
            role_id,
            catalog: pages.into_iter().map(|p| (p.id, p)).collect(),
            policy,
            state: EditorState::Empty,
            slots: HashMap::new(),
        }
    }

    pub fn role_id(&self) -> RoleId {
        self.role_id
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    /// Pages in the catalog snapshot not yet assigned to the role
    pub fn available_pages(&self) -> Vec<&Page> {
        let mut pages: Vec<&Page> = self
            .catalog
            .values()
            .filter(|p| !self.slots.contains_key(&p.id))
            .collect();
        pages.sort_by(|a, b| a.name.cmp(&b.name));
        pages
    }

    /// Load persisted rows (or an empty list) into the working copy.
    ///
    /// Rows are self-healed the same way reads are, so drift from upstream
    /// deletions never surfaces as an editing error.
    pub fn load(&mut self, assignments: &[Assignment]) -> Vec<Assignment> {
        let pages: Vec<Page> = self.catalog.values().cloned().collect();
        let tree = build_tree(assignments, &pages);
        self.slots = flatten(&tree, self.role_id)
            .into_iter()
            .map(|a| {
                (
                    a.page_id,
                    Slot {
                        parent: a.parent_page_id,
                        order: a.display_order,
                    },
                )
            })
            .collect();
        self.state = EditorState::Loaded;
        debug!("Loaded {} page assignment(s) for role {}", self.slots.len(), self.role_id);
        self.working_list()
    }

    /// Current working tree for rendering; empty before `load`
    pub fn working_tree(&self) -> Vec<PageTreeNode> {
        let pages: Vec<Page> = self.catalog.values().cloned().collect();
        build_tree(&self.rows(), &pages)
    }

    /// Current normalized flat list
    pub fn working_list(&self) -> Vec<Assignment> {
        flatten(&self.working_tree(), self.role_id)
    }

    pub fn add_page(
        &mut self,
        page_id: PageId,
        parent_page_id: Option<PageId>,
    ) -> Result<Vec<Assignment>, HierarchyError> {
        self.ensure_loaded()?;
        self.ensure_known(page_id)?;
        if self.slots.contains_key(&page_id) {
            return Err(HierarchyError::DuplicateAssignment(page_id));
        }
        if let Some(parent) = parent_page_id {
            self.ensure_known(parent)?;
            if !self.slots.contains_key(&parent) {
                return Err(HierarchyError::unassigned_parent(page_id, parent));
            }
        }
        self.ensure_depth(parent_page_id, 1, 0)?;

        let order = self.siblings(parent_page_id).len() as i32;
        self.slots.insert(
            page_id,
            Slot {
                parent: parent_page_id,
                order,
            },
        );
        debug!("Added page {} under {:?} at {}", page_id, parent_page_id, order);
        Ok(self.touched())
    }

    /// Remove a page together with its whole subtree
    pub fn remove_page(&mut self, page_id: PageId) -> Result<Vec<Assignment>, HierarchyError> {
        self.ensure_loaded()?;
        let slot = self.slot(page_id)?;

        let doomed = self.subtree(page_id);
        for id in &doomed {
            self.slots.remove(id);
        }
        self.renumber(slot.parent);
        debug!("Removed page {} and {} descendant(s)", page_id, doomed.len() - 1);
        Ok(self.touched())
    }

    pub fn move_up(&mut self, page_id: PageId) -> Result<Vec<Assignment>, HierarchyError> {
        self.shift(page_id, -1)
    }

    pub fn move_down(&mut self, page_id: PageId) -> Result<Vec<Assignment>, HierarchyError> {
        self.shift(page_id, 1)
    }

    /// Re-nest a page (and its subtree) as the last child of `new_parent`, or as the last root
    pub fn set_parent(
        &mut self,
        page_id: PageId,
        new_parent: Option<PageId>,
    ) -> Result<Vec<Assignment>, HierarchyError> {
        self.ensure_loaded()?;
        self.ensure_known(page_id)?;
        if let Some(parent) = new_parent {
            self.ensure_known(parent)?;
        }
        let slot = self.slot(page_id)?;

        if let Some(parent) = new_parent {
            if parent == page_id {
                return Err(HierarchyError::self_parent(page_id));
            }
            if !self.slots.contains_key(&parent) {
                return Err(HierarchyError::unassigned_parent(page_id, parent));
            }
            if self.is_ancestor(page_id, parent) {
                return Err(HierarchyError::descendant_parent(page_id, parent));
            }
        }
        let height = self.height(page_id);
        self.ensure_depth(new_parent, height, self.depth(page_id) - 1 + height)?;

        let order = self
            .siblings(new_parent)
            .into_iter()
            .filter(|id| *id != page_id)
            .count() as i32;
        self.slots.insert(
            page_id,
            Slot {
                parent: new_parent,
                order,
            },
        );
        self.renumber(slot.parent);
        self.renumber(new_parent);
        debug!("Moved page {} from {:?} to {:?}", page_id, slot.parent, new_parent);
        Ok(self.touched())
    }

    pub fn to_root(&mut self, page_id: PageId) -> Result<Vec<Assignment>, HierarchyError> {
        self.set_parent(page_id, None)
    }

    pub fn apply(&mut self, op: EditOperation) -> Result<Vec<Assignment>, HierarchyError> {
        match op {
            EditOperation::Add { page_id, parent_page_id } => self.add_page(page_id, parent_page_id),
            EditOperation::Remove { page_id } => self.remove_page(page_id),
            EditOperation::MoveUp { page_id } => self.move_up(page_id),
            EditOperation::MoveDown { page_id } => self.move_down(page_id),
            EditOperation::SetParent { page_id, parent_page_id } => self.set_parent(page_id, parent_page_id),
            EditOperation::ToRoot { page_id } => self.to_root(page_id),
        }
    }

    /// Flatten the working tree into rows ready for `AssignmentStore::replace_for_role`
    pub fn commit(&mut self) -> Result<Vec<Assignment>, HierarchyError> {
        self.ensure_loaded()?;
        let rows = self.working_list();
        self.state = EditorState::Committed;
        Ok(rows)
    }

    /// Commit and hand the rows to the store as one atomic replace.
    ///
    /// On failure the working tree is left exactly as it was so the save can be retried.
    pub async fn persist(&mut self, store: &dyn AssignmentStore) -> Result<Vec<Assignment>, PersistError> {
        let rows = self.commit()?;
        store.replace_for_role(self.role_id, &rows).await?;
        info!("Persisted {} page assignment(s) for role {}", rows.len(), self.role_id);
        Ok(rows)
    }

    fn shift(&mut self, page_id: PageId, delta: isize) -> Result<Vec<Assignment>, HierarchyError> {
        self.ensure_loaded()?;
        let slot = self.slot(page_id)?;

        let siblings = self.siblings(slot.parent);
        let Some(position) = siblings.iter().position(|id| *id == page_id) else {
            return Err(HierarchyError::NotAssigned(page_id));
        };
        let target = position as isize + delta;
        if target < 0 || target as usize >= siblings.len() {
            return Ok(self.working_list());
        }

        let neighbour = siblings[target as usize];
        let neighbour_order = self.slots[&neighbour].order;
        if let Some(s) = self.slots.get_mut(&neighbour) {
            s.order = slot.order;
        }
        if let Some(s) = self.slots.get_mut(&page_id) {
            s.order = neighbour_order;
        }
        self.renumber(slot.parent);
        Ok(self.touched())
    }

    fn ensure_loaded(&self) -> Result<(), HierarchyError> {
        match self.state {
            EditorState::Empty => Err(HierarchyError::NotLoaded),
            EditorState::Loaded | EditorState::Committed => Ok(()),
        }
    }

    fn ensure_known(&self, page_id: PageId) -> Result<(), HierarchyError> {
        if self.catalog.contains_key(&page_id) {
            Ok(())
        } else {
            Err(HierarchyError::UnknownPage(page_id))
        }
    }

    /// Reject a placement whose deepest level would pass the limit.
    ///
    /// `current` is the deepest level the subtree reaches today (0 when it is
    /// not placed yet). Moves that do not go deeper than that always pass, so
    /// rows saved before the limit was tightened can still be flattened.
    fn ensure_depth(
        &self,
        parent: Option<PageId>,
        height: usize,
        current: usize,
    ) -> Result<(), HierarchyError> {
        let Some(max_depth) = self.policy.max_depth else {
            return Ok(());
        };
        let parent_depth = parent.map(|p| self.depth(p)).unwrap_or(0);
        let bottom = parent_depth + height;
        if bottom > max_depth && bottom > current {
            return Err(HierarchyError::DepthExceeded { max_depth });
        }
        Ok(())
    }

    fn slot(&self, page_id: PageId) -> Result<Slot, HierarchyError> {
        self.slots
            .get(&page_id)
            .copied()
            .ok_or(HierarchyError::NotAssigned(page_id))
    }

    /// Any mutation after a commit makes the session editable again
    fn touched(&mut self) -> Vec<Assignment> {
        self.state = EditorState::Loaded;
        self.working_list()
    }

    fn rows(&self) -> Vec<Assignment> {
        self.slots
            .iter()
            .map(|(page_id, slot)| Assignment {
                role_id: self.role_id,
                page_id: *page_id,
                parent_page_id: slot.parent,
                display_order: slot.order,
            })
            .collect()
    }

    fn siblings(&self, parent: Option<PageId>) -> Vec<PageId> {
        let mut group: Vec<(i32, PageId)> = self
            .slots
            .iter()
            .filter(|(_, s)| s.parent == parent)
            .map(|(id, s)| (s.order, *id))
            .collect();
        group.sort();
        group.into_iter().map(|(_, id)| id).collect()
    }

    fn renumber(&mut self, parent: Option<PageId>) {
        for (position, id) in self.siblings(parent).into_iter().enumerate() {
            if let Some(s) = self.slots.get_mut(&id) {
                s.order = position as i32;
            }
        }
    }

    fn subtree(&self, page_id: PageId) -> Vec<PageId> {
        let mut out = vec![page_id];
        let mut cursor = 0;
        while cursor < out.len() {
            let current = out[cursor];
            out.extend(self.siblings(Some(current)));
            cursor += 1;
        }
        out
    }

    /// Whether `ancestor` sits on the parent chain of `page_id`
    fn is_ancestor(&self, ancestor: PageId, page_id: PageId) -> bool {
        let mut current = self.slots.get(&page_id).and_then(|s| s.parent);
        let mut steps = 0;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.slots.len() {
                break;
            }
            current = self.slots.get(&id).and_then(|s| s.parent);
        }
        false
    }

    /// Level of a page, roots being level 1
    fn depth(&self, page_id: PageId) -> usize {
        let mut depth = 1;
        let mut current = self.slots.get(&page_id).and_then(|s| s.parent);
        while let Some(id) = current {
            depth += 1;
            if depth > self.slots.len() {
                break;
            }
            current = self.slots.get(&id).and_then(|s| s.parent);
        }
        depth
    }

    fn height(&self, page_id: PageId) -> usize {
        1 + self
            .siblings(Some(page_id))
            .into_iter()
            .map(|child| self.height(child))
            .max()
            .unwrap_or(0)
    }
}
