use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::{PageId, RoleId};

/// A navigable destination owned by the page catalog.
///
/// Read-only from the navigation core's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Page {
    pub id: PageId,
    pub name: String,
    /// Route path, or an absolute URL when `is_external` is set
    pub url: String,
    pub is_external: bool,
    pub active: bool,
}

impl Page {
    pub fn new(id: PageId, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            url: url.into(),
            is_external: false,
            active: true,
        }
    }

    pub fn external(mut self) -> Self {
        self.is_external = true;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// The fact that a page belongs to a role, with nesting and order metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Assignment {
    pub role_id: RoleId,
    pub page_id: PageId,
    /// `None` for a root (main-menu) entry
    pub parent_page_id: Option<PageId>,
    pub display_order: i32,
}

impl Assignment {
    pub fn root(role_id: RoleId, page_id: PageId, display_order: i32) -> Self {
        Self {
            role_id,
            page_id,
            parent_page_id: None,
            display_order,
        }
    }

    pub fn child(role_id: RoleId, page_id: PageId, parent: PageId, display_order: i32) -> Self {
        Self {
            role_id,
            page_id,
            parent_page_id: Some(parent),
            display_order,
        }
    }

    pub fn to_entry(&self) -> PageOrderEntry {
        PageOrderEntry {
            page_id: self.page_id,
            parent_page_id: self.parent_page_id,
            display_order: self.display_order,
        }
    }
}

/// Persisted shape over the wire: one triple per assignment of a role.
///
/// The save endpoint and the page-order read endpoint both speak this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageOrderEntry {
    pub page_id: PageId,
    #[serde(default)]
    pub parent_page_id: Option<PageId>,
    pub display_order: i32,
}

impl PageOrderEntry {
    pub fn into_assignment(self, role_id: RoleId) -> Assignment {
        Assignment {
            role_id,
            page_id: self.page_id,
            parent_page_id: self.parent_page_id,
            display_order: self.display_order,
        }
    }
}

/// Transient nested view of a role's assignments, rebuilt on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageTreeNode {
    pub page: Page,
    pub parent_page_id: Option<PageId>,
    pub display_order: i32,
    pub children: Vec<PageTreeNode>,
}

impl PageTreeNode {
    pub fn page_id(&self) -> PageId {
        self.page.id
    }

    /// Number of nodes in this subtree, the node itself included
    pub fn subtree_size(&self) -> usize {
        1 + self.children.iter().map(PageTreeNode::subtree_size).sum::<usize>()
    }
}
