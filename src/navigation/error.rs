use thiserror::Error;

use crate::types::PageId;

/// Local validation failures raised by the hierarchy editor.
///
/// None of these ever reach persistence.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("No working list loaded")]
    NotLoaded,

    #[error("Page {0} is already assigned to this role")]
    DuplicateAssignment(PageId),

    #[error("Page {page_id} cannot be nested under {parent_page_id}: {reason}")]
    InvalidParent {
        page_id: PageId,
        parent_page_id: PageId,
        reason: &'static str,
    },

    #[error("Unknown page: {0}")]
    UnknownPage(PageId),

    #[error("Page {0} is not assigned to this role")]
    NotAssigned(PageId),

    #[error("Nesting exceeds the maximum depth of {max_depth}")]
    DepthExceeded { max_depth: usize },
}

impl HierarchyError {
    pub(crate) fn self_parent(page_id: PageId) -> Self {
        HierarchyError::InvalidParent {
            page_id,
            parent_page_id: page_id,
            reason: "a page cannot be its own parent",
        }
    }

    pub(crate) fn descendant_parent(page_id: PageId, parent_page_id: PageId) -> Self {
        HierarchyError::InvalidParent {
            page_id,
            parent_page_id,
            reason: "the new parent is a descendant of the page",
        }
    }

    pub(crate) fn unassigned_parent(page_id: PageId, parent_page_id: PageId) -> Self {
        HierarchyError::InvalidParent {
            page_id,
            parent_page_id,
            reason: "the parent page is not assigned to this role",
        }
    }
}

/// Strict check failures on a submitted page-order list
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("display_order must be non-negative")]
    NegativeOrder(PageId),

    #[error("page is listed more than once")]
    DuplicatePage(PageId),

    #[error("page does not exist")]
    UnknownPage(PageId),

    #[error("page cannot be its own parent")]
    SelfParent(PageId),

    #[error("parent page is not assigned to this role")]
    ParentNotAssigned(PageId),

    #[error("parent chain forms a cycle")]
    Cycle(PageId),
}

impl Violation {
    pub fn page_id(&self) -> PageId {
        match self {
            Violation::NegativeOrder(id)
            | Violation::DuplicatePage(id)
            | Violation::UnknownPage(id)
            | Violation::SelfParent(id)
            | Violation::ParentNotAssigned(id)
            | Violation::Cycle(id) => *id,
        }
    }
}
