// navigation - role-to-page hierarchical ordering
//
// Storage is always the flat parent-pointer form (one Assignment row per
// role/page); the nested PageTreeNode form is materialized only transiently
// for editing and rendering.
//
//   builder     flat rows <-> tree, strict validation of submitted lists
//   editor      single-session working copy with invariant-preserving edits
//   resolution  per-role and per-user navigation trees
//   store       collaborator traits plus the in-memory backend

pub mod builder;
pub mod editor;
pub mod error;
pub mod model;
pub mod resolution;
pub mod store;

pub use builder::{build_tree, flatten, normalize, validate};
pub use editor::{EditOperation, EditorPolicy, EditorState, HierarchyEditor, PersistError};
pub use error::{HierarchyError, Violation};
pub use model::{Assignment, Page, PageOrderEntry, PageTreeNode};
pub use resolution::{merge_trees, ResolutionService, RoleSnapshot};
pub use store::{AssignmentStore, MemoryNavigationStore, PageCatalog, RoleMembership};
