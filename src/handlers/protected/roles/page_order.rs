use std::collections::HashSet;

use axum::{
    extract::{Extension, Path},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::navigation::{
    normalize, validate, EditOperation, EditorState, HierarchyEditor, PageOrderEntry, PageTreeNode,
};
use crate::types::RoleId;

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub operations: Vec<EditOperation>,
}

#[derive(Debug, Serialize)]
pub struct EditResponse {
    pub state: EditorState,
    pub pages: Vec<PageOrderEntry>,
    pub tree: Vec<PageTreeNode>,
}

/// GET /api/roles/:role_id/pages - normalized page order of a role
///
/// Rows left dangling by upstream deletions are healed on the way out, so the
/// response always satisfies the same invariants the save endpoint enforces.
pub async fn get(
    Path(role_id): Path<RoleId>,
    Extension(state): Extension<AppState>,
) -> ApiResult<Vec<PageOrderEntry>> {
    let snapshot = state.resolution.role_snapshot(role_id).await?;
    let rows = normalize(role_id, &snapshot.assignments, &snapshot.pages);
    Ok(ApiResponse::success(rows.iter().map(|a| a.to_entry()).collect()))
}

/// PUT /api/roles/:role_id/pages - replace a role's page order
///
/// Strict: any duplicate, unknown page, self-parent, unassigned parent or
/// cycle rejects the whole list. Gaps and ties in display order are
/// normalized before the atomic replace.
pub async fn put(
    Path(role_id): Path<RoleId>,
    Extension(state): Extension<AppState>,
    Json(entries): Json<Vec<PageOrderEntry>>,
) -> ApiResult<Vec<PageOrderEntry>> {
    let pages = state
        .resolution
        .known_pages(entries.iter().map(|e| e.page_id))
        .await?;
    let catalog: HashSet<_> = pages.iter().map(|p| p.id).collect();

    let violations = validate(&entries, &catalog);
    if !violations.is_empty() {
        tracing::debug!("Rejected page order for role {}: {} violation(s)", role_id, violations.len());
        return Err(ApiError::from_violations(&violations));
    }

    let rows: Vec<_> = entries.into_iter().map(|e| e.into_assignment(role_id)).collect();
    let rows = normalize(role_id, &rows, &pages);
    state.resolution.store().replace_for_role(role_id, &rows).await?;

    Ok(ApiResponse::success(rows.iter().map(|a| a.to_entry()).collect()))
}

/// POST /api/roles/:role_id/pages/edit - apply an operation batch and persist
///
/// Operations run in order against one editing session loaded from the
/// persisted rows. The first failing operation rejects the batch and nothing
/// is written.
pub async fn edit(
    Path(role_id): Path<RoleId>,
    Extension(state): Extension<AppState>,
    Json(request): Json<EditRequest>,
) -> ApiResult<EditResponse> {
    if request.operations.is_empty() {
        return Err(ApiError::bad_request("operations must not be empty"));
    }

    let snapshot = state.resolution.role_snapshot(role_id).await?;
    let mut editor = HierarchyEditor::new(role_id, snapshot.pages, state.policy);
    editor.load(&snapshot.assignments);

    for op in request.operations {
        editor.apply(op)?;
    }
    let rows = editor.persist(state.resolution.store()).await?;

    Ok(ApiResponse::success(EditResponse {
        state: editor.state(),
        pages: rows.iter().map(|a| a.to_entry()).collect(),
        tree: editor.working_tree(),
    }))
}
