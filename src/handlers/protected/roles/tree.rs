use axum::extract::{Extension, Path};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::navigation::PageTreeNode;
use crate::types::RoleId;

/// GET /api/roles/:role_id/tree - rendered navigation tree of one role
pub async fn get(
    Path(role_id): Path<RoleId>,
    Extension(state): Extension<AppState>,
) -> ApiResult<Vec<PageTreeNode>> {
    let tree = state.resolution.resolve_for_role(role_id).await?;
    Ok(ApiResponse::success(tree))
}
