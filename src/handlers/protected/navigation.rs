use axum::extract::{Extension, Path};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::navigation::PageTreeNode;
use crate::types::UserId;

/// GET /api/users/:user_id/navigation - merged navigation tree over the user's roles
pub async fn user_get(
    Path(user_id): Path<UserId>,
    Extension(state): Extension<AppState>,
) -> ApiResult<Vec<PageTreeNode>> {
    let tree = state.resolution.resolve_for_user(user_id).await?;
    Ok(ApiResponse::success(tree))
}

/// GET /api/navigation - navigation tree for the authenticated user (sidebar)
pub async fn me_get(
    Extension(state): Extension<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Vec<PageTreeNode>> {
    tracing::debug!("Resolving navigation for {}", auth_user.name);
    let tree = state.resolution.resolve_for_user(auth_user.user_id).await?;
    Ok(ApiResponse::success(tree))
}
