use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config;
use crate::database::{DatabaseError, PgNavigationStore};
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::navigation::{EditorPolicy, MemoryNavigationStore, ResolutionService};

/// Shared handler dependencies, injected as an axum `Extension`
#[derive(Clone)]
pub struct AppState {
    pub resolution: ResolutionService,
    pub policy: EditorPolicy,
}

impl AppState {
    pub fn new(resolution: ResolutionService, policy: EditorPolicy) -> Self {
        Self { resolution, policy }
    }

    /// Everything served from one in-process store
    pub fn in_memory(store: MemoryNavigationStore, policy: EditorPolicy) -> Self {
        let shared = Arc::new(store);
        Self::new(ResolutionService::new(shared.clone(), shared.clone(), shared), policy)
    }

    pub async fn postgres(policy: EditorPolicy) -> Result<Self, DatabaseError> {
        let shared = Arc::new(PgNavigationStore::connect().await?);
        Ok(Self::new(ResolutionService::new(shared.clone(), shared.clone(), shared), policy))
    }
}

pub fn router(state: AppState) -> Router {
    let router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        // Role page assignment and ordering
        .merge(role_routes())
        // Navigation resolution
        .merge(navigation_routes())
        // Global middleware
        .layer(axum::Extension(state))
        .layer(DefaultBodyLimit::max(config::config().api.max_request_size_bytes))
        .layer(cors_layer());

    if config::config().api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn role_routes() -> Router {
    use protected::roles;

    Router::new()
        .route(
            "/api/roles/:role_id/pages",
            get(roles::page_order_get).put(roles::page_order_put),
        )
        .route("/api/roles/:role_id/pages/edit", post(roles::page_order_edit))
        .route("/api/roles/:role_id/tree", get(roles::tree_get))
}

fn navigation_routes() -> Router {
    use protected::navigation;

    Router::new()
        .route("/api/users/:user_id/navigation", get(navigation::user_get))
        .route(
            "/api/navigation",
            get(navigation::me_get).route_layer(middleware::from_fn(jwt_auth_middleware)),
        )
}

fn cors_layer() -> CorsLayer {
    let security = &config::config().security;
    if !security.enable_cors {
        return CorsLayer::new();
    }

    let origins: Vec<_> = security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
