use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use taskd_core::repository::SqliteRepository;

use crate::auth;
use crate::config::Config;
use crate::http;

/// Central shared state, passed as `Arc<AppState>` to all handlers.
pub struct AppState {
    pub config: Config,
    pub repo: SqliteRepository,
}

/// Assemble the full axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    // Task routes sit behind the bearer-token check; sign-in and the direct
    // next-date query stay public.
    let protected = Router::new()
        .route(
            "/api/task",
            post(http::tasks::add_task)
                .get(http::tasks::get_task)
                .put(http::tasks::update_task)
                .delete(http::tasks::delete_task),
        )
        .route("/api/tasks", get(http::tasks::list_tasks))
        .route("/api/task/done", post(http::tasks::complete_task))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/health", get(http::health::health))
        .route("/api/nextdate", get(http::nextdate::next_date))
        .route("/api/signin", post(http::signin::sign_in))
        .merge(protected)
        .fallback_service(ServeDir::new(&state.config.web_dir))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
