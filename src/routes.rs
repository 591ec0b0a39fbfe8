use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;
use crate::handlers;

/// Create file host routes
///
/// `/` and `/{*path}` share handlers; the root routes resolve to the served
/// root itself.
pub fn file_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::get_root))
        .route("/", post(handlers::upload_root))
        .route("/", delete(handlers::delete_root))
        .route("/{*path}", get(handlers::get_entry))
        .route("/{*path}", post(handlers::upload_file))
        .route("/{*path}", delete(handlers::delete_file))
}

/// Build the full application: routes, layers and state.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(file_routes())
        // Upload size is enforced by the handler when configured
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
