use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use super::{AppState, download, upload};

/// All routes of the service. `get` routes also answer `HEAD`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/download", get(download))
        .route("/range-download", get(download))
        // The upload handler enforces its own ceiling while streaming.
        .route("/upload", post(upload).layer(DefaultBodyLimit::disable()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
