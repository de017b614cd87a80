use crate::handlers::{callback_handler, index_handler};
use crate::models::AppState;
use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

pub fn app_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/oauth/redirect", get(callback_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
