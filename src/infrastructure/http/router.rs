use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::infrastructure::http::controllers::auth;
use crate::infrastructure::http::middleware::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/auth/:provider/login", get(auth::login))
        .route("/auth/:provider/callback", get(auth::callback))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/session", get(auth::session))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
