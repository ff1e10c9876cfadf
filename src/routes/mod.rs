// Route definitions

use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::{config::Settings, session::SearchSession};

mod api;

// Shared state handed to every handler
#[derive(Clone, FromRef)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub session: Arc<SearchSession>,
}

pub fn create_router(app_state: AppState) -> Router {
    let api_router = Router::new()
        .route("/session", get(api::get_session).delete(api::reset_session))
        .route("/submit", post(api::submit))
        .route("/load-more", post(api::load_more));

    Router::new()
        .route("/health", get(api::health))
        .nest("/api", api_router)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}
