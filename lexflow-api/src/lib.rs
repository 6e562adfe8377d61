//! lexflow-api library - HTTP surface for the intake service
//!
//! Routes:
//! - `POST /intake` classify and store a client submission
//! - `GET /dashboard` aggregate statistics over every stored case
//! - `GET /case/:id`, `POST /case/:id/status` staff case views
//! - `GET /portal/:token` client-safe case view
//! - `GET /health`

use axum::http::{header, Method};
use axum::Router;
use lexflow_common::IntakeService;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod api;
pub mod classifier;
pub mod error;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub service: IntakeService,
}

impl AppState {
    pub fn new(service: IntakeService) -> Self {
        Self { service }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/intake", post(api::submit_intake))
        .route("/dashboard", get(api::get_dashboard))
        .route("/case/:id", get(api::get_case))
        .route("/case/:id/status", post(api::update_case_status))
        .route("/portal/:token", get(api::get_portal_view))
        .merge(api::health_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
