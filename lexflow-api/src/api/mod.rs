//! HTTP API handlers for lexflow-api

pub mod cases;
pub mod dashboard;
pub mod health;
pub mod intake;
pub mod portal;

pub use cases::{get_case, update_case_status};
pub use dashboard::get_dashboard;
pub use health::health_routes;
pub use intake::submit_intake;
pub use portal::get_portal_view;
