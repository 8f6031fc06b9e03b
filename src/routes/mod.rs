use axum::Router;

use crate::state::AppState;

pub mod chatbot;
pub mod doc;
pub mod health;
pub mod me;
pub mod mechanics;
pub mod params;
pub mod reviews;
pub mod service_requests;
pub mod workshops;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/me", me::router())
        .nest("/workshops", workshops::router())
        .nest("/service-requests", service_requests::router())
        .nest("/reviews", reviews::router())
        .nest("/mechanics", mechanics::router())
        .nest("/chatbot", chatbot::router())
}
