use axum::{Router, routing::get};

use super::handlers::{committee_dashboard, grantor_dashboard, organizer_dashboard};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events/:event_id/dashboard/organizer", get(organizer_dashboard))
        .route(
            "/events/:event_id/dashboard/grantors/:user_id",
            get(grantor_dashboard),
        )
        .route(
            "/events/:event_id/dashboard/committee/:user_id",
            get(committee_dashboard),
        )
}
