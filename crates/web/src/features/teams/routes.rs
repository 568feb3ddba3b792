use axum::{Router, routing::delete};

use super::handlers::delete_team;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/events/:event_id/teams/:team_id", delete(delete_team))
}
