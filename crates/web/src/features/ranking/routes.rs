use axum::{Router, routing::get};

use super::handlers::get_leaderboard;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/events/:event_id/leaderboard", get(get_leaderboard))
}
