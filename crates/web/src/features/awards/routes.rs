use axum::{
    Router,
    routing::{get, post},
};

use super::handlers::{cast_vote, clear_vote, get_tally, list_awards, list_tallies};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/votes", post(cast_vote).delete(clear_vote))
        .route("/events/:event_id/awards", get(list_awards))
        .route("/events/:event_id/awards/tallies", get(list_tallies))
        .route("/events/:event_id/awards/:award_id/tally", get(get_tally))
}
