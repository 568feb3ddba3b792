use axum::{
    Router,
    routing::{get, post, put},
};

use super::handlers::{
    create_criterion, delete_criterion, get_grading, list_criteria, purge_orphaned_scores,
    submit_score, update_criterion,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/criteria", post(create_criterion))
        .route("/scores", post(submit_score))
        .route("/events/:event_id/criteria", get(list_criteria))
        .route(
            "/events/:event_id/criteria/purge-orphans",
            post(purge_orphaned_scores),
        )
        .route(
            "/events/:event_id/criteria/:criterion_id",
            put(update_criterion).delete(delete_criterion),
        )
        .route("/events/:event_id/grading", get(get_grading))
}
