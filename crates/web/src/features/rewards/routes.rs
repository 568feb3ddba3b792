use axum::{
    Router,
    routing::{get, post},
};

use super::handlers::{get_grantor_usage, get_team_total, give_reward, reset_reward};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rewards", post(give_reward))
        .route("/rewards/reset", post(reset_reward))
        .route("/events/:event_id/teams/:team_id/reward", get(get_team_total))
        .route("/events/:event_id/grantors/:user_id/usage", get(get_grantor_usage))
}
