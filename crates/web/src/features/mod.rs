use axum::Router;

use crate::state::AppState;

pub mod awards;
pub mod dashboard;
pub mod grading;
pub mod ranking;
pub mod rewards;
pub mod teams;

/// Every API route, relative to `/api`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(rewards::routes::routes())
        .merge(awards::routes::routes())
        .merge(grading::routes::routes())
        .merge(teams::routes::routes())
        .merge(ranking::routes::routes())
        .merge(dashboard::routes::routes())
}
