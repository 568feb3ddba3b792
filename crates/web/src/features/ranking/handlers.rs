use axum::{
    Json,
    extract::{Path, Query, State},
};
use engine::dto::ranking::{LeaderboardQuery, RankingRow};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/leaderboard",
    params(
        ("event_id" = Uuid, Path, description = "Event id"),
        LeaderboardQuery
    ),
    responses(
        (status = 200, description = "Teams ranked by virtual reward total", body = Vec<RankingRow>)
    ),
    tag = "rankings"
)]
pub async fn get_leaderboard(
    State(facade): State<AppState>,
    Path(event_id): Path<Uuid>,
    Query(query): Query<LeaderboardQuery>,
) -> ApiResult<Json<Vec<RankingRow>>> {
    Ok(Json(facade.leaderboard(event_id, query.top).await?))
}
