use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::AppState;

#[utoipa::path(
    delete,
    path = "/api/events/{event_id}/teams/{team_id}",
    params(
        ("event_id" = Uuid, Path, description = "Event id"),
        ("team_id" = Uuid, Path, description = "Team id")
    ),
    responses(
        (status = 204, description = "Team deleted with its rewards, votes and scores"),
        (status = 404, description = "Team not found")
    ),
    tag = "teams"
)]
pub async fn delete_team(
    State(facade): State<AppState>,
    Path((event_id, team_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    facade.remove_team(event_id, team_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
