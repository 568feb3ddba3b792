use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::dto::award::{AwardSummary, CastVoteRequest, ClearVoteRequest, VoteTally};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/votes",
    request_body = CastVoteRequest,
    responses(
        (status = 200, description = "Vote recorded; returns the award's updated tally", body = VoteTally),
        (status = 404, description = "Unknown award, team or committee member"),
        (status = 409, description = "Team already chosen by this member for another award")
    ),
    tag = "awards"
)]
pub async fn cast_vote(
    State(facade): State<AppState>,
    Json(request): Json<CastVoteRequest>,
) -> ApiResult<Json<VoteTally>> {
    Ok(Json(facade.cast_vote(&request).await?))
}

#[utoipa::path(
    delete,
    path = "/api/votes",
    request_body = ClearVoteRequest,
    responses(
        (status = 204, description = "Vote withdrawn, or there was none")
    ),
    tag = "awards"
)]
pub async fn clear_vote(
    State(facade): State<AppState>,
    Json(request): Json<ClearVoteRequest>,
) -> ApiResult<StatusCode> {
    facade.clear_vote(&request).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/awards",
    params(
        ("event_id" = Uuid, Path, description = "Event id")
    ),
    responses(
        (status = 200, description = "Awards with vote and team counts", body = Vec<AwardSummary>)
    ),
    tag = "awards"
)]
pub async fn list_awards(
    State(facade): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> ApiResult<Json<Vec<AwardSummary>>> {
    Ok(Json(facade.award_summary(event_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/awards/tallies",
    params(
        ("event_id" = Uuid, Path, description = "Event id")
    ),
    responses(
        (status = 200, description = "Tally of every award", body = Vec<VoteTally>)
    ),
    tag = "awards"
)]
pub async fn list_tallies(
    State(facade): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> ApiResult<Json<Vec<VoteTally>>> {
    Ok(Json(facade.award_tallies(event_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/awards/{award_id}/tally",
    params(
        ("event_id" = Uuid, Path, description = "Event id"),
        ("award_id" = Uuid, Path, description = "Special award id")
    ),
    responses(
        (status = 200, description = "Votes per team and the winner, if any", body = VoteTally),
        (status = 404, description = "Award not found")
    ),
    tag = "awards"
)]
pub async fn get_tally(
    State(facade): State<AppState>,
    Path((event_id, award_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<VoteTally>> {
    Ok(Json(facade.award_tally(event_id, award_id).await?))
}
