use axum::{
    Json,
    extract::{Path, State},
};
use engine::dto::reward::{GiveRewardRequest, GrantorUsage, ResetRewardRequest, RewardResult};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/rewards",
    request_body = GiveRewardRequest,
    responses(
        (status = 200, description = "Reward set, replacing any earlier amount", body = RewardResult),
        (status = 404, description = "Unknown team or grantor"),
        (status = 409, description = "Team cap or reward pool exceeded"),
        (status = 422, description = "Amount is not a non-negative whole number")
    ),
    tag = "rewards"
)]
pub async fn give_reward(
    State(facade): State<AppState>,
    Json(request): Json<GiveRewardRequest>,
) -> ApiResult<Json<RewardResult>> {
    Ok(Json(facade.give_reward(&request).await?))
}

#[utoipa::path(
    post,
    path = "/api/rewards/reset",
    request_body = ResetRewardRequest,
    responses(
        (status = 200, description = "Reward removed; repeating the call is a no-op", body = RewardResult),
        (status = 404, description = "Unknown team or grantor")
    ),
    tag = "rewards"
)]
pub async fn reset_reward(
    State(facade): State<AppState>,
    Json(request): Json<ResetRewardRequest>,
) -> ApiResult<Json<RewardResult>> {
    Ok(Json(facade.reset_reward(&request).await?))
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/teams/{team_id}/reward",
    params(
        ("event_id" = Uuid, Path, description = "Event id"),
        ("team_id" = Uuid, Path, description = "Team id")
    ),
    responses(
        (status = 200, description = "Team reward total", body = i64),
        (status = 404, description = "Team not found")
    ),
    tag = "rewards"
)]
pub async fn get_team_total(
    State(facade): State<AppState>,
    Path((event_id, team_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<i64>> {
    Ok(Json(facade.team_total(event_id, team_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/grantors/{user_id}/usage",
    params(
        ("event_id" = Uuid, Path, description = "Event id"),
        ("user_id" = Uuid, Path, description = "Guest or committee member id")
    ),
    responses(
        (status = 200, description = "Reward pool usage", body = GrantorUsage),
        (status = 404, description = "Grantor not found")
    ),
    tag = "rewards"
)]
pub async fn get_grantor_usage(
    State(facade): State<AppState>,
    Path((event_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<GrantorUsage>> {
    Ok(Json(facade.grantor_usage(event_id, user_id).await?))
}
