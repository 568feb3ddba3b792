use axum::{
    Json,
    extract::{Path, State},
};
use engine::dto::dashboard::{CommitteeDashboard, GrantorDashboard, OrganizerDashboard};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/dashboard/organizer",
    params(
        ("event_id" = Uuid, Path, description = "Event id")
    ),
    responses(
        (status = 200, description = "Event-wide counters", body = OrganizerDashboard)
    ),
    tag = "dashboards"
)]
pub async fn organizer_dashboard(
    State(facade): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> ApiResult<Json<OrganizerDashboard>> {
    Ok(Json(facade.organizer_dashboard(event_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/dashboard/grantors/{user_id}",
    params(
        ("event_id" = Uuid, Path, description = "Event id"),
        ("user_id" = Uuid, Path, description = "Guest or committee member id")
    ),
    responses(
        (status = 200, description = "Reward usage and grants of one grantor", body = GrantorDashboard),
        (status = 404, description = "Grantor not found")
    ),
    tag = "dashboards"
)]
pub async fn grantor_dashboard(
    State(facade): State<AppState>,
    Path((event_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<GrantorDashboard>> {
    Ok(Json(facade.grantor_dashboard(event_id, user_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/dashboard/committee/{user_id}",
    params(
        ("event_id" = Uuid, Path, description = "Event id"),
        ("user_id" = Uuid, Path, description = "Committee member id")
    ),
    responses(
        (status = 200, description = "Rewards, votes and feedback of one committee member", body = CommitteeDashboard),
        (status = 404, description = "Committee member not found")
    ),
    tag = "dashboards"
)]
pub async fn committee_dashboard(
    State(facade): State<AppState>,
    Path((event_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<CommitteeDashboard>> {
    Ok(Json(facade.committee_dashboard(event_id, user_id).await?))
}
