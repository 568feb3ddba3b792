use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use engine::dto::grading::{
    CreateCriterionRequest, GradingReport, SubmitScoreRequest, UpdateCriterionRequest,
};
use engine::models::{CriterionScore, EvaluationCriterion};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct PurgeResponse {
    pub removed: u64,
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/criteria",
    params(
        ("event_id" = Uuid, Path, description = "Event id")
    ),
    responses(
        (status = 200, description = "Criteria in display order", body = Vec<EvaluationCriterion>)
    ),
    tag = "grading"
)]
pub async fn list_criteria(
    State(facade): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> ApiResult<Json<Vec<EvaluationCriterion>>> {
    Ok(Json(facade.list_criteria(event_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/criteria",
    request_body = CreateCriterionRequest,
    responses(
        (status = 201, description = "Criterion created", body = EvaluationCriterion),
        (status = 400, description = "Invalid name, max score or weight")
    ),
    tag = "grading"
)]
pub async fn create_criterion(
    State(facade): State<AppState>,
    Json(request): Json<CreateCriterionRequest>,
) -> ApiResult<Response> {
    let criterion = facade.add_criterion(&request).await?;

    Ok((StatusCode::CREATED, Json(criterion)).into_response())
}

#[utoipa::path(
    put,
    path = "/api/events/{event_id}/criteria/{criterion_id}",
    params(
        ("event_id" = Uuid, Path, description = "Event id"),
        ("criterion_id" = Uuid, Path, description = "Criterion id")
    ),
    request_body = UpdateCriterionRequest,
    responses(
        (status = 200, description = "Criterion updated", body = EvaluationCriterion),
        (status = 400, description = "Invalid name, max score or weight"),
        (status = 404, description = "Criterion not found")
    ),
    tag = "grading"
)]
pub async fn update_criterion(
    State(facade): State<AppState>,
    Path((event_id, criterion_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateCriterionRequest>,
) -> ApiResult<Json<EvaluationCriterion>> {
    Ok(Json(
        facade
            .update_criterion(event_id, criterion_id, &request)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/events/{event_id}/criteria/{criterion_id}",
    params(
        ("event_id" = Uuid, Path, description = "Event id"),
        ("criterion_id" = Uuid, Path, description = "Criterion id")
    ),
    responses(
        (status = 204, description = "Criterion removed; its scores stay until purged"),
        (status = 404, description = "Criterion not found")
    ),
    tag = "grading"
)]
pub async fn delete_criterion(
    State(facade): State<AppState>,
    Path((event_id, criterion_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    facade.remove_criterion(event_id, criterion_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/events/{event_id}/criteria/purge-orphans",
    params(
        ("event_id" = Uuid, Path, description = "Event id")
    ),
    responses(
        (status = 200, description = "Scores of removed criteria deleted", body = PurgeResponse)
    ),
    tag = "grading"
)]
pub async fn purge_orphaned_scores(
    State(facade): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> ApiResult<Json<PurgeResponse>> {
    let removed = facade.purge_orphaned_scores(event_id).await?;
    Ok(Json(PurgeResponse { removed }))
}

#[utoipa::path(
    post,
    path = "/api/scores",
    request_body = SubmitScoreRequest,
    responses(
        (status = 200, description = "Score stored, replacing the member's earlier value", body = CriterionScore),
        (status = 404, description = "Unknown criterion, team or committee member"),
        (status = 422, description = "Value outside 0..=max_score")
    ),
    tag = "grading"
)]
pub async fn submit_score(
    State(facade): State<AppState>,
    Json(request): Json<SubmitScoreRequest>,
) -> ApiResult<Json<CriterionScore>> {
    Ok(Json(facade.submit_score(&request).await?))
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/grading",
    params(
        ("event_id" = Uuid, Path, description = "Event id")
    ),
    responses(
        (status = 200, description = "Weighted grading table", body = GradingReport)
    ),
    tag = "grading"
)]
pub async fn get_grading(
    State(facade): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> ApiResult<Json<GradingReport>> {
    Ok(Json(facade.grading_table(event_id).await?))
}
