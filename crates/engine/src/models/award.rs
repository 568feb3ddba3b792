use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SpecialAward {
    pub award_id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
    pub created_at: NaiveDateTime,
}

/// A committee member's pick for one special award. Unique per `(event_id, committee_id, award_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AwardVote {
    pub event_id: Uuid,
    pub committee_id: Uuid,
    pub award_id: Uuid,
    pub team_id: Uuid,
    pub updated_at: NaiveDateTime,
}
