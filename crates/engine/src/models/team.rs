use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Team {
    pub team_id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub presenter_name: Option<String>,
    pub created_at: NaiveDateTime,
}
