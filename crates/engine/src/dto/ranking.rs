use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Badge {
    pub award_id: Uuid,
    pub award_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RankingRow {
    pub team_id: Uuid,
    pub team_name: String,
    pub total_reward: i64,
    /// 1-based, distinct even when totals tie.
    pub rank: i64,
    pub badges: Vec<Badge>,
    pub grading_score: Option<f64>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct LeaderboardQuery {
    /// Truncate to the first `top` rows; out-of-range values return every team.
    pub top: Option<i64>,
}
