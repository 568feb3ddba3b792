use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::reward::GrantSummary;
use crate::models::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GrantorDashboard {
    pub user_id: Uuid,
    pub role: Role,
    pub used: i64,
    pub limit: Option<i64>,
    pub remaining: Option<i64>,
    pub team_cap: Option<i64>,
    pub teams_rewarded: u32,
    pub grants: Vec<GrantSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CommitteeDashboard {
    pub reward: GrantorDashboard,
    pub votes_given: u32,
    pub votes_total: u32,
    pub feedback_given: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrganizerDashboard {
    pub event_id: Uuid,
    pub team_count: u32,
    pub award_count: u32,
    pub total_reward: i64,
    pub total_weight: f64,
    pub criteria_balanced: bool,
    pub feedback_total: u64,
}
