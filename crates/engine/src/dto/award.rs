use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CastVoteRequest {
    pub event_id: Uuid,
    pub committee_id: Uuid,
    pub award_id: Uuid,
    pub team_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClearVoteRequest {
    pub event_id: Uuid,
    pub committee_id: Uuid,
    pub award_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VoteTally {
    pub award_id: Uuid,
    pub per_team_votes: BTreeMap<Uuid, u32>,
    /// `None` when nobody voted or the top count is shared.
    pub winner: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AwardSummary {
    pub award_id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
    pub vote_count: u32,
    pub team_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CommitteeVote {
    pub award_id: Uuid,
    pub team_id: Uuid,
}
