pub mod award_board;
pub mod criteria_registry;
pub mod facade;
pub mod grading;
pub mod ranking;
pub mod reward_ledger;

use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::models::{Participant, Role, Team};
use crate::repository::EventRepository;

pub use award_board::AwardBoard;
pub use criteria_registry::CriteriaRegistry;
pub use facade::AggregationFacade;
pub use grading::GradingAggregator;
pub use ranking::RankingEngine;
pub use reward_ledger::RewardLedger;

async fn require_team<R>(repo: &R, event_id: Uuid, team_id: Uuid) -> Result<Team>
where
    R: EventRepository + ?Sized,
{
    repo.find_team(event_id, team_id)
        .await?
        .ok_or(EngineError::TeamNotFound(team_id))
}

/// Looks up a participant allowed to grant rewards; `committee_only` narrows it to judges.
async fn require_grantor<R>(
    repo: &R,
    event_id: Uuid,
    user_id: Uuid,
    committee_only: bool,
) -> Result<Participant>
where
    R: EventRepository + ?Sized,
{
    match repo.find_participant(event_id, user_id).await? {
        Some(p) if committee_only && p.role == Role::Committee => Ok(p),
        Some(p) if !committee_only && p.role.is_grantor() => Ok(p),
        _ => Err(EngineError::GrantorNotFound(user_id)),
    }
}
