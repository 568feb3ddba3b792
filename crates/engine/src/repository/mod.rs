//! Narrow storage boundary used by every engine component.
//!
//! Implementations must make each upsert/delete atomic on its unique key; the
//! engine relies on that for "replace, not add" semantics under concurrency.
//! Rules that span several rows (grantor pools, exclusive award picks) are
//! checked inside `upsert_grant` and `upsert_vote` so the check and the write
//! cannot interleave with another caller.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StorageResult;
use crate::models::{
    AwardVote, CriterionScore, EvaluationCriterion, Participant, RewardGrant, RewardPolicy,
    SpecialAward, Team,
};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PgRepository;

/// Result of a grant write checked against the grantor's pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantWrite {
    Written,
    /// Nothing was written; `used_elsewhere` is what the grantor holds on other teams.
    PoolExceeded { used_elsewhere: i64, limit: i64 },
}

/// Result of a vote write checked against the exclusive-award rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteWrite {
    Written,
    /// Nothing was written; the member already gave the team `award_id`.
    TeamAlreadyAwarded { award_id: Uuid },
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Teams of an event ordered by creation time.
    async fn list_teams(&self, event_id: Uuid) -> StorageResult<Vec<Team>>;
    async fn find_team(&self, event_id: Uuid, team_id: Uuid) -> StorageResult<Option<Team>>;
    async fn upsert_team(&self, team: &Team) -> StorageResult<()>;
    /// Deletes the team together with its grants, votes and scores.
    async fn delete_team(&self, event_id: Uuid, team_id: Uuid) -> StorageResult<bool>;

    async fn list_participants(&self, event_id: Uuid) -> StorageResult<Vec<Participant>>;
    async fn find_participant(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> StorageResult<Option<Participant>>;
    async fn upsert_participant(&self, participant: &Participant) -> StorageResult<()>;

    async fn find_reward_policy(&self, event_id: Uuid) -> StorageResult<Option<RewardPolicy>>;
    async fn upsert_reward_policy(&self, policy: &RewardPolicy) -> StorageResult<()>;

    async fn list_grants(&self, event_id: Uuid) -> StorageResult<Vec<RewardGrant>>;
    async fn list_grants_by_grantor(
        &self,
        event_id: Uuid,
        grantor_id: Uuid,
    ) -> StorageResult<Vec<RewardGrant>>;
    async fn list_grants_by_team(
        &self,
        event_id: Uuid,
        team_id: Uuid,
    ) -> StorageResult<Vec<RewardGrant>>;
    /// Upserts the grant unless the grantor's grants on other teams plus the
    /// new amount would exceed `pool_limit`. Check and write are one step.
    async fn upsert_grant(
        &self,
        grant: &RewardGrant,
        pool_limit: Option<i64>,
    ) -> StorageResult<GrantWrite>;
    async fn delete_grant(
        &self,
        event_id: Uuid,
        grantor_id: Uuid,
        team_id: Uuid,
    ) -> StorageResult<bool>;

    /// Awards of an event ordered by creation time.
    async fn list_awards(&self, event_id: Uuid) -> StorageResult<Vec<SpecialAward>>;
    async fn find_award(&self, event_id: Uuid, award_id: Uuid)
    -> StorageResult<Option<SpecialAward>>;
    async fn upsert_award(&self, award: &SpecialAward) -> StorageResult<()>;

    async fn list_votes(&self, event_id: Uuid) -> StorageResult<Vec<AwardVote>>;
    async fn list_votes_for_award(
        &self,
        event_id: Uuid,
        award_id: Uuid,
    ) -> StorageResult<Vec<AwardVote>>;
    async fn list_votes_by_committee(
        &self,
        event_id: Uuid,
        committee_id: Uuid,
    ) -> StorageResult<Vec<AwardVote>>;
    /// Upserts the vote. With `exclusive` set, refuses when the member already
    /// picked the same team for a different award. Check and write are one step.
    async fn upsert_vote(&self, vote: &AwardVote, exclusive: bool) -> StorageResult<VoteWrite>;
    async fn delete_vote(
        &self,
        event_id: Uuid,
        committee_id: Uuid,
        award_id: Uuid,
    ) -> StorageResult<bool>;

    /// Criteria of an event ordered by `sort_order`, then name.
    async fn list_criteria(&self, event_id: Uuid) -> StorageResult<Vec<EvaluationCriterion>>;
    async fn find_criterion(
        &self,
        event_id: Uuid,
        criterion_id: Uuid,
    ) -> StorageResult<Option<EvaluationCriterion>>;
    async fn upsert_criterion(&self, criterion: &EvaluationCriterion) -> StorageResult<()>;
    /// Leaves scores that reference the criterion in place.
    async fn delete_criterion(&self, event_id: Uuid, criterion_id: Uuid) -> StorageResult<bool>;

    async fn list_scores(&self, event_id: Uuid) -> StorageResult<Vec<CriterionScore>>;
    async fn upsert_score(&self, score: &CriterionScore) -> StorageResult<()>;
    async fn delete_score(
        &self,
        event_id: Uuid,
        committee_id: Uuid,
        team_id: Uuid,
        criterion_id: Uuid,
    ) -> StorageResult<bool>;

    /// Feedback rows written by the comment service, optionally restricted to one author.
    async fn count_feedback(&self, event_id: Uuid, author_id: Option<Uuid>) -> StorageResult<u64>;
}
