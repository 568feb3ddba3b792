use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use engine::dto::award::CastVoteRequest;
use engine::dto::reward::GiveRewardRequest;
use engine::error::StorageResult;
use engine::models::{
    AwardVote, CriterionScore, EvaluationCriterion, Participant, RewardGrant, RewardPolicy, Role,
    SpecialAward, Team,
};
use engine::repository::{GrantWrite, VoteWrite};
use engine::{AggregationFacade, EngineError, EventRepository, InMemoryRepository};
use uuid::Uuid;

/// Delegates to the in-memory store but stalls on the reads a service makes
/// before writing, so two concurrent calls both finish reading first.
#[derive(Default)]
struct SlowReads {
    inner: InMemoryRepository,
}

async fn stall() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

#[async_trait]
impl EventRepository for SlowReads {
    async fn list_teams(&self, event_id: Uuid) -> StorageResult<Vec<Team>> {
        self.inner.list_teams(event_id).await
    }

    async fn find_team(&self, event_id: Uuid, team_id: Uuid) -> StorageResult<Option<Team>> {
        self.inner.find_team(event_id, team_id).await
    }

    async fn upsert_team(&self, team: &Team) -> StorageResult<()> {
        self.inner.upsert_team(team).await
    }

    async fn delete_team(&self, event_id: Uuid, team_id: Uuid) -> StorageResult<bool> {
        self.inner.delete_team(event_id, team_id).await
    }

    async fn list_participants(&self, event_id: Uuid) -> StorageResult<Vec<Participant>> {
        self.inner.list_participants(event_id).await
    }

    async fn find_participant(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> StorageResult<Option<Participant>> {
        self.inner.find_participant(event_id, user_id).await
    }

    async fn upsert_participant(&self, participant: &Participant) -> StorageResult<()> {
        self.inner.upsert_participant(participant).await
    }

    async fn find_reward_policy(&self, event_id: Uuid) -> StorageResult<Option<RewardPolicy>> {
        let policy = self.inner.find_reward_policy(event_id).await;
        stall().await;
        policy
    }

    async fn upsert_reward_policy(&self, policy: &RewardPolicy) -> StorageResult<()> {
        self.inner.upsert_reward_policy(policy).await
    }

    async fn list_grants(&self, event_id: Uuid) -> StorageResult<Vec<RewardGrant>> {
        self.inner.list_grants(event_id).await
    }

    async fn list_grants_by_grantor(
        &self,
        event_id: Uuid,
        grantor_id: Uuid,
    ) -> StorageResult<Vec<RewardGrant>> {
        let grants = self.inner.list_grants_by_grantor(event_id, grantor_id).await;
        stall().await;
        grants
    }

    async fn list_grants_by_team(
        &self,
        event_id: Uuid,
        team_id: Uuid,
    ) -> StorageResult<Vec<RewardGrant>> {
        self.inner.list_grants_by_team(event_id, team_id).await
    }

    async fn upsert_grant(
        &self,
        grant: &RewardGrant,
        pool_limit: Option<i64>,
    ) -> StorageResult<GrantWrite> {
        self.inner.upsert_grant(grant, pool_limit).await
    }

    async fn delete_grant(
        &self,
        event_id: Uuid,
        grantor_id: Uuid,
        team_id: Uuid,
    ) -> StorageResult<bool> {
        self.inner.delete_grant(event_id, grantor_id, team_id).await
    }

    async fn list_awards(&self, event_id: Uuid) -> StorageResult<Vec<SpecialAward>> {
        self.inner.list_awards(event_id).await
    }

    async fn find_award(
        &self,
        event_id: Uuid,
        award_id: Uuid,
    ) -> StorageResult<Option<SpecialAward>> {
        self.inner.find_award(event_id, award_id).await
    }

    async fn upsert_award(&self, award: &SpecialAward) -> StorageResult<()> {
        self.inner.upsert_award(award).await
    }

    async fn list_votes(&self, event_id: Uuid) -> StorageResult<Vec<AwardVote>> {
        self.inner.list_votes(event_id).await
    }

    async fn list_votes_for_award(
        &self,
        event_id: Uuid,
        award_id: Uuid,
    ) -> StorageResult<Vec<AwardVote>> {
        self.inner.list_votes_for_award(event_id, award_id).await
    }

    async fn list_votes_by_committee(
        &self,
        event_id: Uuid,
        committee_id: Uuid,
    ) -> StorageResult<Vec<AwardVote>> {
        let votes = self.inner.list_votes_by_committee(event_id, committee_id).await;
        stall().await;
        votes
    }

    async fn upsert_vote(&self, vote: &AwardVote, exclusive: bool) -> StorageResult<VoteWrite> {
        self.inner.upsert_vote(vote, exclusive).await
    }

    async fn delete_vote(
        &self,
        event_id: Uuid,
        committee_id: Uuid,
        award_id: Uuid,
    ) -> StorageResult<bool> {
        self.inner.delete_vote(event_id, committee_id, award_id).await
    }

    async fn list_criteria(&self, event_id: Uuid) -> StorageResult<Vec<EvaluationCriterion>> {
        self.inner.list_criteria(event_id).await
    }

    async fn find_criterion(
        &self,
        event_id: Uuid,
        criterion_id: Uuid,
    ) -> StorageResult<Option<EvaluationCriterion>> {
        self.inner.find_criterion(event_id, criterion_id).await
    }

    async fn upsert_criterion(&self, criterion: &EvaluationCriterion) -> StorageResult<()> {
        self.inner.upsert_criterion(criterion).await
    }

    async fn delete_criterion(&self, event_id: Uuid, criterion_id: Uuid) -> StorageResult<bool> {
        self.inner.delete_criterion(event_id, criterion_id).await
    }

    async fn list_scores(&self, event_id: Uuid) -> StorageResult<Vec<CriterionScore>> {
        self.inner.list_scores(event_id).await
    }

    async fn upsert_score(&self, score: &CriterionScore) -> StorageResult<()> {
        self.inner.upsert_score(score).await
    }

    async fn delete_score(
        &self,
        event_id: Uuid,
        committee_id: Uuid,
        team_id: Uuid,
        criterion_id: Uuid,
    ) -> StorageResult<bool> {
        self.inner
            .delete_score(event_id, committee_id, team_id, criterion_id)
            .await
    }

    async fn count_feedback(&self, event_id: Uuid, author_id: Option<Uuid>) -> StorageResult<u64> {
        self.inner.count_feedback(event_id, author_id).await
    }
}

async fn seed_team(repo: &SlowReads, event_id: Uuid, name: &str) -> Uuid {
    let team = Team {
        team_id: Uuid::new_v4(),
        event_id,
        name: name.to_string(),
        presenter_name: None,
        created_at: Utc::now().naive_utc(),
    };
    repo.upsert_team(&team).await.unwrap();
    team.team_id
}

async fn seed_member(repo: &SlowReads, event_id: Uuid, role: Role) -> Uuid {
    let participant = Participant {
        event_id,
        user_id: Uuid::new_v4(),
        role,
        display_name: "Member".to_string(),
    };
    repo.upsert_participant(&participant).await.unwrap();
    participant.user_id
}

async fn seed_award(repo: &SlowReads, event_id: Uuid, name: &str) -> Uuid {
    let award = SpecialAward {
        award_id: Uuid::new_v4(),
        event_id,
        name: name.to_string(),
        image_url: None,
        created_at: Utc::now().naive_utc(),
    };
    repo.upsert_award(&award).await.unwrap();
    award.award_id
}

#[tokio::test]
async fn test_concurrent_gives_cannot_overdraw_pool() {
    let facade = AggregationFacade::new(SlowReads::default());
    let repo = facade.repository();
    let event_id = Uuid::new_v4();
    let alpha = seed_team(repo, event_id, "Alpha").await;
    let beta = seed_team(repo, event_id, "Beta").await;
    let guest = seed_member(repo, event_id, Role::Guest).await;
    let mut policy = RewardPolicy::unrestricted(event_id);
    policy.vr_pool_guest = Some(100);
    repo.upsert_reward_policy(&policy).await.unwrap();

    let give = |team_id| GiveRewardRequest {
        event_id,
        grantor_id: guest,
        team_id,
        amount: 80.0,
    };
    let (to_alpha, to_beta) = (give(alpha), give(beta));
    let (first, second) = tokio::join!(
        facade.give_reward(&to_alpha),
        facade.give_reward(&to_beta)
    );

    assert_eq!(first.is_ok() as u8 + second.is_ok() as u8, 1);
    let rejected = if first.is_err() { first } else { second };
    assert!(matches!(
        rejected,
        Err(EngineError::PoolExceeded { used: 80, limit: 100, .. })
    ));

    let usage = facade.grantor_usage(event_id, guest).await.unwrap();
    assert_eq!(usage.used, 80);
    assert_eq!(usage.remaining, Some(20));
}

#[tokio::test]
async fn test_concurrent_votes_respect_exclusive_awards() {
    let facade = AggregationFacade::new(SlowReads::default());
    let repo = facade.repository();
    let event_id = Uuid::new_v4();
    let team = seed_team(repo, event_id, "X").await;
    let design = seed_award(repo, event_id, "Design").await;
    let impact = seed_award(repo, event_id, "Impact").await;
    let judge = seed_member(repo, event_id, Role::Committee).await;
    let mut policy = RewardPolicy::unrestricted(event_id);
    policy.exclusive_team_awards = true;
    repo.upsert_reward_policy(&policy).await.unwrap();

    let vote = |award_id| CastVoteRequest {
        event_id,
        committee_id: judge,
        award_id,
        team_id: team,
    };
    let (for_design, for_impact) = (vote(design), vote(impact));
    let (first, second) = tokio::join!(
        facade.cast_vote(&for_design),
        facade.cast_vote(&for_impact)
    );

    assert_eq!(first.is_ok() as u8 + second.is_ok() as u8, 1);
    let rejected = if first.is_err() { first } else { second };
    assert!(matches!(
        rejected,
        Err(EngineError::TeamAlreadyAwarded { team_id, .. }) if team_id == team
    ));
    assert_eq!(repo.list_votes(event_id).await.unwrap().len(), 1);
}
