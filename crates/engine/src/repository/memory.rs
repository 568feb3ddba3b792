use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{EventRepository, GrantWrite, VoteWrite};
use crate::error::StorageResult;
use crate::models::{
    AwardVote, CriterionScore, EvaluationCriterion, Participant, RewardGrant, RewardPolicy,
    SpecialAward, Team,
};

type GrantKey = (Uuid, Uuid, Uuid);
type VoteKey = (Uuid, Uuid, Uuid);
type ScoreKey = (Uuid, Uuid, Uuid);

#[derive(Default)]
struct State {
    teams: HashMap<Uuid, Team>,
    participants: HashMap<(Uuid, Uuid), Participant>,
    policies: HashMap<Uuid, RewardPolicy>,
    grants: HashMap<GrantKey, RewardGrant>,
    awards: HashMap<Uuid, SpecialAward>,
    votes: HashMap<VoteKey, AwardVote>,
    criteria: HashMap<Uuid, EvaluationCriterion>,
    scores: HashMap<ScoreKey, CriterionScore>,
    feedback: Vec<(Uuid, Uuid)>,
}

/// Map-backed store used by tests and dry runs.
///
/// Every write takes the lock once, so an upsert is atomic with respect to
/// concurrent callers in the same process.
#[derive(Default)]
pub struct InMemoryRepository {
    state: RwLock<State>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one feedback entry; stands in for the external comment service.
    pub async fn record_feedback(&self, event_id: Uuid, author_id: Uuid) {
        self.state.write().await.feedback.push((event_id, author_id));
    }
}

#[async_trait]
impl EventRepository for InMemoryRepository {
    async fn list_teams(&self, event_id: Uuid) -> StorageResult<Vec<Team>> {
        let state = self.state.read().await;
        let mut teams: Vec<Team> = state
            .teams
            .values()
            .filter(|t| t.event_id == event_id)
            .cloned()
            .collect();
        teams.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.team_id.cmp(&b.team_id))
        });
        Ok(teams)
    }

    async fn find_team(&self, event_id: Uuid, team_id: Uuid) -> StorageResult<Option<Team>> {
        let state = self.state.read().await;
        Ok(state
            .teams
            .get(&team_id)
            .filter(|t| t.event_id == event_id)
            .cloned())
    }

    async fn upsert_team(&self, team: &Team) -> StorageResult<()> {
        self.state
            .write()
            .await
            .teams
            .insert(team.team_id, team.clone());
        Ok(())
    }

    async fn delete_team(&self, event_id: Uuid, team_id: Uuid) -> StorageResult<bool> {
        let mut state = self.state.write().await;
        let owned = state
            .teams
            .get(&team_id)
            .is_some_and(|t| t.event_id == event_id);
        if !owned {
            return Ok(false);
        }
        state.teams.remove(&team_id);
        state.grants.retain(|_, g| g.team_id != team_id);
        state.votes.retain(|_, v| v.team_id != team_id);
        state.scores.retain(|_, s| s.team_id != team_id);
        Ok(true)
    }

    async fn list_participants(&self, event_id: Uuid) -> StorageResult<Vec<Participant>> {
        let state = self.state.read().await;
        Ok(state
            .participants
            .values()
            .filter(|p| p.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn find_participant(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> StorageResult<Option<Participant>> {
        let state = self.state.read().await;
        Ok(state.participants.get(&(event_id, user_id)).cloned())
    }

    async fn upsert_participant(&self, participant: &Participant) -> StorageResult<()> {
        self.state.write().await.participants.insert(
            (participant.event_id, participant.user_id),
            participant.clone(),
        );
        Ok(())
    }

    async fn find_reward_policy(&self, event_id: Uuid) -> StorageResult<Option<RewardPolicy>> {
        Ok(self.state.read().await.policies.get(&event_id).cloned())
    }

    async fn upsert_reward_policy(&self, policy: &RewardPolicy) -> StorageResult<()> {
        self.state
            .write()
            .await
            .policies
            .insert(policy.event_id, policy.clone());
        Ok(())
    }

    async fn list_grants(&self, event_id: Uuid) -> StorageResult<Vec<RewardGrant>> {
        let state = self.state.read().await;
        Ok(state
            .grants
            .values()
            .filter(|g| g.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn list_grants_by_grantor(
        &self,
        event_id: Uuid,
        grantor_id: Uuid,
    ) -> StorageResult<Vec<RewardGrant>> {
        let state = self.state.read().await;
        Ok(state
            .grants
            .values()
            .filter(|g| g.event_id == event_id && g.grantor_id == grantor_id)
            .cloned()
            .collect())
    }

    async fn list_grants_by_team(
        &self,
        event_id: Uuid,
        team_id: Uuid,
    ) -> StorageResult<Vec<RewardGrant>> {
        let state = self.state.read().await;
        Ok(state
            .grants
            .values()
            .filter(|g| g.event_id == event_id && g.team_id == team_id)
            .cloned()
            .collect())
    }

    async fn upsert_grant(
        &self,
        grant: &RewardGrant,
        pool_limit: Option<i64>,
    ) -> StorageResult<GrantWrite> {
        let mut state = self.state.write().await;

        if let Some(limit) = pool_limit {
            let used_elsewhere = state
                .grants
                .values()
                .filter(|g| {
                    g.event_id == grant.event_id
                        && g.grantor_id == grant.grantor_id
                        && g.team_id != grant.team_id
                })
                .fold(0i64, |acc, g| acc.saturating_add(g.amount));

            if used_elsewhere.saturating_add(grant.amount) > limit {
                return Ok(GrantWrite::PoolExceeded {
                    used_elsewhere,
                    limit,
                });
            }
        }

        state.grants.insert(
            (grant.event_id, grant.grantor_id, grant.team_id),
            grant.clone(),
        );
        Ok(GrantWrite::Written)
    }

    async fn delete_grant(
        &self,
        event_id: Uuid,
        grantor_id: Uuid,
        team_id: Uuid,
    ) -> StorageResult<bool> {
        let mut state = self.state.write().await;
        Ok(state.grants.remove(&(event_id, grantor_id, team_id)).is_some())
    }

    async fn list_awards(&self, event_id: Uuid) -> StorageResult<Vec<SpecialAward>> {
        let state = self.state.read().await;
        let mut awards: Vec<SpecialAward> = state
            .awards
            .values()
            .filter(|a| a.event_id == event_id)
            .cloned()
            .collect();
        awards.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.award_id.cmp(&b.award_id))
        });
        Ok(awards)
    }

    async fn find_award(
        &self,
        event_id: Uuid,
        award_id: Uuid,
    ) -> StorageResult<Option<SpecialAward>> {
        let state = self.state.read().await;
        Ok(state
            .awards
            .get(&award_id)
            .filter(|a| a.event_id == event_id)
            .cloned())
    }

    async fn upsert_award(&self, award: &SpecialAward) -> StorageResult<()> {
        self.state
            .write()
            .await
            .awards
            .insert(award.award_id, award.clone());
        Ok(())
    }

    async fn list_votes(&self, event_id: Uuid) -> StorageResult<Vec<AwardVote>> {
        let state = self.state.read().await;
        Ok(state
            .votes
            .values()
            .filter(|v| v.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn list_votes_for_award(
        &self,
        event_id: Uuid,
        award_id: Uuid,
    ) -> StorageResult<Vec<AwardVote>> {
        let state = self.state.read().await;
        Ok(state
            .votes
            .values()
            .filter(|v| v.event_id == event_id && v.award_id == award_id)
            .cloned()
            .collect())
    }

    async fn list_votes_by_committee(
        &self,
        event_id: Uuid,
        committee_id: Uuid,
    ) -> StorageResult<Vec<AwardVote>> {
        let state = self.state.read().await;
        Ok(state
            .votes
            .values()
            .filter(|v| v.event_id == event_id && v.committee_id == committee_id)
            .cloned()
            .collect())
    }

    async fn upsert_vote(
        &self,
        vote: &AwardVote,
        exclusive: bool,
    ) -> StorageResult<VoteWrite> {
        let mut state = self.state.write().await;

        if exclusive
            && let Some(clash) = state.votes.values().find(|v| {
                v.event_id == vote.event_id
                    && v.committee_id == vote.committee_id
                    && v.team_id == vote.team_id
                    && v.award_id != vote.award_id
            })
        {
            return Ok(VoteWrite::TeamAlreadyAwarded {
                award_id: clash.award_id,
            });
        }

        state.votes.insert(
            (vote.event_id, vote.committee_id, vote.award_id),
            vote.clone(),
        );
        Ok(VoteWrite::Written)
    }

    async fn delete_vote(
        &self,
        event_id: Uuid,
        committee_id: Uuid,
        award_id: Uuid,
    ) -> StorageResult<bool> {
        let mut state = self.state.write().await;
        Ok(state
            .votes
            .remove(&(event_id, committee_id, award_id))
            .is_some())
    }

    async fn list_criteria(&self, event_id: Uuid) -> StorageResult<Vec<EvaluationCriterion>> {
        let state = self.state.read().await;
        let mut criteria: Vec<EvaluationCriterion> = state
            .criteria
            .values()
            .filter(|c| c.event_id == event_id)
            .cloned()
            .collect();
        criteria.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(criteria)
    }

    async fn find_criterion(
        &self,
        event_id: Uuid,
        criterion_id: Uuid,
    ) -> StorageResult<Option<EvaluationCriterion>> {
        let state = self.state.read().await;
        Ok(state
            .criteria
            .get(&criterion_id)
            .filter(|c| c.event_id == event_id)
            .cloned())
    }

    async fn upsert_criterion(&self, criterion: &EvaluationCriterion) -> StorageResult<()> {
        self.state
            .write()
            .await
            .criteria
            .insert(criterion.criterion_id, criterion.clone());
        Ok(())
    }

    async fn delete_criterion(&self, event_id: Uuid, criterion_id: Uuid) -> StorageResult<bool> {
        let mut state = self.state.write().await;
        let owned = state
            .criteria
            .get(&criterion_id)
            .is_some_and(|c| c.event_id == event_id);
        if owned {
            state.criteria.remove(&criterion_id);
        }
        Ok(owned)
    }

    async fn list_scores(&self, event_id: Uuid) -> StorageResult<Vec<CriterionScore>> {
        let state = self.state.read().await;
        Ok(state
            .scores
            .values()
            .filter(|s| s.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn upsert_score(&self, score: &CriterionScore) -> StorageResult<()> {
        self.state.write().await.scores.insert(
            (score.committee_id, score.team_id, score.criterion_id),
            score.clone(),
        );
        Ok(())
    }

    async fn delete_score(
        &self,
        event_id: Uuid,
        committee_id: Uuid,
        team_id: Uuid,
        criterion_id: Uuid,
    ) -> StorageResult<bool> {
        let mut state = self.state.write().await;
        let key = (committee_id, team_id, criterion_id);
        let owned = state.scores.get(&key).is_some_and(|s| s.event_id == event_id);
        if owned {
            state.scores.remove(&key);
        }
        Ok(owned)
    }

    async fn count_feedback(&self, event_id: Uuid, author_id: Option<Uuid>) -> StorageResult<u64> {
        let state = self.state.read().await;
        let count = state
            .feedback
            .iter()
            .filter(|(event, author)| {
                *event == event_id && author_id.is_none_or(|wanted| wanted == *author)
            })
            .count();
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn team(event_id: Uuid, name: &str) -> Team {
        Team {
            team_id: Uuid::new_v4(),
            event_id,
            name: name.to_string(),
            presenter_name: None,
            created_at: Utc::now().naive_utc(),
        }
    }

    #[tokio::test]
    async fn test_upsert_grant_replaces_by_key() {
        let repo = InMemoryRepository::new();
        let event_id = Uuid::new_v4();
        let grantor_id = Uuid::new_v4();
        let team_id = Uuid::new_v4();

        for amount in [50, 30] {
            repo.upsert_grant(&grant(event_id, grantor_id, team_id, amount), None)
                .await
                .unwrap();
        }

        let grants = repo.list_grants(event_id).await.unwrap();
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].amount, 30);
    }

    fn grant(event_id: Uuid, grantor_id: Uuid, team_id: Uuid, amount: i64) -> RewardGrant {
        RewardGrant {
            event_id,
            grantor_id,
            team_id,
            amount,
            updated_at: Utc::now().naive_utc(),
        }
    }

    #[tokio::test]
    async fn test_guarded_grant_counts_only_other_teams() {
        let repo = InMemoryRepository::new();
        let event_id = Uuid::new_v4();
        let grantor_id = Uuid::new_v4();
        let alpha = Uuid::new_v4();
        let beta = Uuid::new_v4();

        let first = grant(event_id, grantor_id, alpha, 70);
        assert_eq!(
            repo.upsert_grant(&first, Some(100)).await.unwrap(),
            GrantWrite::Written
        );
        assert_eq!(
            repo.upsert_grant(&grant(event_id, grantor_id, beta, 40), Some(100))
                .await
                .unwrap(),
            GrantWrite::PoolExceeded {
                used_elsewhere: 70,
                limit: 100
            }
        );
        assert_eq!(
            repo.upsert_grant(&grant(event_id, grantor_id, alpha, 100), Some(100))
                .await
                .unwrap(),
            GrantWrite::Written
        );

        let grants = repo.list_grants(event_id).await.unwrap();
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].amount, 100);
    }

    #[tokio::test]
    async fn test_guarded_vote_reports_clashing_award() {
        let repo = InMemoryRepository::new();
        let event_id = Uuid::new_v4();
        let committee_id = Uuid::new_v4();
        let team_id = Uuid::new_v4();
        let design = Uuid::new_v4();
        let vote = |award_id| AwardVote {
            event_id,
            committee_id,
            award_id,
            team_id,
            updated_at: Utc::now().naive_utc(),
        };

        repo.upsert_vote(&vote(design), true).await.unwrap();
        assert_eq!(
            repo.upsert_vote(&vote(Uuid::new_v4()), true)
                .await
                .unwrap(),
            VoteWrite::TeamAlreadyAwarded { award_id: design }
        );
        assert_eq!(
            repo.upsert_vote(&vote(Uuid::new_v4()), false)
                .await
                .unwrap(),
            VoteWrite::Written
        );
        assert_eq!(repo.list_votes(event_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_team_cascades() {
        let repo = InMemoryRepository::new();
        let event_id = Uuid::new_v4();
        let doomed = team(event_id, "Doomed");
        repo.upsert_team(&doomed).await.unwrap();
        repo.upsert_grant(&grant(event_id, Uuid::new_v4(), doomed.team_id, 10), None)
            .await
            .unwrap();

        assert!(repo.delete_team(event_id, doomed.team_id).await.unwrap());
        assert!(repo.list_grants(event_id).await.unwrap().is_empty());
        assert!(!repo.delete_team(event_id, doomed.team_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_find_team_is_scoped_to_event() {
        let repo = InMemoryRepository::new();
        let t = team(Uuid::new_v4(), "Scoped");
        repo.upsert_team(&t).await.unwrap();

        assert!(repo.find_team(t.event_id, t.team_id).await.unwrap().is_some());
        assert!(repo.find_team(Uuid::new_v4(), t.team_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_count_feedback_by_author() {
        let repo = InMemoryRepository::new();
        let event_id = Uuid::new_v4();
        let author = Uuid::new_v4();
        repo.record_feedback(event_id, author).await;
        repo.record_feedback(event_id, author).await;
        repo.record_feedback(event_id, Uuid::new_v4()).await;

        assert_eq!(repo.count_feedback(event_id, None).await.unwrap(), 3);
        assert_eq!(repo.count_feedback(event_id, Some(author)).await.unwrap(), 2);
    }
}
