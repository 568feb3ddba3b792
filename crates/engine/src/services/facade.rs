use tracing::info;
use uuid::Uuid;

use super::ranking::with_grading;
use super::{
    AwardBoard, CriteriaRegistry, GradingAggregator, RankingEngine, RewardLedger, require_grantor,
    require_team,
};
use crate::dto::award::{AwardSummary, CastVoteRequest, ClearVoteRequest, VoteTally};
use crate::dto::dashboard::{CommitteeDashboard, GrantorDashboard, OrganizerDashboard};
use crate::dto::grading::{
    CreateCriterionRequest, GradingReport, SubmitScoreRequest, UpdateCriterionRequest,
};
use crate::dto::ranking::RankingRow;
use crate::dto::reward::{GiveRewardRequest, GrantorUsage, ResetRewardRequest, RewardResult};
use crate::error::{EngineError, Result};
use crate::models::{CriterionScore, EvaluationCriterion, weights_balanced};
use crate::repository::EventRepository;

/// Entry point for the API layer.
///
/// Holds only the repository; every call builds the components it needs, so
/// no state survives between requests.
pub struct AggregationFacade<R: EventRepository> {
    repo: R,
}

impl<R: EventRepository> AggregationFacade<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub async fn give_reward(&self, request: &GiveRewardRequest) -> Result<RewardResult> {
        RewardLedger::new(&self.repo).give_reward(request).await
    }

    pub async fn reset_reward(&self, request: &ResetRewardRequest) -> Result<RewardResult> {
        RewardLedger::new(&self.repo).reset_reward(request).await
    }

    pub async fn team_total(&self, event_id: Uuid, team_id: Uuid) -> Result<i64> {
        require_team(&self.repo, event_id, team_id).await?;
        RewardLedger::new(&self.repo)
            .get_team_total(event_id, team_id)
            .await
    }

    pub async fn grantor_usage(&self, event_id: Uuid, grantor_id: Uuid) -> Result<GrantorUsage> {
        RewardLedger::new(&self.repo)
            .get_grantor_usage(event_id, grantor_id)
            .await
    }

    pub async fn cast_vote(&self, request: &CastVoteRequest) -> Result<VoteTally> {
        AwardBoard::new(&self.repo).cast_vote(request).await
    }

    pub async fn clear_vote(&self, request: &ClearVoteRequest) -> Result<bool> {
        AwardBoard::new(&self.repo).clear_vote(request).await
    }

    pub async fn award_tally(&self, event_id: Uuid, award_id: Uuid) -> Result<VoteTally> {
        AwardBoard::new(&self.repo).tally(event_id, award_id).await
    }

    pub async fn award_summary(&self, event_id: Uuid) -> Result<Vec<AwardSummary>> {
        AwardBoard::new(&self.repo).award_summary(event_id).await
    }

    /// Tally of every award, in award creation order.
    pub async fn award_tallies(&self, event_id: Uuid) -> Result<Vec<VoteTally>> {
        let tallies = AwardBoard::new(&self.repo).tallies(event_id).await?;
        Ok(tallies.into_iter().map(|(_, tally)| tally).collect())
    }

    pub async fn add_criterion(&self, request: &CreateCriterionRequest) -> Result<EvaluationCriterion> {
        CriteriaRegistry::new(&self.repo).add_criterion(request).await
    }

    pub async fn update_criterion(
        &self,
        event_id: Uuid,
        criterion_id: Uuid,
        request: &UpdateCriterionRequest,
    ) -> Result<EvaluationCriterion> {
        CriteriaRegistry::new(&self.repo)
            .update_criterion(event_id, criterion_id, request)
            .await
    }

    pub async fn remove_criterion(&self, event_id: Uuid, criterion_id: Uuid) -> Result<()> {
        CriteriaRegistry::new(&self.repo)
            .remove_criterion(event_id, criterion_id)
            .await
    }

    pub async fn list_criteria(&self, event_id: Uuid) -> Result<Vec<EvaluationCriterion>> {
        CriteriaRegistry::new(&self.repo).list_criteria(event_id).await
    }

    pub async fn purge_orphaned_scores(&self, event_id: Uuid) -> Result<u64> {
        CriteriaRegistry::new(&self.repo)
            .purge_orphaned_scores(event_id)
            .await
    }

    pub async fn submit_score(&self, request: &SubmitScoreRequest) -> Result<CriterionScore> {
        GradingAggregator::new(&self.repo).submit_score(request).await
    }

    pub async fn grading_table(&self, event_id: Uuid) -> Result<GradingReport> {
        GradingAggregator::new(&self.repo)
            .grading_report(event_id)
            .await
    }

    /// Reward leaderboard with each team's grading average attached.
    pub async fn leaderboard(&self, event_id: Uuid, top: Option<i64>) -> Result<Vec<RankingRow>> {
        let engine = RankingEngine::new(&self.repo);
        let rows = match top {
            Some(n) => engine.compute_leaderboard_top_n(event_id, n).await?,
            None => engine.compute_leaderboard(event_id).await?,
        };
        let grading = GradingAggregator::new(&self.repo)
            .get_results(event_id)
            .await?;
        Ok(with_grading(rows, &grading))
    }

    /// Deletes a team along with every grant, vote and score that references it.
    pub async fn remove_team(&self, event_id: Uuid, team_id: Uuid) -> Result<()> {
        if !self.repo.delete_team(event_id, team_id).await? {
            return Err(EngineError::TeamNotFound(team_id));
        }
        info!(event_id = %event_id, team_id = %team_id, "Team removed with its rewards, votes and scores");
        Ok(())
    }

    pub async fn grantor_dashboard(&self, event_id: Uuid, user_id: Uuid) -> Result<GrantorDashboard> {
        let ledger = RewardLedger::new(&self.repo);
        let usage = ledger.get_grantor_usage(event_id, user_id).await?;
        let grants = ledger.grants_by_grantor(event_id, user_id).await?;

        Ok(GrantorDashboard {
            user_id,
            role: usage.role,
            used: usage.used,
            limit: usage.limit,
            remaining: usage.remaining,
            team_cap: usage.team_cap,
            teams_rewarded: grants.iter().filter(|g| g.amount > 0).count() as u32,
            grants,
        })
    }

    pub async fn committee_dashboard(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<CommitteeDashboard> {
        require_grantor(&self.repo, event_id, user_id, true).await?;
        let board = AwardBoard::new(&self.repo);

        Ok(CommitteeDashboard {
            reward: self.grantor_dashboard(event_id, user_id).await?,
            votes_given: board.votes_by_committee(event_id, user_id).await?.len() as u32,
            votes_total: self.repo.list_awards(event_id).await?.len() as u32,
            feedback_given: self.repo.count_feedback(event_id, Some(user_id)).await?,
        })
    }

    pub async fn organizer_dashboard(&self, event_id: Uuid) -> Result<OrganizerDashboard> {
        let totals = RewardLedger::new(&self.repo).team_totals(event_id).await?;
        let total_weight = CriteriaRegistry::new(&self.repo)
            .total_weight(event_id)
            .await?;

        Ok(OrganizerDashboard {
            event_id,
            team_count: self.repo.list_teams(event_id).await?.len() as u32,
            award_count: self.repo.list_awards(event_id).await?.len() as u32,
            total_reward: totals.values().sum(),
            total_weight,
            criteria_balanced: weights_balanced(total_weight),
            feedback_total: self.repo.count_feedback(event_id, None).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::{Participant, RewardPolicy, Role, SpecialAward, Team};
    use crate::repository::InMemoryRepository;

    struct Setup {
        facade: AggregationFacade<InMemoryRepository>,
        event_id: Uuid,
        team: Uuid,
        judge: Uuid,
        award: Uuid,
    }

    async fn setup() -> Setup {
        let repo = InMemoryRepository::new();
        let event_id = Uuid::new_v4();
        let now = Utc::now().naive_utc();
        let team = Team {
            team_id: Uuid::new_v4(),
            event_id,
            name: "Alpha".to_string(),
            presenter_name: None,
            created_at: now,
        };
        let judge = Participant {
            event_id,
            user_id: Uuid::new_v4(),
            role: Role::Committee,
            display_name: "Jude".to_string(),
        };
        let award = SpecialAward {
            award_id: Uuid::new_v4(),
            event_id,
            name: "Best Demo".to_string(),
            image_url: None,
            created_at: now,
        };
        repo.upsert_team(&team).await.unwrap();
        repo.upsert_participant(&judge).await.unwrap();
        repo.upsert_award(&award).await.unwrap();
        repo.upsert_reward_policy(&RewardPolicy {
            vr_pool_committee: Some(500),
            ..RewardPolicy::unrestricted(event_id)
        })
        .await
        .unwrap();
        repo.record_feedback(event_id, judge.user_id).await;

        Setup {
            facade: AggregationFacade::new(repo),
            event_id,
            team: team.team_id,
            judge: judge.user_id,
            award: award.award_id,
        }
    }

    #[tokio::test]
    async fn test_committee_dashboard_counters() {
        let s = setup().await;
        s.facade
            .give_reward(&GiveRewardRequest {
                event_id: s.event_id,
                grantor_id: s.judge,
                team_id: s.team,
                amount: 120.0,
            })
            .await
            .unwrap();
        s.facade
            .cast_vote(&CastVoteRequest {
                event_id: s.event_id,
                committee_id: s.judge,
                award_id: s.award,
                team_id: s.team,
            })
            .await
            .unwrap();

        let dashboard = s.facade.committee_dashboard(s.event_id, s.judge).await.unwrap();
        assert_eq!(dashboard.reward.used, 120);
        assert_eq!(dashboard.reward.remaining, Some(380));
        assert_eq!(dashboard.reward.teams_rewarded, 1);
        assert_eq!((dashboard.votes_given, dashboard.votes_total), (1, 1));
        assert_eq!(dashboard.feedback_given, 1);
    }

    #[tokio::test]
    async fn test_organizer_dashboard_on_empty_sheet() {
        let s = setup().await;
        let dashboard = s.facade.organizer_dashboard(s.event_id).await.unwrap();

        assert_eq!(dashboard.team_count, 1);
        assert_eq!(dashboard.award_count, 1);
        assert_eq!(dashboard.total_reward, 0);
        assert!(!dashboard.criteria_balanced);
        assert_eq!(dashboard.feedback_total, 1);
    }

    #[tokio::test]
    async fn test_remove_team_cascades_into_leaderboard() {
        let s = setup().await;
        s.facade
            .give_reward(&GiveRewardRequest {
                event_id: s.event_id,
                grantor_id: s.judge,
                team_id: s.team,
                amount: 10.0,
            })
            .await
            .unwrap();

        s.facade.remove_team(s.event_id, s.team).await.unwrap();

        assert!(s.facade.leaderboard(s.event_id, None).await.unwrap().is_empty());
        assert_eq!(s.facade.grantor_usage(s.event_id, s.judge).await.unwrap().used, 0);
        assert!(matches!(
            s.facade.remove_team(s.event_id, s.team).await,
            Err(EngineError::TeamNotFound(_))
        ));
    }
}
