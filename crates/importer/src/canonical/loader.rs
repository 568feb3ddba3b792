use super::models::EventSnapshot;
use crate::Result;
use engine::dto::award::CastVoteRequest;
use engine::dto::grading::SubmitScoreRequest;
use engine::dto::reward::GiveRewardRequest;
use engine::models::{EvaluationCriterion, Participant, RewardPolicy, SpecialAward, Team};
use engine::repository::EventRepository;
use engine::services::{AwardBoard, GradingAggregator, RewardLedger};
use tracing::info;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    pub participants: usize,
    pub teams: usize,
    pub awards: usize,
    pub criteria: usize,
    pub grants: usize,
    pub votes: usize,
    pub scores: usize,
}

/// Writes a validated snapshot through the repository.
///
/// Reference data is upserted as-is; grants, votes and scores go through the
/// engine so caps, pools and score ranges apply exactly as they do online.
pub struct SnapshotLoader<'a, R: EventRepository + ?Sized> {
    repo: &'a R,
}

impl<'a, R: EventRepository + ?Sized> SnapshotLoader<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    pub async fn load(&self, snapshot: &EventSnapshot) -> Result<LoadSummary> {
        let event_id = snapshot.event_id;
        let mut summary = LoadSummary::default();

        let policy = snapshot
            .policy
            .clone()
            .map(|p| p.into_policy(event_id))
            .unwrap_or_else(|| RewardPolicy::unrestricted(event_id));
        self.repo.upsert_reward_policy(&policy).await?;

        for participant in &snapshot.participants {
            self.repo
                .upsert_participant(&Participant {
                    event_id,
                    user_id: participant.user_id,
                    role: participant.role,
                    display_name: participant.display_name.clone(),
                })
                .await?;
            summary.participants += 1;
        }

        for team in &snapshot.teams {
            self.repo
                .upsert_team(&Team {
                    team_id: team.team_id,
                    event_id,
                    name: team.name.clone(),
                    presenter_name: team.presenter_name.clone(),
                    created_at: team.created_at,
                })
                .await?;
            summary.teams += 1;
        }

        for award in &snapshot.awards {
            self.repo
                .upsert_award(&SpecialAward {
                    award_id: award.award_id,
                    event_id,
                    name: award.name.clone(),
                    image_url: award.image_url.clone(),
                    created_at: award.created_at,
                })
                .await?;
            summary.awards += 1;
        }

        for criterion in &snapshot.criteria {
            self.repo
                .upsert_criterion(&EvaluationCriterion {
                    criterion_id: criterion.criterion_id,
                    event_id,
                    name: criterion.name.trim().to_string(),
                    description: criterion.description.clone(),
                    max_score: criterion.max_score,
                    weight_percentage: criterion.weight_percentage,
                    sort_order: criterion.sort_order,
                })
                .await?;
            summary.criteria += 1;
        }
        info!(
            event_id = %event_id,
            participants = summary.participants,
            teams = summary.teams,
            awards = summary.awards,
            criteria = summary.criteria,
            "Reference data loaded"
        );

        let ledger = RewardLedger::new(self.repo);
        for grant in &snapshot.grants {
            ledger
                .give_reward(&GiveRewardRequest {
                    event_id,
                    grantor_id: grant.grantor_id,
                    team_id: grant.team_id,
                    amount: grant.amount,
                })
                .await?;
            summary.grants += 1;
        }

        let board = AwardBoard::new(self.repo);
        for vote in &snapshot.votes {
            board
                .cast_vote(&CastVoteRequest {
                    event_id,
                    committee_id: vote.committee_id,
                    award_id: vote.award_id,
                    team_id: vote.team_id,
                })
                .await?;
            summary.votes += 1;
        }

        let grading = GradingAggregator::new(self.repo);
        for score in &snapshot.scores {
            grading
                .submit_score(&SubmitScoreRequest {
                    event_id,
                    committee_id: score.committee_id,
                    team_id: score.team_id,
                    criterion_id: score.criterion_id,
                    value: score.value,
                })
                .await?;
            summary.scores += 1;
        }
        info!(
            event_id = %event_id,
            grants = summary.grants,
            votes = summary.votes,
            scores = summary.scores,
            "Event activity loaded"
        );

        Ok(summary)
    }
}
