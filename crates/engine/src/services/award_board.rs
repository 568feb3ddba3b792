use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use super::{require_grantor, require_team};
use crate::dto::award::{AwardSummary, CastVoteRequest, ClearVoteRequest, CommitteeVote, VoteTally};
use crate::error::{EngineError, Result};
use crate::models::{AwardVote, SpecialAward};
use crate::repository::{EventRepository, VoteWrite};

/// Committee voting on special awards.
pub struct AwardBoard<'a, R: EventRepository + ?Sized> {
    repo: &'a R,
}

impl<'a, R: EventRepository + ?Sized> AwardBoard<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// Records (or moves) a committee member's pick for an award.
    pub async fn cast_vote(&self, request: &CastVoteRequest) -> Result<VoteTally> {
        require_grantor(self.repo, request.event_id, request.committee_id, true).await?;
        self.require_award(request.event_id, request.award_id).await?;
        require_team(self.repo, request.event_id, request.team_id).await?;

        let exclusive = self
            .repo
            .find_reward_policy(request.event_id)
            .await?
            .is_some_and(|p| p.exclusive_team_awards);

        let vote = AwardVote {
            event_id: request.event_id,
            committee_id: request.committee_id,
            award_id: request.award_id,
            team_id: request.team_id,
            updated_at: Utc::now().naive_utc(),
        };
        if let VoteWrite::TeamAlreadyAwarded { award_id } =
            self.repo.upsert_vote(&vote, exclusive).await?
        {
            return Err(EngineError::TeamAlreadyAwarded {
                team_id: request.team_id,
                award_id,
            });
        }

        info!(
            event_id = %request.event_id,
            committee_id = %request.committee_id,
            award_id = %request.award_id,
            team_id = %request.team_id,
            "Special award vote cast"
        );

        self.tally(request.event_id, request.award_id).await
    }

    /// Withdraws a committee member's pick. Returns whether a vote existed.
    pub async fn clear_vote(&self, request: &ClearVoteRequest) -> Result<bool> {
        let removed = self
            .repo
            .delete_vote(request.event_id, request.committee_id, request.award_id)
            .await?;

        if removed {
            info!(
                event_id = %request.event_id,
                committee_id = %request.committee_id,
                award_id = %request.award_id,
                "Special award vote cleared"
            );
        }

        Ok(removed)
    }

    pub async fn tally(&self, event_id: Uuid, award_id: Uuid) -> Result<VoteTally> {
        self.require_award(event_id, award_id).await?;
        let votes = self.repo.list_votes_for_award(event_id, award_id).await?;
        Ok(tally_votes(award_id, &votes))
    }

    /// Tallies for every award of the event, in award creation order.
    pub async fn tallies(&self, event_id: Uuid) -> Result<Vec<(SpecialAward, VoteTally)>> {
        let awards = self.repo.list_awards(event_id).await?;
        let mut by_award: HashMap<Uuid, Vec<AwardVote>> = HashMap::new();
        for vote in self.repo.list_votes(event_id).await? {
            by_award.entry(vote.award_id).or_default().push(vote);
        }

        Ok(awards
            .into_iter()
            .map(|award| {
                let votes = by_award.remove(&award.award_id).unwrap_or_default();
                let tally = tally_votes(award.award_id, &votes);
                (award, tally)
            })
            .collect())
    }

    pub async fn award_summary(&self, event_id: Uuid) -> Result<Vec<AwardSummary>> {
        let summaries = self
            .tallies(event_id)
            .await?
            .into_iter()
            .map(|(award, tally)| AwardSummary {
                award_id: award.award_id,
                name: award.name,
                image_url: award.image_url,
                vote_count: tally.per_team_votes.values().sum(),
                team_count: tally.per_team_votes.len() as u32,
            })
            .collect();

        Ok(summaries)
    }

    pub async fn votes_by_committee(
        &self,
        event_id: Uuid,
        committee_id: Uuid,
    ) -> Result<Vec<CommitteeVote>> {
        let mut votes: Vec<CommitteeVote> = self
            .repo
            .list_votes_by_committee(event_id, committee_id)
            .await?
            .into_iter()
            .map(|v| CommitteeVote {
                award_id: v.award_id,
                team_id: v.team_id,
            })
            .collect();
        votes.sort_by_key(|v| v.award_id);
        Ok(votes)
    }

    async fn require_award(&self, event_id: Uuid, award_id: Uuid) -> Result<SpecialAward> {
        self.repo
            .find_award(event_id, award_id)
            .await?
            .ok_or(EngineError::AwardNotFound(award_id))
    }
}

/// Counts one vote per committee member and picks a winner only on a strict maximum.
pub fn tally_votes(award_id: Uuid, votes: &[AwardVote]) -> VoteTally {
    let mut seen = HashSet::new();
    let mut per_team_votes: BTreeMap<Uuid, u32> = BTreeMap::new();

    for vote in votes.iter().filter(|v| v.award_id == award_id) {
        if seen.insert(vote.committee_id) {
            *per_team_votes.entry(vote.team_id).or_insert(0) += 1;
        }
    }

    let top = per_team_votes.values().copied().max().unwrap_or(0);
    let mut leaders = per_team_votes.iter().filter(|(_, count)| **count == top);
    let winner = match (leaders.next(), leaders.next()) {
        (Some((team_id, _)), None) if top > 0 => Some(*team_id),
        _ => None,
    };

    if winner.is_none() && top > 0 {
        debug!(award_id = %award_id, top, "Special award tied, no winner");
    }

    VoteTally {
        award_id,
        per_team_votes,
        winner,
    }
}
