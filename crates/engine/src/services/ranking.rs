use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

use super::{AwardBoard, RewardLedger};
use crate::dto::grading::GradingResult;
use crate::dto::ranking::{Badge, RankingRow};
use crate::error::Result;
use crate::models::Team;
use crate::repository::EventRepository;

/// Builds the virtual-reward leaderboard shown to every role.
pub struct RankingEngine<'a, R: EventRepository + ?Sized> {
    repo: &'a R,
}

impl<'a, R: EventRepository + ?Sized> RankingEngine<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    pub async fn compute_leaderboard(&self, event_id: Uuid) -> Result<Vec<RankingRow>> {
        let teams = self.repo.list_teams(event_id).await?;
        let totals = RewardLedger::new(self.repo).team_totals(event_id).await?;

        let mut badges: HashMap<Uuid, Vec<Badge>> = HashMap::new();
        for (award, tally) in AwardBoard::new(self.repo).tallies(event_id).await? {
            if let Some(winner) = tally.winner {
                badges.entry(winner).or_default().push(Badge {
                    award_id: award.award_id,
                    award_name: award.name,
                });
            }
        }

        let rows = rank_teams(&teams, &totals, badges);
        debug!(event_id = %event_id, teams = rows.len(), "Leaderboard computed");
        Ok(rows)
    }

    /// Leaderboard truncated to `n` rows; `n <= 0` or `n` past the end returns every team.
    pub async fn compute_leaderboard_top_n(&self, event_id: Uuid, n: i64) -> Result<Vec<RankingRow>> {
        let mut rows = self.compute_leaderboard(event_id).await?;
        rows.truncate(clamp_top_n(n, rows.len()));
        Ok(rows)
    }
}

/// Sorts by total (desc), then creation time, then id, and numbers rows from 1.
///
/// Ties never share a rank: every row gets `index + 1`.
pub fn rank_teams(
    teams: &[Team],
    totals: &HashMap<Uuid, i64>,
    mut badges: HashMap<Uuid, Vec<Badge>>,
) -> Vec<RankingRow> {
    let mut ordered: Vec<(&Team, i64)> = teams
        .iter()
        .map(|t| (t, totals.get(&t.team_id).copied().unwrap_or(0)))
        .collect();

    ordered.sort_by(|(ta, a), (tb, b)| {
        b.cmp(a)
            .then_with(|| ta.created_at.cmp(&tb.created_at))
            .then_with(|| ta.team_id.cmp(&tb.team_id))
    });

    ordered
        .into_iter()
        .enumerate()
        .map(|(index, (team, total))| RankingRow {
            team_id: team.team_id,
            team_name: team.name.clone(),
            total_reward: total,
            rank: index as i64 + 1,
            badges: badges.remove(&team.team_id).unwrap_or_default(),
            grading_score: None,
        })
        .collect()
}

/// Copies each team's overall grading average onto its row; order is untouched.
pub fn with_grading(mut rows: Vec<RankingRow>, grading: &[GradingResult]) -> Vec<RankingRow> {
    let overall: HashMap<Uuid, f64> = grading
        .iter()
        .map(|g| (g.team_id, g.overall_average))
        .collect();
    for row in &mut rows {
        row.grading_score = overall.get(&row.team_id).copied();
    }
    rows
}

pub fn clamp_top_n(n: i64, team_count: usize) -> usize {
    match usize::try_from(n) {
        Ok(n) if n > 0 && n <= team_count => n,
        _ => team_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::award::CastVoteRequest;
    use crate::dto::reward::GiveRewardRequest;
    use crate::models::Role;
    use crate::services::fixtures::Event;

    async fn give(event: &Event, grantor_id: Uuid, team_id: Uuid, amount: f64) {
        RewardLedger::new(&event.repo)
            .give_reward(&GiveRewardRequest {
                event_id: event.event_id,
                grantor_id,
                team_id,
                amount,
            })
            .await
            .unwrap();
    }

    #[test]
    fn test_clamp_top_n() {
        assert_eq!(clamp_top_n(2, 5), 2);
        assert_eq!(clamp_top_n(5, 5), 5);
        assert_eq!(clamp_top_n(0, 5), 5);
        assert_eq!(clamp_top_n(-3, 5), 5);
        assert_eq!(clamp_top_n(9, 5), 5);
        assert_eq!(clamp_top_n(1, 0), 0);
    }

    #[tokio::test]
    async fn test_ties_broken_by_creation_time() {
        let event = Event::new();
        let a = event.team("A", 0).await;
        let b = event.team("B", 1).await;
        let c = event.team("C", 2).await;
        let guest = event.participant("Gail", Role::Guest).await;

        give(&event, guest, b, 100.0).await;
        give(&event, guest, c, 50.0).await;
        give(&event, guest, a, 100.0).await;

        let engine = RankingEngine::new(&event.repo);
        let first = engine.compute_leaderboard(event.event_id).await.unwrap();
        let second = engine.compute_leaderboard(event.event_id).await.unwrap();

        let ranks: Vec<(Uuid, i64)> = first.iter().map(|r| (r.team_id, r.rank)).collect();
        assert_eq!(ranks, vec![(a, 1), (b, 2), (c, 3)]);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_teams_without_rewards_are_listed_last() {
        let event = Event::new();
        let idle = event.team("Idle", 0).await;
        let busy = event.team("Busy", 1).await;
        let guest = event.participant("Gail", Role::Guest).await;
        give(&event, guest, busy, 5.0).await;

        let rows = RankingEngine::new(&event.repo)
            .compute_leaderboard(event.event_id)
            .await
            .unwrap();

        assert_eq!(rows[0].team_id, busy);
        assert_eq!((rows[1].team_id, rows[1].total_reward, rows[1].rank), (idle, 0, 2));
    }

    #[tokio::test]
    async fn test_award_winner_gets_badge() {
        let event = Event::new();
        let x = event.team("X", 0).await;
        let y = event.team("Y", 1).await;
        let award = event.award("Best Demo", 0).await;
        let judge = event.participant("Jude", Role::Committee).await;
        AwardBoard::new(&event.repo)
            .cast_vote(&CastVoteRequest {
                event_id: event.event_id,
                committee_id: judge,
                award_id: award,
                team_id: y,
            })
            .await
            .unwrap();

        let rows = RankingEngine::new(&event.repo)
            .compute_leaderboard(event.event_id)
            .await
            .unwrap();

        let winner = rows.iter().find(|r| r.team_id == y).unwrap();
        assert_eq!(winner.badges.len(), 1);
        assert_eq!(winner.badges[0].award_name, "Best Demo");
        assert!(rows.iter().find(|r| r.team_id == x).unwrap().badges.is_empty());
    }

    #[tokio::test]
    async fn test_top_n_truncates() {
        let event = Event::new();
        for (minute, name) in ["A", "B", "C"].iter().enumerate() {
            event.team(name, minute as i64).await;
        }
        let engine = RankingEngine::new(&event.repo);

        assert_eq!(engine.compute_leaderboard_top_n(event.event_id, 2).await.unwrap().len(), 2);
        assert_eq!(engine.compute_leaderboard_top_n(event.event_id, 0).await.unwrap().len(), 3);
        assert_eq!(engine.compute_leaderboard_top_n(event.event_id, 10).await.unwrap().len(), 3);
    }
}
