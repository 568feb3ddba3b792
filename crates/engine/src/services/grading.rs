//! Weighted grading of teams from committee criterion scores.
//!
//! Per criterion the committee values are averaged; the team's overall score
//! is the weight-normalised mean over the criteria that received at least one
//! score, so an unscored criterion neither helps nor hurts.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{require_grantor, require_team};
use crate::dto::grading::{
    CommitteeScore, CriterionAverage, CriterionValue, GradingReport, GradingResult,
    SubmitScoreRequest,
};
use crate::error::{EngineError, Result};
use crate::models::{CriterionScore, EvaluationCriterion, Team, weights_balanced};
use crate::repository::EventRepository;

pub struct GradingAggregator<'a, R: EventRepository + ?Sized> {
    repo: &'a R,
}

impl<'a, R: EventRepository + ?Sized> GradingAggregator<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// Stores a committee member's score, replacing their earlier value for the same team and criterion.
    pub async fn submit_score(&self, request: &SubmitScoreRequest) -> Result<CriterionScore> {
        let criterion = self
            .repo
            .find_criterion(request.event_id, request.criterion_id)
            .await?
            .ok_or(EngineError::CriterionNotFound(request.criterion_id))?;

        if !request.value.is_finite() || request.value < 0.0 || request.value > criterion.max_score {
            return Err(EngineError::ScoreOutOfRange {
                value: request.value,
                max: criterion.max_score,
            });
        }

        require_team(self.repo, request.event_id, request.team_id).await?;
        require_grantor(self.repo, request.event_id, request.committee_id, true).await?;

        let score = CriterionScore {
            event_id: request.event_id,
            committee_id: request.committee_id,
            team_id: request.team_id,
            criterion_id: request.criterion_id,
            value: request.value,
            updated_at: Utc::now().naive_utc(),
        };
        self.repo.upsert_score(&score).await?;

        info!(
            event_id = %request.event_id,
            committee_id = %request.committee_id,
            team_id = %request.team_id,
            criterion_id = %request.criterion_id,
            value = request.value,
            "Criterion score submitted"
        );

        Ok(score)
    }

    /// One result per team holding at least one score on a current criterion.
    pub async fn get_results(&self, event_id: Uuid) -> Result<Vec<GradingResult>> {
        let teams = self.repo.list_teams(event_id).await?;
        let criteria = self.repo.list_criteria(event_id).await?;
        let scores = self.repo.list_scores(event_id).await?;
        let names: HashMap<Uuid, String> = self
            .repo
            .list_participants(event_id)
            .await?
            .into_iter()
            .map(|p| (p.user_id, p.display_name))
            .collect();

        let results = aggregate(&teams, &criteria, &scores, &names);
        debug!(event_id = %event_id, teams = results.len(), "Grading results computed");
        Ok(results)
    }

    pub async fn grading_report(&self, event_id: Uuid) -> Result<GradingReport> {
        let total_weight: f64 = self
            .repo
            .list_criteria(event_id)
            .await?
            .iter()
            .map(|c| c.weight_percentage)
            .sum();
        let balanced = weights_balanced(total_weight);
        if !balanced {
            warn!(event_id = %event_id, total_weight, "Grading with unbalanced criterion weights");
        }

        Ok(GradingReport {
            event_id,
            total_weight,
            balanced,
            results: self.get_results(event_id).await?,
        })
    }
}

/// Pure aggregation over already-loaded rows.
///
/// Scores for unknown teams or removed criteria are ignored. Results are
/// ordered by overall average (desc), then team creation time, then id.
pub fn aggregate(
    teams: &[Team],
    criteria: &[EvaluationCriterion],
    scores: &[CriterionScore],
    committee_names: &HashMap<Uuid, String>,
) -> Vec<GradingResult> {
    // team -> criterion -> committee -> value; the inner map keeps one value per member
    let mut by_team: HashMap<Uuid, HashMap<Uuid, BTreeMap<Uuid, f64>>> = HashMap::new();
    let live: HashMap<Uuid, &EvaluationCriterion> =
        criteria.iter().map(|c| (c.criterion_id, c)).collect();

    for score in scores.iter().filter(|s| live.contains_key(&s.criterion_id)) {
        by_team
            .entry(score.team_id)
            .or_default()
            .entry(score.criterion_id)
            .or_default()
            .insert(score.committee_id, score.value);
    }

    let mut ranked: Vec<(&Team, GradingResult)> = teams
        .iter()
        .filter_map(|team| {
            let per_criterion = by_team.get(&team.team_id)?;
            Some((team, grade_team(team, criteria, per_criterion, committee_names)))
        })
        .collect();

    ranked.sort_by(|(ta, a), (tb, b)| {
        b.overall_average
            .partial_cmp(&a.overall_average)
            .unwrap_or(Ordering::Equal)
            .then_with(|| ta.created_at.cmp(&tb.created_at))
            .then_with(|| ta.team_id.cmp(&tb.team_id))
    });

    ranked.into_iter().map(|(_, result)| result).collect()
}

fn grade_team(
    team: &Team,
    criteria: &[EvaluationCriterion],
    per_criterion: &HashMap<Uuid, BTreeMap<Uuid, f64>>,
    committee_names: &HashMap<Uuid, String>,
) -> GradingResult {
    let mut averages = Vec::with_capacity(criteria.len());
    let mut weighted_sum = 0.0;
    let mut effective_weight = 0.0;
    let mut by_committee: BTreeMap<Uuid, Vec<CriterionValue>> = BTreeMap::new();

    for criterion in criteria {
        let values = per_criterion.get(&criterion.criterion_id);
        let average = values.and_then(|v| mean(v.values().copied()));

        if let Some(avg) = average {
            weighted_sum += avg * criterion.weight_percentage;
            effective_weight += criterion.weight_percentage;
        }

        for (committee_id, value) in values.into_iter().flatten() {
            by_committee
                .entry(*committee_id)
                .or_default()
                .push(CriterionValue {
                    criterion_id: criterion.criterion_id,
                    value: *value,
                });
        }

        averages.push(CriterionAverage {
            criterion_id: criterion.criterion_id,
            name: criterion.name.clone(),
            max_score: criterion.max_score,
            weight_percentage: criterion.weight_percentage,
            average,
            committee_count: values.map_or(0, |v| v.len() as u32),
        });
    }

    let overall_average = if effective_weight > 0.0 {
        weighted_sum / effective_weight
    } else {
        0.0
    };

    let mut committee_scores: Vec<CommitteeScore> = by_committee
        .into_iter()
        .map(|(committee_id, scores)| CommitteeScore {
            committee_id,
            committee_name: committee_names
                .get(&committee_id)
                .cloned()
                .unwrap_or_default(),
            avg_score: mean(scores.iter().map(|s| s.value)).unwrap_or(0.0),
            scores,
        })
        .collect();
    committee_scores.sort_by(|a, b| {
        a.committee_name
            .cmp(&b.committee_name)
            .then_with(|| a.committee_id.cmp(&b.committee_id))
    });

    GradingResult {
        team_id: team.team_id,
        team_name: team.name.clone(),
        presenter_name: team.presenter_name.clone(),
        overall_average,
        criteria: averages,
        committee_scores,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0u32), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / f64::from(count))
}
