use super::models::{EventSnapshot, FORMAT_VERSION};
use crate::{ImporterError, Result};
use engine::dto::reward::whole_amount;
use engine::models::{Role, weights_balanced};
use std::collections::{HashMap, HashSet};
use tracing::warn;
use uuid::Uuid;

pub struct SnapshotValidator;

impl SnapshotValidator {
    pub fn validate(snapshot: &EventSnapshot) -> Result<ValidationReport> {
        let mut report = ValidationReport::default();

        if snapshot.format_version != FORMAT_VERSION {
            report.errors.push(format!(
                "Unsupported format version: {}. Expected {}",
                snapshot.format_version, FORMAT_VERSION
            ));
        }

        if snapshot.name.trim().is_empty() {
            report.errors.push("Event name is required".to_string());
        }

        if let Some(policy) = &snapshot.policy {
            if policy.vr_team_cap_guest < 0 || policy.vr_team_cap_committee < 0 {
                report
                    .errors
                    .push("Team caps cannot be negative".to_string());
            }
            if policy.vr_pool_guest.is_some_and(|p| p < 0)
                || policy.vr_pool_committee.is_some_and(|p| p < 0)
            {
                report
                    .errors
                    .push("Reward pools cannot be negative".to_string());
            }
        }

        let mut roles: HashMap<Uuid, Role> = HashMap::new();
        for participant in &snapshot.participants {
            if participant.display_name.trim().is_empty() {
                report.errors.push(format!(
                    "Participant {} has an empty display_name",
                    participant.user_id
                ));
            }
            if roles
                .insert(participant.user_id, participant.role)
                .is_some()
            {
                report.errors.push(format!(
                    "Duplicate participant: {}",
                    participant.user_id
                ));
            }
        }

        if snapshot.teams.is_empty() {
            report
                .warnings
                .push("Snapshot contains no teams".to_string());
        }

        let mut team_ids = HashSet::new();
        for team in &snapshot.teams {
            if team.name.trim().is_empty() {
                report
                    .errors
                    .push(format!("Team {} has an empty name", team.team_id));
            }
            if !team_ids.insert(team.team_id) {
                report
                    .errors
                    .push(format!("Duplicate team: {}", team.team_id));
            }
            if team.presenter_name.is_none() {
                report
                    .warnings
                    .push(format!("Team '{}' has no presenter", team.name));
            }
        }

        let mut award_ids = HashSet::new();
        for award in &snapshot.awards {
            if award.name.trim().is_empty() {
                report
                    .errors
                    .push(format!("Award {} has an empty name", award.award_id));
            }
            if !award_ids.insert(award.award_id) {
                report
                    .errors
                    .push(format!("Duplicate award: {}", award.award_id));
            }
        }

        let mut max_scores: HashMap<Uuid, f64> = HashMap::new();
        for criterion in &snapshot.criteria {
            if criterion.name.trim().is_empty() {
                report.errors.push(format!(
                    "Criterion {} has an empty name",
                    criterion.criterion_id
                ));
            }
            if !criterion.max_score.is_finite() || criterion.max_score <= 0.0 {
                report.errors.push(format!(
                    "Criterion '{}' has invalid max_score {}. Must be > 0",
                    criterion.name, criterion.max_score
                ));
            }
            if !criterion.weight_percentage.is_finite()
                || !(0.0..=100.0).contains(&criterion.weight_percentage)
            {
                report.errors.push(format!(
                    "Criterion '{}' has invalid weight {}. Must be 0-100",
                    criterion.name, criterion.weight_percentage
                ));
            }
            if max_scores
                .insert(criterion.criterion_id, criterion.max_score)
                .is_some()
            {
                report.errors.push(format!(
                    "Duplicate criterion: {}",
                    criterion.criterion_id
                ));
            }
        }

        if snapshot.criteria.is_empty() {
            report
                .warnings
                .push("Snapshot contains no evaluation criteria".to_string());
        } else {
            let total: f64 = snapshot.criteria.iter().map(|c| c.weight_percentage).sum();
            if !weights_balanced(total) {
                report.warnings.push(format!(
                    "Criterion weights sum to {}, not 100; grading will be re-normalised",
                    total
                ));
            }
        }

        let mut grant_keys = HashSet::new();
        for grant in &snapshot.grants {
            match roles.get(&grant.grantor_id) {
                Some(role) if role.is_grantor() => {}
                Some(role) => report.errors.push(format!(
                    "Grant by {} ({}) is not allowed: only guests and committee members grant rewards",
                    grant.grantor_id, role
                )),
                None => report
                    .errors
                    .push(format!("Grant by unknown participant {}", grant.grantor_id)),
            }
            if !team_ids.contains(&grant.team_id) {
                report
                    .errors
                    .push(format!("Grant to unknown team {}", grant.team_id));
            }
            if whole_amount(grant.amount).is_err() {
                report.errors.push(format!(
                    "Grant by {} has invalid amount {}. Must be a non-negative whole number",
                    grant.grantor_id, grant.amount
                ));
            }
            if !grant_keys.insert((grant.grantor_id, grant.team_id)) {
                report.errors.push(format!(
                    "Duplicate grant by {} to team {}",
                    grant.grantor_id, grant.team_id
                ));
            }
        }

        let mut vote_keys = HashSet::new();
        for vote in &snapshot.votes {
            if roles.get(&vote.committee_id) != Some(&Role::Committee) {
                report.errors.push(format!(
                    "Vote by {} who is not a committee member",
                    vote.committee_id
                ));
            }
            if !award_ids.contains(&vote.award_id) {
                report
                    .errors
                    .push(format!("Vote for unknown award {}", vote.award_id));
            }
            if !team_ids.contains(&vote.team_id) {
                report
                    .errors
                    .push(format!("Vote for unknown team {}", vote.team_id));
            }
            if !vote_keys.insert((vote.committee_id, vote.award_id)) {
                report.errors.push(format!(
                    "Committee member {} voted twice for award {}",
                    vote.committee_id, vote.award_id
                ));
            }
        }

        let mut score_keys = HashSet::new();
        for score in &snapshot.scores {
            if roles.get(&score.committee_id) != Some(&Role::Committee) {
                report.errors.push(format!(
                    "Score by {} who is not a committee member",
                    score.committee_id
                ));
            }
            if !team_ids.contains(&score.team_id) {
                report
                    .errors
                    .push(format!("Score for unknown team {}", score.team_id));
            }
            match max_scores.get(&score.criterion_id) {
                Some(max) if !score.value.is_finite() || score.value < 0.0 || score.value > *max => {
                    report.errors.push(format!(
                        "Score {} for criterion {} is outside 0-{}",
                        score.value, score.criterion_id, max
                    ));
                }
                Some(_) => {}
                None => report.errors.push(format!(
                    "Score for unknown criterion {}",
                    score.criterion_id
                )),
            }
            if !score_keys.insert((score.committee_id, score.team_id, score.criterion_id)) {
                report.errors.push(format!(
                    "Duplicate score by {} for team {} on criterion {}",
                    score.committee_id, score.team_id, score.criterion_id
                ));
            }
        }

        if !report.errors.is_empty() {
            Err(ImporterError::ValidationError(format!(
                "Validation failed with {} error(s): {}",
                report.errors.len(),
                report.errors.join("; ")
            )))
        } else {
            Ok(report)
        }
    }
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn log_warnings(&self) {
        for warning in &self.warnings {
            warn!("{}", warning);
        }
    }
}
