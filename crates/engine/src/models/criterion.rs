use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Allowed distance between the summed criterion weights and 100.
pub const WEIGHT_TOLERANCE: f64 = 0.01;

/// One weighted rubric dimension of an event's grading sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EvaluationCriterion {
    pub criterion_id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub max_score: f64,
    pub weight_percentage: f64,
    pub sort_order: i32,
}

/// A committee member's raw score for one team on one criterion.
/// Unique per `(committee_id, team_id, criterion_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CriterionScore {
    pub event_id: Uuid,
    pub committee_id: Uuid,
    pub team_id: Uuid,
    pub criterion_id: Uuid,
    pub value: f64,
    pub updated_at: NaiveDateTime,
}

pub fn weights_balanced(total_weight: f64) -> bool {
    (total_weight - 100.0).abs() < WEIGHT_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_balanced_within_tolerance() {
        assert!(weights_balanced(100.0));
        assert!(weights_balanced(99.995));
        assert!(weights_balanced(33.333 + 33.333 + 33.334));
        assert!(!weights_balanced(99.98));
        assert!(!weights_balanced(0.0));
    }
}
