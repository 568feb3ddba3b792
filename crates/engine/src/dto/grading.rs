use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Request payload for adding a criterion to an event's grading sheet
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCriterionRequest {
    pub event_id: Uuid,

    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    #[validate(custom(function = "validate_name"))]
    pub name: String,

    pub description: Option<String>,

    #[validate(custom(function = "validate_max_score"))]
    pub max_score: f64,

    #[validate(custom(function = "validate_weight"))]
    pub weight_percentage: f64,

    /// Appended after the last criterion when omitted.
    pub sort_order: Option<i32>,
}

/// Partial update of a criterion; omitted fields keep their value
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCriterionRequest {
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    #[validate(custom(function = "validate_name"))]
    pub name: Option<String>,

    pub description: Option<String>,

    #[validate(custom(function = "validate_max_score"))]
    pub max_score: Option<f64>,

    #[validate(custom(function = "validate_weight"))]
    pub weight_percentage: Option<f64>,

    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitScoreRequest {
    pub event_id: Uuid,
    pub committee_id: Uuid,
    pub team_id: Uuid,
    pub criterion_id: Uuid,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CriterionAverage {
    pub criterion_id: Uuid,
    pub name: String,
    pub max_score: f64,
    pub weight_percentage: f64,
    /// Mean over committee members; `None` when nobody scored this criterion.
    pub average: Option<f64>,
    pub committee_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CriterionValue {
    pub criterion_id: Uuid,
    pub value: f64,
}

/// One reviewer row in a team's grading breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CommitteeScore {
    pub committee_id: Uuid,
    pub committee_name: String,
    /// Unweighted mean of the criteria this member scored.
    pub avg_score: f64,
    pub scores: Vec<CriterionValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GradingResult {
    pub team_id: Uuid,
    pub team_name: String,
    pub presenter_name: Option<String>,
    pub overall_average: f64,
    pub criteria: Vec<CriterionAverage>,
    pub committee_scores: Vec<CommitteeScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GradingReport {
    pub event_id: Uuid,
    pub total_weight: f64,
    /// False when the weights do not add up to 100; results are still computed.
    pub balanced: bool,
    pub results: Vec<GradingResult>,
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("name_empty");
        err.message = Some("Name must not be empty".into());
        return Err(err);
    }
    Ok(())
}

fn validate_max_score(max_score: f64) -> Result<(), ValidationError> {
    if !max_score.is_finite() || max_score <= 0.0 {
        let mut err = ValidationError::new("max_score_range");
        err.message = Some("Max score must be greater than 0".into());
        return Err(err);
    }
    Ok(())
}

fn validate_weight(weight: f64) -> Result<(), ValidationError> {
    if !weight.is_finite() || !(0.0..=100.0).contains(&weight) {
        let mut err = ValidationError::new("weight_range");
        err.message = Some("Weight percentage must be between 0 and 100".into());
        return Err(err);
    }
    Ok(())
}
