use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::models::Role;

/// "Set my contribution to this team to `amount`".
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GiveRewardRequest {
    pub event_id: Uuid,
    pub grantor_id: Uuid,
    pub team_id: Uuid,
    /// Whole number of points; fractional, negative and non-finite values are rejected.
    pub amount: f64,
}

impl GiveRewardRequest {
    pub fn whole_amount(&self) -> Result<i64> {
        whole_amount(self.amount)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResetRewardRequest {
    pub event_id: Uuid,
    pub grantor_id: Uuid,
    pub team_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RewardResult {
    pub team_id: Uuid,
    pub team_total: i64,
    pub grantor_used: i64,
    /// Only present when a pool is configured for the grantor's role.
    pub grantor_limit: Option<i64>,
    pub grantor_remaining: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GrantorUsage {
    pub grantor_id: Uuid,
    pub role: Role,
    pub used: i64,
    pub limit: Option<i64>,
    pub remaining: Option<i64>,
    pub team_cap: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GrantSummary {
    pub team_id: Uuid,
    pub team_name: String,
    pub amount: i64,
}

/// Largest amount a JSON number can carry without losing integer precision (2^53 - 1).
pub const MAX_AMOUNT: i64 = (1 << 53) - 1;

/// Converts a wire number into a reward amount.
pub fn whole_amount(value: f64) -> Result<i64> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > MAX_AMOUNT as f64 {
        return Err(EngineError::InvalidAmount { value });
    }
    Ok(value as i64)
}
