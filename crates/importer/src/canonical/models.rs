use crate::Result;
use chrono::NaiveDateTime;
use engine::models::{Role, RewardPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

pub const FORMAT_VERSION: &str = "1.0.0";

/// Full state of one event as exchanged between deployments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSnapshot {
    pub format_version: String,
    pub event_id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<PolicyData>,
    #[serde(default)]
    pub participants: Vec<ParticipantData>,
    #[serde(default)]
    pub teams: Vec<TeamData>,
    #[serde(default)]
    pub awards: Vec<AwardData>,
    #[serde(default)]
    pub criteria: Vec<CriterionData>,
    #[serde(default)]
    pub grants: Vec<GrantData>,
    #[serde(default)]
    pub votes: Vec<VoteData>,
    #[serde(default)]
    pub scores: Vec<ScoreData>,
}

impl EventSnapshot {
    pub async fn from_path(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path).await?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyData {
    #[serde(default)]
    pub vr_team_cap_enabled: bool,
    #[serde(default)]
    pub vr_team_cap_guest: i64,
    #[serde(default)]
    pub vr_team_cap_committee: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vr_pool_guest: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vr_pool_committee: Option<i64>,
    #[serde(default)]
    pub exclusive_team_awards: bool,
}

impl PolicyData {
    pub fn into_policy(self, event_id: Uuid) -> RewardPolicy {
        RewardPolicy {
            event_id,
            vr_team_cap_enabled: self.vr_team_cap_enabled,
            vr_team_cap_guest: self.vr_team_cap_guest,
            vr_team_cap_committee: self.vr_team_cap_committee,
            vr_pool_guest: self.vr_pool_guest,
            vr_pool_committee: self.vr_pool_committee,
            exclusive_team_awards: self.exclusive_team_awards,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantData {
    pub user_id: Uuid,
    pub role: Role,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamData {
    pub team_id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presenter_name: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardData {
    pub award_id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriterionData {
    pub criterion_id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub max_score: f64,
    pub weight_percentage: f64,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantData {
    pub grantor_id: Uuid,
    pub team_id: Uuid,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteData {
    pub committee_id: Uuid,
    pub award_id: Uuid,
    pub team_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreData {
    pub committee_id: Uuid,
    pub team_id: Uuid,
    pub criterion_id: Uuid,
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ImporterError;

    #[test]
    fn test_from_json_fills_optional_sections() {
        let snapshot = EventSnapshot::from_json(
            r#"{
                "format_version": "1.0.0",
                "event_id": "7f1c2a52-8d4e-4e57-9a3b-2f6d1e0c9b11",
                "name": "Spring Hack"
            }"#,
        )
        .unwrap();

        assert!(snapshot.policy.is_none());
        assert!(snapshot.teams.is_empty());
        assert!(snapshot.grants.is_empty());
    }

    #[test]
    fn test_from_json_reports_parse_errors() {
        let err = EventSnapshot::from_json("{ \"name\": 42 }").unwrap_err();
        assert!(matches!(err, ImporterError::ParseError(_)));
    }

    #[tokio::test]
    async fn test_from_path_reports_missing_file() {
        let path = std::env::temp_dir().join(format!("missing-{}.json", Uuid::new_v4()));
        let err = EventSnapshot::from_path(&path).await.unwrap_err();
        assert!(matches!(err, ImporterError::IoError(_)));
    }
}
