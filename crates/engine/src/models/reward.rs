use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::Role;

/// The current virtual reward one grantor has given one team.
///
/// There is at most one grant per `(event_id, grantor_id, team_id)`; giving
/// again replaces `amount`, resetting deletes the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RewardGrant {
    pub event_id: Uuid,
    pub grantor_id: Uuid,
    pub team_id: Uuid,
    pub amount: i64,
    pub updated_at: NaiveDateTime,
}

/// Per-event limits on virtual reward allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RewardPolicy {
    pub event_id: Uuid,
    pub vr_team_cap_enabled: bool,
    pub vr_team_cap_guest: i64,
    pub vr_team_cap_committee: i64,
    /// Total a single guest may hand out across all teams.
    pub vr_pool_guest: Option<i64>,
    /// Total a single committee member may hand out across all teams.
    pub vr_pool_committee: Option<i64>,
    /// When set, a committee member may not give two different special awards to the same team.
    pub exclusive_team_awards: bool,
}

impl RewardPolicy {
    /// Policy used for events that never stored one: no caps, no pools.
    pub fn unrestricted(event_id: Uuid) -> Self {
        Self {
            event_id,
            vr_team_cap_enabled: false,
            vr_team_cap_guest: 0,
            vr_team_cap_committee: 0,
            vr_pool_guest: None,
            vr_pool_committee: None,
            exclusive_team_awards: false,
        }
    }

    pub fn team_cap(&self, role: Role) -> Option<i64> {
        if !self.vr_team_cap_enabled {
            return None;
        }
        match role {
            Role::Guest => Some(self.vr_team_cap_guest),
            Role::Committee => Some(self.vr_team_cap_committee),
            _ => None,
        }
    }

    pub fn pool_limit(&self, role: Role) -> Option<i64> {
        match role {
            Role::Guest => self.vr_pool_guest,
            Role::Committee => self.vr_pool_committee,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capped_policy() -> RewardPolicy {
        RewardPolicy {
            vr_team_cap_enabled: true,
            vr_team_cap_guest: 100,
            vr_team_cap_committee: 500,
            vr_pool_guest: Some(1_000),
            ..RewardPolicy::unrestricted(Uuid::new_v4())
        }
    }

    #[test]
    fn test_team_cap_depends_on_role() {
        let policy = capped_policy();
        assert_eq!(policy.team_cap(Role::Guest), Some(100));
        assert_eq!(policy.team_cap(Role::Committee), Some(500));
        assert_eq!(policy.team_cap(Role::Organizer), None);
    }

    #[test]
    fn test_disabled_cap_is_ignored() {
        let policy = RewardPolicy {
            vr_team_cap_enabled: false,
            ..capped_policy()
        };
        assert_eq!(policy.team_cap(Role::Guest), None);
        assert_eq!(policy.pool_limit(Role::Guest), Some(1_000));
        assert_eq!(policy.pool_limit(Role::Committee), None);
    }
}
