use std::collections::HashMap;
use std::iter;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use super::{require_grantor, require_team};
use crate::dto::reward::{
    GiveRewardRequest, GrantSummary, GrantorUsage, ResetRewardRequest, RewardResult,
};
use crate::error::{EngineError, Result};
use crate::models::{Participant, RewardGrant, RewardPolicy};
use crate::repository::{EventRepository, GrantWrite};

/// Source of truth for virtual reward points handed to teams.
pub struct RewardLedger<'a, R: EventRepository + ?Sized> {
    repo: &'a R,
}

impl<'a, R: EventRepository + ?Sized> RewardLedger<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// Sets the grantor's contribution to a team, replacing any earlier amount.
    pub async fn give_reward(&self, request: &GiveRewardRequest) -> Result<RewardResult> {
        let amount = request.whole_amount()?;
        let grantor =
            require_grantor(self.repo, request.event_id, request.grantor_id, false).await?;
        require_team(self.repo, request.event_id, request.team_id).await?;
        let policy = self.policy(request.event_id).await?;

        if let Some(cap) = policy.team_cap(grantor.role)
            && amount > cap
        {
            return Err(EngineError::CapExceeded {
                role: grantor.role,
                amount,
                cap,
            });
        }

        self.ensure_totals_fit(request, amount).await?;

        let grant = RewardGrant {
            event_id: request.event_id,
            grantor_id: request.grantor_id,
            team_id: request.team_id,
            amount,
            updated_at: Utc::now().naive_utc(),
        };
        let pool_limit = policy.pool_limit(grantor.role);
        if let GrantWrite::PoolExceeded {
            used_elsewhere,
            limit,
        } = self.repo.upsert_grant(&grant, pool_limit).await?
        {
            return Err(EngineError::PoolExceeded {
                role: grantor.role,
                requested: amount,
                used: used_elsewhere,
                limit,
            });
        }

        info!(
            event_id = %request.event_id,
            grantor_id = %request.grantor_id,
            team_id = %request.team_id,
            amount,
            "Virtual reward set"
        );

        self.result_for(&grantor, request.team_id, &policy).await
    }

    /// Removes the grantor's contribution to a team. Resetting twice is a no-op.
    pub async fn reset_reward(&self, request: &ResetRewardRequest) -> Result<RewardResult> {
        let grantor =
            require_grantor(self.repo, request.event_id, request.grantor_id, false).await?;
        require_team(self.repo, request.event_id, request.team_id).await?;
        let policy = self.policy(request.event_id).await?;

        let removed = self
            .repo
            .delete_grant(request.event_id, request.grantor_id, request.team_id)
            .await?;

        if removed {
            info!(
                event_id = %request.event_id,
                grantor_id = %request.grantor_id,
                team_id = %request.team_id,
                "Virtual reward reset"
            );
        } else {
            debug!(team_id = %request.team_id, "Reset of absent grant ignored");
        }

        self.result_for(&grantor, request.team_id, &policy).await
    }

    pub async fn get_team_total(&self, event_id: Uuid, team_id: Uuid) -> Result<i64> {
        let grants = self.repo.list_grants_by_team(event_id, team_id).await?;
        checked_total(team_id, grants.iter().map(|g| g.amount.max(0)))
    }

    /// Totals for every team that has at least one grant.
    pub async fn team_totals(&self, event_id: Uuid) -> Result<HashMap<Uuid, i64>> {
        let mut totals: HashMap<Uuid, i64> = HashMap::new();
        for grant in self.repo.list_grants(event_id).await? {
            let total = totals.entry(grant.team_id).or_insert(0);
            *total = total
                .checked_add(grant.amount.max(0))
                .ok_or(EngineError::TotalOverflow(grant.team_id))?;
        }
        Ok(totals)
    }

    pub async fn get_grantor_usage(&self, event_id: Uuid, grantor_id: Uuid) -> Result<GrantorUsage> {
        let grantor = require_grantor(self.repo, event_id, grantor_id, false).await?;
        let policy = self.policy(event_id).await?;
        self.usage_for(&grantor, &policy).await
    }

    /// The grantor's current grants, largest first.
    pub async fn grants_by_grantor(
        &self,
        event_id: Uuid,
        grantor_id: Uuid,
    ) -> Result<Vec<GrantSummary>> {
        let teams: HashMap<Uuid, String> = self
            .repo
            .list_teams(event_id)
            .await?
            .into_iter()
            .map(|t| (t.team_id, t.name))
            .collect();

        let mut grants: Vec<GrantSummary> = self
            .repo
            .list_grants_by_grantor(event_id, grantor_id)
            .await?
            .into_iter()
            .filter_map(|g| {
                teams.get(&g.team_id).map(|name| GrantSummary {
                    team_id: g.team_id,
                    team_name: name.clone(),
                    amount: g.amount,
                })
            })
            .collect();
        grants.sort_by(|a, b| {
            b.amount
                .cmp(&a.amount)
                .then_with(|| a.team_name.cmp(&b.team_name))
        });

        Ok(grants)
    }

    async fn policy(&self, event_id: Uuid) -> Result<RewardPolicy> {
        Ok(self
            .repo
            .find_reward_policy(event_id)
            .await?
            .unwrap_or_else(|| RewardPolicy::unrestricted(event_id)))
    }

    async fn usage_for(&self, grantor: &Participant, policy: &RewardPolicy) -> Result<GrantorUsage> {
        let grants = self
            .repo
            .list_grants_by_grantor(grantor.event_id, grantor.user_id)
            .await?;
        let used = checked_total(grantor.user_id, grants.iter().map(|g| g.amount))?;
        let limit = policy.pool_limit(grantor.role);

        Ok(GrantorUsage {
            grantor_id: grantor.user_id,
            role: grantor.role,
            used,
            limit,
            remaining: limit.map(|l| (l - used).max(0)),
            team_cap: policy.team_cap(grantor.role),
        })
    }

    /// Rejects a give whose team total or grantor total would not fit in an `i64`.
    async fn ensure_totals_fit(&self, request: &GiveRewardRequest, amount: i64) -> Result<()> {
        let team_grants = self
            .repo
            .list_grants_by_team(request.event_id, request.team_id)
            .await?;
        checked_total(
            request.team_id,
            team_grants
                .iter()
                .filter(|g| g.grantor_id != request.grantor_id)
                .map(|g| g.amount.max(0))
                .chain(iter::once(amount)),
        )?;

        let grantor_grants = self
            .repo
            .list_grants_by_grantor(request.event_id, request.grantor_id)
            .await?;
        checked_total(
            request.grantor_id,
            grantor_grants
                .iter()
                .filter(|g| g.team_id != request.team_id)
                .map(|g| g.amount)
                .chain(iter::once(amount)),
        )?;

        Ok(())
    }

    async fn result_for(
        &self,
        grantor: &Participant,
        team_id: Uuid,
        policy: &RewardPolicy,
    ) -> Result<RewardResult> {
        let usage = self.usage_for(grantor, policy).await?;
        Ok(RewardResult {
            team_id,
            team_total: self.get_team_total(grantor.event_id, team_id).await?,
            grantor_used: usage.used,
            grantor_limit: usage.limit,
            grantor_remaining: usage.remaining,
        })
    }
}

fn checked_total(owner: Uuid, mut amounts: impl Iterator<Item = i64>) -> Result<i64> {
    amounts.try_fold(0i64, |acc, amount| {
        acc.checked_add(amount)
            .ok_or(EngineError::TotalOverflow(owner))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::services::fixtures::Event;

    fn give(event: &Event, grantor_id: Uuid, team_id: Uuid, amount: f64) -> GiveRewardRequest {
        GiveRewardRequest {
            event_id: event.event_id,
            grantor_id,
            team_id,
            amount,
        }
    }

    /// A grant written straight to the store, bypassing amount validation.
    fn seeded(event: &Event, grantor_id: Uuid, team_id: Uuid, amount: i64) -> RewardGrant {
        RewardGrant {
            event_id: event.event_id,
            grantor_id,
            team_id,
            amount,
            updated_at: Utc::now().naive_utc(),
        }
    }

    fn reset(event: &Event, grantor_id: Uuid, team_id: Uuid) -> ResetRewardRequest {
        ResetRewardRequest {
            event_id: event.event_id,
            grantor_id,
            team_id,
        }
    }

    #[tokio::test]
    async fn test_give_replaces_previous_amount() {
        let event = Event::new();
        let team = event.team("Alpha", 0).await;
        let guest = event.participant("Gail", Role::Guest).await;
        let ledger = RewardLedger::new(&event.repo);

        ledger.give_reward(&give(&event, guest, team, 50.0)).await.unwrap();
        let result = ledger.give_reward(&give(&event, guest, team, 30.0)).await.unwrap();

        assert_eq!(result.team_total, 30);
        assert_eq!(result.grantor_used, 30);
        assert_eq!(result.grantor_limit, None);
    }

    #[tokio::test]
    async fn test_team_total_sums_grantors() {
        let event = Event::new();
        let team = event.team("Alpha", 0).await;
        let guest = event.participant("Gail", Role::Guest).await;
        let judge = event.participant("Jude", Role::Committee).await;
        let ledger = RewardLedger::new(&event.repo);

        ledger.give_reward(&give(&event, guest, team, 40.0)).await.unwrap();
        let result = ledger.give_reward(&give(&event, judge, team, 25.0)).await.unwrap();

        assert_eq!(result.team_total, 65);
        assert_eq!(ledger.get_team_total(event.event_id, team).await.unwrap(), 65);
    }

    #[tokio::test]
    async fn test_cap_exceeded_keeps_previous_value() {
        let event = Event::new();
        let team = event.team("Alpha", 0).await;
        let guest = event.participant("Gail", Role::Guest).await;
        event
            .policy(|p| {
                p.vr_team_cap_enabled = true;
                p.vr_team_cap_guest = 100;
            })
            .await;
        let ledger = RewardLedger::new(&event.repo);

        ledger.give_reward(&give(&event, guest, team, 80.0)).await.unwrap();
        let err = ledger
            .give_reward(&give(&event, guest, team, 101.0))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::CapExceeded { amount: 101, cap: 100, role: Role::Guest }
        ));
        assert_eq!(ledger.get_team_total(event.event_id, team).await.unwrap(), 80);
    }

    #[tokio::test]
    async fn test_cap_is_per_team_not_running_total() {
        let event = Event::new();
        let alpha = event.team("Alpha", 0).await;
        let beta = event.team("Beta", 1).await;
        let judge = event.participant("Jude", Role::Committee).await;
        event
            .policy(|p| {
                p.vr_team_cap_enabled = true;
                p.vr_team_cap_committee = 100;
            })
            .await;
        let ledger = RewardLedger::new(&event.repo);

        ledger.give_reward(&give(&event, judge, alpha, 100.0)).await.unwrap();
        let result = ledger.give_reward(&give(&event, judge, beta, 100.0)).await.unwrap();

        assert_eq!(result.grantor_used, 200);
    }

    #[tokio::test]
    async fn test_pool_limit_reports_headroom_and_rejects_overflow() {
        let event = Event::new();
        let alpha = event.team("Alpha", 0).await;
        let beta = event.team("Beta", 1).await;
        let guest = event.participant("Gail", Role::Guest).await;
        event.policy(|p| p.vr_pool_guest = Some(100)).await;
        let ledger = RewardLedger::new(&event.repo);

        let result = ledger.give_reward(&give(&event, guest, alpha, 70.0)).await.unwrap();
        assert_eq!(result.grantor_limit, Some(100));
        assert_eq!(result.grantor_remaining, Some(30));

        let err = ledger
            .give_reward(&give(&event, guest, beta, 40.0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::PoolExceeded { requested: 40, used: 70, limit: 100, .. }
        ));

        // replacing the existing grant only counts the new amount
        let result = ledger.give_reward(&give(&event, guest, alpha, 100.0)).await.unwrap();
        assert_eq!(result.grantor_remaining, Some(0));
    }

    #[tokio::test]
    async fn test_reset_is_idempotent() {
        let event = Event::new();
        let team = event.team("Alpha", 0).await;
        let guest = event.participant("Gail", Role::Guest).await;
        let other = event.participant("Otto", Role::Guest).await;
        let ledger = RewardLedger::new(&event.repo);

        ledger.give_reward(&give(&event, guest, team, 50.0)).await.unwrap();
        ledger.give_reward(&give(&event, other, team, 20.0)).await.unwrap();

        let first = ledger.reset_reward(&reset(&event, guest, team)).await.unwrap();
        let second = ledger.reset_reward(&reset(&event, guest, team)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(second.team_total, 20);
        assert_eq!(second.grantor_used, 0);
    }

    #[tokio::test]
    async fn test_invalid_input_rejected_before_write() {
        let event = Event::new();
        let team = event.team("Alpha", 0).await;
        let guest = event.participant("Gail", Role::Guest).await;
        let presenter = event.participant("Pia", Role::Presenter).await;
        let ledger = RewardLedger::new(&event.repo);

        assert!(matches!(
            ledger.give_reward(&give(&event, guest, team, 12.5)).await,
            Err(EngineError::InvalidAmount { .. })
        ));
        assert!(matches!(
            ledger.give_reward(&give(&event, guest, team, -1.0)).await,
            Err(EngineError::InvalidAmount { .. })
        ));
        assert!(matches!(
            ledger.give_reward(&give(&event, presenter, team, 10.0)).await,
            Err(EngineError::GrantorNotFound(_))
        ));
        assert!(matches!(
            ledger.give_reward(&give(&event, guest, Uuid::new_v4(), 10.0)).await,
            Err(EngineError::TeamNotFound(_))
        ));
        assert!(event.repo.list_grants(event.event_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_totals_beyond_i64_are_rejected() {
        let event = Event::new();
        let team = event.team("Alpha", 0).await;
        let guest = event.participant("Gail", Role::Guest).await;
        let other = event.participant("Otto", Role::Guest).await;
        event
            .repo
            .upsert_grant(&seeded(&event, other, team, i64::MAX - 5), None)
            .await
            .unwrap();
        let ledger = RewardLedger::new(&event.repo);

        let err = ledger
            .give_reward(&give(&event, guest, team, 10.0))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::TotalOverflow(id) if id == team));
        assert_eq!(event.repo.list_grants(event.event_id).await.unwrap().len(), 1);

        event
            .repo
            .upsert_grant(&seeded(&event, guest, team, 10), None)
            .await
            .unwrap();
        assert!(matches!(
            ledger.get_team_total(event.event_id, team).await,
            Err(EngineError::TotalOverflow(_))
        ));
        assert!(matches!(
            ledger.team_totals(event.event_id).await,
            Err(EngineError::TotalOverflow(_))
        ));
    }

    #[tokio::test]
    async fn test_largest_amounts_still_sum() {
        let event = Event::new();
        let team = event.team("Alpha", 0).await;
        let guest = event.participant("Gail", Role::Guest).await;
        let other = event.participant("Otto", Role::Guest).await;
        let ledger = RewardLedger::new(&event.repo);
        let max = crate::dto::reward::MAX_AMOUNT as f64;

        ledger.give_reward(&give(&event, guest, team, max)).await.unwrap();
        let result = ledger.give_reward(&give(&event, other, team, max)).await.unwrap();

        assert_eq!(result.team_total, 2 * crate::dto::reward::MAX_AMOUNT);
    }

    #[tokio::test]
    async fn test_grants_by_grantor_sorted_by_amount() {
        let event = Event::new();
        let alpha = event.team("Alpha", 0).await;
        let beta = event.team("Beta", 1).await;
        let guest = event.participant("Gail", Role::Guest).await;
        let ledger = RewardLedger::new(&event.repo);

        ledger.give_reward(&give(&event, guest, alpha, 10.0)).await.unwrap();
        ledger.give_reward(&give(&event, guest, beta, 60.0)).await.unwrap();

        let grants = ledger.grants_by_grantor(event.event_id, guest).await.unwrap();
        let names: Vec<&str> = grants.iter().map(|g| g.team_name.as_str()).collect();
        assert_eq!(names, vec!["Beta", "Alpha"]);
    }
}
