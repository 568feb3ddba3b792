use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{EventRepository, GrantWrite, VoteWrite};
use crate::error::{StorageError, StorageResult};
use crate::models::{
    AwardVote, CriterionScore, EvaluationCriterion, Participant, RewardGrant, RewardPolicy,
    SpecialAward, Team,
};

#[derive(FromRow)]
struct ParticipantRow {
    event_id: Uuid,
    user_id: Uuid,
    role: String,
    display_name: String,
}

impl TryFrom<ParticipantRow> for Participant {
    type Error = StorageError;

    fn try_from(row: ParticipantRow) -> StorageResult<Self> {
        let role = row.role.parse().map_err(StorageError::ConstraintViolation)?;
        Ok(Participant {
            event_id: row.event_id,
            user_id: row.user_id,
            role,
            display_name: row.display_name,
        })
    }
}

#[derive(FromRow)]
struct CriterionRow {
    criterion_id: Uuid,
    event_id: Uuid,
    name: String,
    description: Option<String>,
    max_score: Decimal,
    weight_percentage: Decimal,
    sort_order: i32,
}

impl TryFrom<CriterionRow> for EvaluationCriterion {
    type Error = StorageError;

    fn try_from(row: CriterionRow) -> StorageResult<Self> {
        Ok(EvaluationCriterion {
            criterion_id: row.criterion_id,
            event_id: row.event_id,
            name: row.name,
            description: row.description,
            max_score: decimal_to_f64(row.max_score)?,
            weight_percentage: decimal_to_f64(row.weight_percentage)?,
            sort_order: row.sort_order,
        })
    }
}

#[derive(FromRow)]
struct ScoreRow {
    event_id: Uuid,
    committee_id: Uuid,
    team_id: Uuid,
    criterion_id: Uuid,
    value: Decimal,
    updated_at: NaiveDateTime,
}

impl TryFrom<ScoreRow> for CriterionScore {
    type Error = StorageError;

    fn try_from(row: ScoreRow) -> StorageResult<Self> {
        Ok(CriterionScore {
            event_id: row.event_id,
            committee_id: row.committee_id,
            team_id: row.team_id,
            criterion_id: row.criterion_id,
            value: decimal_to_f64(row.value)?,
            updated_at: row.updated_at,
        })
    }
}

/// Postgres-backed store. Schema lives in `crates/engine/migrations`.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Serialises guarded writes per participant for the rest of the transaction.
    async fn lock_participant(
        tx: &mut Transaction<'_, Postgres>,
        event_id: Uuid,
        user_id: Uuid,
    ) -> StorageResult<()> {
        sqlx::query("SELECT 1 FROM participants WHERE event_id = $1 AND user_id = $2 FOR UPDATE")
            .bind(event_id)
            .bind(user_id)
            .fetch_optional(&mut **tx)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl EventRepository for PgRepository {
    async fn list_teams(&self, event_id: Uuid) -> StorageResult<Vec<Team>> {
        let teams = sqlx::query_as::<_, Team>(
            r#"
            SELECT team_id, event_id, name, presenter_name, created_at
            FROM teams
            WHERE event_id = $1
            ORDER BY created_at, team_id
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(teams)
    }

    async fn find_team(&self, event_id: Uuid, team_id: Uuid) -> StorageResult<Option<Team>> {
        let team = sqlx::query_as::<_, Team>(
            r#"
            SELECT team_id, event_id, name, presenter_name, created_at
            FROM teams
            WHERE event_id = $1 AND team_id = $2
            "#,
        )
        .bind(event_id)
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(team)
    }

    async fn upsert_team(&self, team: &Team) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO teams (team_id, event_id, name, presenter_name, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (team_id)
            DO UPDATE SET
                name = EXCLUDED.name,
                presenter_name = EXCLUDED.presenter_name
            "#,
        )
        .bind(team.team_id)
        .bind(team.event_id)
        .bind(&team.name)
        .bind(&team.presenter_name)
        .bind(team.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_team(&self, event_id: Uuid, team_id: Uuid) -> StorageResult<bool> {
        // grants, votes and scores go with it via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM teams WHERE event_id = $1 AND team_id = $2")
            .bind(event_id)
            .bind(team_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_participants(&self, event_id: Uuid) -> StorageResult<Vec<Participant>> {
        let rows = sqlx::query_as::<_, ParticipantRow>(
            r#"
            SELECT event_id, user_id, role, display_name
            FROM participants
            WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Participant::try_from).collect()
    }

    async fn find_participant(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> StorageResult<Option<Participant>> {
        let row = sqlx::query_as::<_, ParticipantRow>(
            r#"
            SELECT event_id, user_id, role, display_name
            FROM participants
            WHERE event_id = $1 AND user_id = $2
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Participant::try_from).transpose()
    }

    async fn upsert_participant(&self, participant: &Participant) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO participants (event_id, user_id, role, display_name)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (event_id, user_id)
            DO UPDATE SET
                role = EXCLUDED.role,
                display_name = EXCLUDED.display_name
            "#,
        )
        .bind(participant.event_id)
        .bind(participant.user_id)
        .bind(participant.role.as_str())
        .bind(&participant.display_name)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_reward_policy(&self, event_id: Uuid) -> StorageResult<Option<RewardPolicy>> {
        let policy = sqlx::query_as::<_, RewardPolicy>(
            r#"
            SELECT event_id, vr_team_cap_enabled, vr_team_cap_guest, vr_team_cap_committee,
                   vr_pool_guest, vr_pool_committee, exclusive_team_awards
            FROM reward_policies
            WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(policy)
    }

    async fn upsert_reward_policy(&self, policy: &RewardPolicy) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO reward_policies (
                event_id, vr_team_cap_enabled, vr_team_cap_guest, vr_team_cap_committee,
                vr_pool_guest, vr_pool_committee, exclusive_team_awards
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (event_id)
            DO UPDATE SET
                vr_team_cap_enabled = EXCLUDED.vr_team_cap_enabled,
                vr_team_cap_guest = EXCLUDED.vr_team_cap_guest,
                vr_team_cap_committee = EXCLUDED.vr_team_cap_committee,
                vr_pool_guest = EXCLUDED.vr_pool_guest,
                vr_pool_committee = EXCLUDED.vr_pool_committee,
                exclusive_team_awards = EXCLUDED.exclusive_team_awards
            "#,
        )
        .bind(policy.event_id)
        .bind(policy.vr_team_cap_enabled)
        .bind(policy.vr_team_cap_guest)
        .bind(policy.vr_team_cap_committee)
        .bind(policy.vr_pool_guest)
        .bind(policy.vr_pool_committee)
        .bind(policy.exclusive_team_awards)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_grants(&self, event_id: Uuid) -> StorageResult<Vec<RewardGrant>> {
        let grants = sqlx::query_as::<_, RewardGrant>(
            r#"
            SELECT event_id, grantor_id, team_id, amount, updated_at
            FROM reward_grants
            WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(grants)
    }

    async fn list_grants_by_grantor(
        &self,
        event_id: Uuid,
        grantor_id: Uuid,
    ) -> StorageResult<Vec<RewardGrant>> {
        let grants = sqlx::query_as::<_, RewardGrant>(
            r#"
            SELECT event_id, grantor_id, team_id, amount, updated_at
            FROM reward_grants
            WHERE event_id = $1 AND grantor_id = $2
            "#,
        )
        .bind(event_id)
        .bind(grantor_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(grants)
    }

    async fn list_grants_by_team(
        &self,
        event_id: Uuid,
        team_id: Uuid,
    ) -> StorageResult<Vec<RewardGrant>> {
        let grants = sqlx::query_as::<_, RewardGrant>(
            r#"
            SELECT event_id, grantor_id, team_id, amount, updated_at
            FROM reward_grants
            WHERE event_id = $1 AND team_id = $2
            "#,
        )
        .bind(event_id)
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(grants)
    }

    async fn upsert_grant(
        &self,
        grant: &RewardGrant,
        pool_limit: Option<i64>,
    ) -> StorageResult<GrantWrite> {
        let mut tx = self.pool.begin().await?;
        Self::lock_participant(&mut tx, grant.event_id, grant.grantor_id).await?;

        if let Some(limit) = pool_limit {
            // SUM(bigint) is NUMERIC, so the total cannot wrap
            let used: Option<Decimal> = sqlx::query_scalar(
                r#"
                SELECT SUM(amount)
                FROM reward_grants
                WHERE event_id = $1 AND grantor_id = $2 AND team_id <> $3
                "#,
            )
            .bind(grant.event_id)
            .bind(grant.grantor_id)
            .bind(grant.team_id)
            .fetch_one(&mut *tx)
            .await?;

            let used = used.unwrap_or(Decimal::ZERO);
            if used + Decimal::from(grant.amount) > Decimal::from(limit) {
                tx.rollback().await?;
                return Ok(GrantWrite::PoolExceeded {
                    used_elsewhere: used.to_i64().unwrap_or(i64::MAX),
                    limit,
                });
            }
        }

        sqlx::query(
            r#"
            INSERT INTO reward_grants (event_id, grantor_id, team_id, amount, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (event_id, grantor_id, team_id)
            DO UPDATE SET
                amount = EXCLUDED.amount,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(grant.event_id)
        .bind(grant.grantor_id)
        .bind(grant.team_id)
        .bind(grant.amount)
        .bind(grant.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(GrantWrite::Written)
    }

    async fn delete_grant(
        &self,
        event_id: Uuid,
        grantor_id: Uuid,
        team_id: Uuid,
    ) -> StorageResult<bool> {
        let result = sqlx::query(
            "DELETE FROM reward_grants WHERE event_id = $1 AND grantor_id = $2 AND team_id = $3",
        )
        .bind(event_id)
        .bind(grantor_id)
        .bind(team_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_awards(&self, event_id: Uuid) -> StorageResult<Vec<SpecialAward>> {
        let awards = sqlx::query_as::<_, SpecialAward>(
            r#"
            SELECT award_id, event_id, name, image_url, created_at
            FROM special_awards
            WHERE event_id = $1
            ORDER BY created_at, award_id
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(awards)
    }

    async fn find_award(
        &self,
        event_id: Uuid,
        award_id: Uuid,
    ) -> StorageResult<Option<SpecialAward>> {
        let award = sqlx::query_as::<_, SpecialAward>(
            r#"
            SELECT award_id, event_id, name, image_url, created_at
            FROM special_awards
            WHERE event_id = $1 AND award_id = $2
            "#,
        )
        .bind(event_id)
        .bind(award_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(award)
    }

    async fn upsert_award(&self, award: &SpecialAward) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO special_awards (award_id, event_id, name, image_url, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (award_id)
            DO UPDATE SET
                name = EXCLUDED.name,
                image_url = EXCLUDED.image_url
            "#,
        )
        .bind(award.award_id)
        .bind(award.event_id)
        .bind(&award.name)
        .bind(&award.image_url)
        .bind(award.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_votes(&self, event_id: Uuid) -> StorageResult<Vec<AwardVote>> {
        let votes = sqlx::query_as::<_, AwardVote>(
            r#"
            SELECT event_id, committee_id, award_id, team_id, updated_at
            FROM special_award_votes
            WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(votes)
    }

    async fn list_votes_for_award(
        &self,
        event_id: Uuid,
        award_id: Uuid,
    ) -> StorageResult<Vec<AwardVote>> {
        let votes = sqlx::query_as::<_, AwardVote>(
            r#"
            SELECT event_id, committee_id, award_id, team_id, updated_at
            FROM special_award_votes
            WHERE event_id = $1 AND award_id = $2
            "#,
        )
        .bind(event_id)
        .bind(award_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(votes)
    }

    async fn list_votes_by_committee(
        &self,
        event_id: Uuid,
        committee_id: Uuid,
    ) -> StorageResult<Vec<AwardVote>> {
        let votes = sqlx::query_as::<_, AwardVote>(
            r#"
            SELECT event_id, committee_id, award_id, team_id, updated_at
            FROM special_award_votes
            WHERE event_id = $1 AND committee_id = $2
            "#,
        )
        .bind(event_id)
        .bind(committee_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(votes)
    }

    async fn upsert_vote(
        &self,
        vote: &AwardVote,
        exclusive: bool,
    ) -> StorageResult<VoteWrite> {
        let mut tx = self.pool.begin().await?;

        if exclusive {
            Self::lock_participant(&mut tx, vote.event_id, vote.committee_id).await?;

            let clash: Option<Uuid> = sqlx::query_scalar(
                r#"
                SELECT award_id
                FROM special_award_votes
                WHERE event_id = $1 AND committee_id = $2 AND team_id = $3 AND award_id <> $4
                LIMIT 1
                "#,
            )
            .bind(vote.event_id)
            .bind(vote.committee_id)
            .bind(vote.team_id)
            .bind(vote.award_id)
            .fetch_optional(&mut *tx)
            .await?;

            if let Some(award_id) = clash {
                tx.rollback().await?;
                return Ok(VoteWrite::TeamAlreadyAwarded { award_id });
            }
        }

        sqlx::query(
            r#"
            INSERT INTO special_award_votes (event_id, committee_id, award_id, team_id, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (event_id, committee_id, award_id)
            DO UPDATE SET
                team_id = EXCLUDED.team_id,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(vote.event_id)
        .bind(vote.committee_id)
        .bind(vote.award_id)
        .bind(vote.team_id)
        .bind(vote.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(VoteWrite::Written)
    }

    async fn delete_vote(
        &self,
        event_id: Uuid,
        committee_id: Uuid,
        award_id: Uuid,
    ) -> StorageResult<bool> {
        let result = sqlx::query(
            "DELETE FROM special_award_votes WHERE event_id = $1 AND committee_id = $2 AND award_id = $3",
        )
        .bind(event_id)
        .bind(committee_id)
        .bind(award_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_criteria(&self, event_id: Uuid) -> StorageResult<Vec<EvaluationCriterion>> {
        let rows = sqlx::query_as::<_, CriterionRow>(
            r#"
            SELECT criterion_id, event_id, name, description, max_score, weight_percentage, sort_order
            FROM evaluation_criteria
            WHERE event_id = $1
            ORDER BY sort_order, name
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(EvaluationCriterion::try_from).collect()
    }

    async fn find_criterion(
        &self,
        event_id: Uuid,
        criterion_id: Uuid,
    ) -> StorageResult<Option<EvaluationCriterion>> {
        let row = sqlx::query_as::<_, CriterionRow>(
            r#"
            SELECT criterion_id, event_id, name, description, max_score, weight_percentage, sort_order
            FROM evaluation_criteria
            WHERE event_id = $1 AND criterion_id = $2
            "#,
        )
        .bind(event_id)
        .bind(criterion_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(EvaluationCriterion::try_from).transpose()
    }

    async fn upsert_criterion(&self, criterion: &EvaluationCriterion) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO evaluation_criteria (
                criterion_id, event_id, name, description, max_score, weight_percentage, sort_order
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (criterion_id)
            DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                max_score = EXCLUDED.max_score,
                weight_percentage = EXCLUDED.weight_percentage,
                sort_order = EXCLUDED.sort_order
            "#,
        )
        .bind(criterion.criterion_id)
        .bind(criterion.event_id)
        .bind(&criterion.name)
        .bind(&criterion.description)
        .bind(f64_to_decimal(criterion.max_score)?)
        .bind(f64_to_decimal(criterion.weight_percentage)?)
        .bind(criterion.sort_order)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_criterion(&self, event_id: Uuid, criterion_id: Uuid) -> StorageResult<bool> {
        let result =
            sqlx::query("DELETE FROM evaluation_criteria WHERE event_id = $1 AND criterion_id = $2")
                .bind(event_id)
                .bind(criterion_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_scores(&self, event_id: Uuid) -> StorageResult<Vec<CriterionScore>> {
        let rows = sqlx::query_as::<_, ScoreRow>(
            r#"
            SELECT event_id, committee_id, team_id, criterion_id, value, updated_at
            FROM criterion_scores
            WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CriterionScore::try_from).collect()
    }

    async fn upsert_score(&self, score: &CriterionScore) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO criterion_scores (event_id, committee_id, team_id, criterion_id, value, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (committee_id, team_id, criterion_id)
            DO UPDATE SET
                value = EXCLUDED.value,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(score.event_id)
        .bind(score.committee_id)
        .bind(score.team_id)
        .bind(score.criterion_id)
        .bind(f64_to_decimal(score.value)?)
        .bind(score.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_score(
        &self,
        event_id: Uuid,
        committee_id: Uuid,
        team_id: Uuid,
        criterion_id: Uuid,
    ) -> StorageResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM criterion_scores
            WHERE event_id = $1 AND committee_id = $2 AND team_id = $3 AND criterion_id = $4
            "#,
        )
        .bind(event_id)
        .bind(committee_id)
        .bind(team_id)
        .bind(criterion_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_feedback(&self, event_id: Uuid, author_id: Option<Uuid>) -> StorageResult<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM feedback
            WHERE event_id = $1 AND ($2::uuid IS NULL OR author_id = $2)
            "#,
        )
        .bind(event_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.max(0) as u64)
    }
}

fn decimal_to_f64(decimal: Decimal) -> StorageResult<f64> {
    decimal.to_f64().ok_or_else(|| {
        StorageError::ConstraintViolation(format!("NUMERIC {} cannot be read as f64", decimal))
    })
}

fn f64_to_decimal(value: f64) -> StorageResult<Decimal> {
    Decimal::try_from(value).map_err(|e| {
        StorageError::ConstraintViolation(format!("{} cannot be stored as NUMERIC: {}", value, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_conversions() {
        assert_eq!(decimal_to_f64(Decimal::new(755, 1)).unwrap(), 75.5);
        assert_eq!(f64_to_decimal(12.25).unwrap(), Decimal::new(1225, 2));
        assert!(matches!(
            f64_to_decimal(f64::NAN),
            Err(StorageError::ConstraintViolation(_))
        ));
    }

    #[test]
    fn test_score_row_conversion_keeps_value() {
        let row = ScoreRow {
            event_id: Uuid::new_v4(),
            committee_id: Uuid::new_v4(),
            team_id: Uuid::new_v4(),
            criterion_id: Uuid::new_v4(),
            value: Decimal::new(85, 1),
            updated_at: chrono::Utc::now().naive_utc(),
        };

        let score = CriterionScore::try_from(row).unwrap();
        assert_eq!(score.value, 8.5);
    }
}
