use std::collections::HashSet;

use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::dto::grading::{CreateCriterionRequest, UpdateCriterionRequest};
use crate::error::{EngineError, Result};
use crate::models::{EvaluationCriterion, weights_balanced};
use crate::repository::EventRepository;

/// Weighted grading sheet of an event.
pub struct CriteriaRegistry<'a, R: EventRepository + ?Sized> {
    repo: &'a R,
}

impl<'a, R: EventRepository + ?Sized> CriteriaRegistry<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    pub async fn add_criterion(&self, request: &CreateCriterionRequest) -> Result<EvaluationCriterion> {
        request.validate()?;

        let sort_order = match request.sort_order {
            Some(order) => order,
            None => self
                .repo
                .list_criteria(request.event_id)
                .await?
                .iter()
                .map(|c| c.sort_order)
                .max()
                .map_or(0, |last| last + 1),
        };

        let criterion = EvaluationCriterion {
            criterion_id: Uuid::new_v4(),
            event_id: request.event_id,
            name: request.name.trim().to_string(),
            description: request.description.clone(),
            max_score: request.max_score,
            weight_percentage: request.weight_percentage,
            sort_order,
        };
        self.repo.upsert_criterion(&criterion).await?;

        info!(
            event_id = %criterion.event_id,
            criterion_id = %criterion.criterion_id,
            weight = criterion.weight_percentage,
            "Criterion added"
        );
        self.warn_if_unbalanced(request.event_id).await?;

        Ok(criterion)
    }

    pub async fn update_criterion(
        &self,
        event_id: Uuid,
        criterion_id: Uuid,
        request: &UpdateCriterionRequest,
    ) -> Result<EvaluationCriterion> {
        request.validate()?;

        let mut criterion = self
            .repo
            .find_criterion(event_id, criterion_id)
            .await?
            .ok_or(EngineError::CriterionNotFound(criterion_id))?;

        if let Some(ref name) = request.name {
            criterion.name = name.trim().to_string();
        }
        if request.description.is_some() {
            criterion.description = request.description.clone();
        }
        if let Some(max_score) = request.max_score {
            criterion.max_score = max_score;
        }
        if let Some(weight) = request.weight_percentage {
            criterion.weight_percentage = weight;
        }
        if let Some(order) = request.sort_order {
            criterion.sort_order = order;
        }

        self.repo.upsert_criterion(&criterion).await?;
        info!(event_id = %event_id, criterion_id = %criterion_id, "Criterion updated");
        self.warn_if_unbalanced(event_id).await?;

        Ok(criterion)
    }

    /// Scores referencing the criterion are kept; see [`Self::purge_orphaned_scores`].
    pub async fn remove_criterion(&self, event_id: Uuid, criterion_id: Uuid) -> Result<()> {
        if !self.repo.delete_criterion(event_id, criterion_id).await? {
            return Err(EngineError::CriterionNotFound(criterion_id));
        }
        info!(event_id = %event_id, criterion_id = %criterion_id, "Criterion removed");
        Ok(())
    }

    /// Deletes scores whose criterion no longer exists. Returns the number removed.
    pub async fn purge_orphaned_scores(&self, event_id: Uuid) -> Result<u64> {
        let live: HashSet<Uuid> = self
            .repo
            .list_criteria(event_id)
            .await?
            .into_iter()
            .map(|c| c.criterion_id)
            .collect();

        let mut removed = 0;
        for score in self.repo.list_scores(event_id).await? {
            if live.contains(&score.criterion_id) {
                continue;
            }
            if self
                .repo
                .delete_score(event_id, score.committee_id, score.team_id, score.criterion_id)
                .await?
            {
                removed += 1;
            }
        }

        if removed > 0 {
            info!(event_id = %event_id, removed, "Orphaned criterion scores purged");
        }
        Ok(removed)
    }

    pub async fn list_criteria(&self, event_id: Uuid) -> Result<Vec<EvaluationCriterion>> {
        Ok(self.repo.list_criteria(event_id).await?)
    }

    pub async fn total_weight(&self, event_id: Uuid) -> Result<f64> {
        let criteria = self.repo.list_criteria(event_id).await?;
        Ok(criteria.iter().map(|c| c.weight_percentage).sum())
    }

    pub async fn is_balanced(&self, event_id: Uuid) -> Result<bool> {
        Ok(weights_balanced(self.total_weight(event_id).await?))
    }

    async fn warn_if_unbalanced(&self, event_id: Uuid) -> Result<()> {
        let total = self.total_weight(event_id).await?;
        if !weights_balanced(total) {
            warn!(event_id = %event_id, total_weight = total, "Criterion weights do not sum to 100");
        }
        Ok(())
    }
}
