use thiserror::Error;
use uuid::Uuid;
use validator::ValidationErrors;

use crate::models::Role;

pub use sqlx::Error as SqlxError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

impl StorageError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23505")
        )
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23503")
        )
    }
}

/// Errors returned by the engine's public operations.
///
/// Every variant except `Storage` is raised before any write is attempted.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid amount {value}: must be a non-negative whole number")]
    InvalidAmount { value: f64 },

    #[error("Amount {amount} exceeds the {role} team cap of {cap}")]
    CapExceeded { role: Role, amount: i64, cap: i64 },

    #[error("Amount {requested} exceeds the {role} reward pool ({used} of {limit} already used)")]
    PoolExceeded {
        role: Role,
        requested: i64,
        used: i64,
        limit: i64,
    },

    #[error("Reward total for {0} exceeds the supported range")]
    TotalOverflow(Uuid),

    #[error("Special award {0} not found")]
    AwardNotFound(Uuid),

    #[error("Team {0} not found")]
    TeamNotFound(Uuid),

    #[error("Criterion {0} not found")]
    CriterionNotFound(Uuid),

    #[error("Participant {0} cannot act as a grantor in this event")]
    GrantorNotFound(Uuid),

    #[error("Team {team_id} already holds award {award_id} from this committee member")]
    TeamAlreadyAwarded { team_id: Uuid, award_id: Uuid },

    #[error("Score {value} is outside the allowed range 0..={max}")]
    ScoreOutOfRange { value: f64, max: f64 },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// True for errors caused by the caller's input rather than the store.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, EngineError::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cap_exceeded_message_names_limit() {
        let err = EngineError::CapExceeded {
            role: Role::Guest,
            amount: 150,
            cap: 100,
        };
        assert_eq!(err.to_string(), "Amount 150 exceeds the guest team cap of 100");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_storage_error_is_not_client_error() {
        let err = EngineError::from(StorageError::NotFound);
        assert!(!err.is_client_error());
        assert!(!StorageError::NotFound.is_unique_violation());
    }
}
