use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use engine::error::{EngineError, StorageError};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

/// Web layer errors
#[derive(Debug)]
pub enum WebError {
    Engine(EngineError),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Engine(e) => write!(f, "{}", e),
        }
    }
}

impl WebError {
    pub fn status_code(&self) -> StatusCode {
        let Self::Engine(e) = self;
        match e {
            EngineError::Validation(_) => StatusCode::BAD_REQUEST,
            EngineError::InvalidAmount { .. }
            | EngineError::ScoreOutOfRange { .. }
            | EngineError::TotalOverflow(_) => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::AwardNotFound(_)
            | EngineError::TeamNotFound(_)
            | EngineError::CriterionNotFound(_)
            | EngineError::GrantorNotFound(_)
            | EngineError::Storage(StorageError::NotFound) => StatusCode::NOT_FOUND,
            EngineError::CapExceeded { .. }
            | EngineError::PoolExceeded { .. }
            | EngineError::TeamAlreadyAwarded { .. }
            | EngineError::Storage(StorageError::ConstraintViolation(_)) => StatusCode::CONFLICT,
            EngineError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        let body = match &self {
            Self::Engine(EngineError::Validation(errors)) => {
                json!({
                    "error": "Validation failed",
                    "details": field_messages(errors)
                })
            }
            Self::Engine(EngineError::Storage(e)) if status_code.is_server_error() => {
                tracing::error!("Storage error: {:?}", e);
                json!({
                    "error": "An internal error occurred, please try again"
                })
            }
            Self::Engine(e) => {
                json!({
                    "error": e.to_string()
                })
            }
        };

        (status_code, Json(body)).into_response()
    }
}

fn field_messages(errors: &ValidationErrors) -> Vec<String> {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |e| {
                format!(
                    "{}: {}",
                    field,
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                )
            })
        })
        .collect()
}

impl From<EngineError> for WebError {
    fn from(error: EngineError) -> Self {
        Self::Engine(error)
    }
}

pub type ApiResult<T> = Result<T, WebError>;

#[cfg(test)]
mod tests {
    use super::*;
    use engine::error::SqlxError;
    use engine::models::Role;
    use uuid::Uuid;

    fn status(error: EngineError) -> StatusCode {
        WebError::from(error).into_response().status()
    }

    #[test]
    fn test_rule_violations_are_conflicts() {
        assert_eq!(
            status(EngineError::CapExceeded {
                role: Role::Guest,
                amount: 120,
                cap: 100
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(EngineError::TeamAlreadyAwarded {
                team_id: Uuid::new_v4(),
                award_id: Uuid::new_v4()
            }),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_bad_numbers_are_unprocessable() {
        assert_eq!(
            status(EngineError::InvalidAmount { value: 1.5 }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status(EngineError::ScoreOutOfRange {
                value: 11.0,
                max: 10.0
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status(EngineError::TotalOverflow(Uuid::new_v4())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_missing_references_are_not_found() {
        assert_eq!(
            status(EngineError::TeamNotFound(Uuid::new_v4())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(EngineError::GrantorNotFound(Uuid::new_v4())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_storage_failures_are_internal() {
        assert_eq!(
            status(EngineError::Storage(StorageError::Database(
                SqlxError::PoolClosed
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(EngineError::Storage(StorageError::ConstraintViolation(
                "duplicate".to_string()
            ))),
            StatusCode::CONFLICT
        );
    }
}
