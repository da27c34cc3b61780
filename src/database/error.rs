use std::{
    collections::BTreeMap,
    fmt::{self, Display},
};

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use warp::{http::StatusCode, reject::Reject};

use crate::constants::{CONSTRAINT_FIELDS, SESSION_USER_FOREIGN_KEYS};

/// Per-field validation messages, serialized as `{"field": ["message"]}`.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.0.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `value` when no errors were collected.
    pub fn into_result<T>(self, value: T) -> Result<T, ApiError> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(ApiError::Validation(self))
        }
    }
}

impl Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = self
            .0
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
            .collect::<Vec<String>>();

        write!(f, "{}", parts.join("; "))
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation failed ({0})")]
    Validation(FieldErrors),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Not found.")]
    NotFound,

    #[error("Invalid page.")]
    InvalidPage,

    #[error("Authentication credentials were not provided.")]
    Unauthorized,

    #[error("Invalid session; {0}")]
    InvalidSession(String),

    #[error("You do not have permission to perform this action.")]
    Forbidden,

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(FieldErrors::single(field, message))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound | ApiError::InvalidPage => StatusCode::NOT_FOUND,
            ApiError::Unauthorized | ApiError::InvalidSession(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> Value {
        match self {
            ApiError::Validation(errors) => json!(errors),
            ApiError::InvalidRequest(info) => json!({ "errors": info }),
            ApiError::Internal(_) => json!({ "detail": "Internal server error." }),
            _ => json!({ "detail": self.to_string() }),
        }
    }
}

impl Reject for ApiError {}

/// What a failed statement violated, when it maps back to the request.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Violation {
    Field(&'static str, &'static str),
    StaleSession,
}

/// A failed query. Unique and check violations of known constraints carry the
/// request field they belong to; foreign keys to the acting user mean the
/// account is gone.
#[derive(Error, Debug)]
#[error("{info}")]
pub struct QueryError {
    info: String,
    violation: Option<Violation>,
}

impl QueryError {
    pub fn new(info: String) -> Self {
        Self {
            info,
            violation: None,
        }
    }
}

fn constraint_violation(constraint: &str) -> Option<Violation> {
    CONSTRAINT_FIELDS
        .iter()
        .find(|(name, _, _)| *name == constraint)
        .map(|(_, field, message)| Violation::Field(field, message))
}

fn foreign_key_violation(constraint: &str) -> Option<Violation> {
    SESSION_USER_FOREIGN_KEYS
        .contains(&constraint)
        .then_some(Violation::StaleSession)
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Database(e) => {
                let violation = if e.is_unique_violation() || e.is_check_violation() {
                    e.constraint().and_then(constraint_violation)
                } else if e.is_foreign_key_violation() {
                    e.constraint().and_then(foreign_key_violation)
                } else {
                    None
                };

                Self {
                    info: format!("{e}"),
                    violation,
                }
            }
            sqlx::Error::RowNotFound => Self::new(String::from("RowNotFound")),
            sqlx::Error::PoolTimedOut => Self::new(String::from("Pool timed out")),
            sqlx::Error::PoolClosed => Self::new(String::from("Pool closed")),
            sqlx::Error::WorkerCrashed => Self::new(String::from("Worker crashed")),
            e => Self::new(format!("{e}")),
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(value: QueryError) -> Self {
        match value.violation {
            Some(Violation::Field(field, message)) => ApiError::invalid(field, message),
            Some(Violation::StaleSession) => {
                log::warn!("Session user vanished: {}", value.info);
                ApiError::InvalidSession(String::from("User no longer exists"))
            }
            None => {
                log::error!("Query failed: {}", value.info);
                ApiError::Internal(value.info)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_collect_per_field() {
        let mut errors = FieldErrors::new();
        assert!(errors.is_empty());

        errors.add("tags", "first");
        errors.add("tags", "second");
        errors.add("name", "third");

        assert_eq!(errors.get("tags").map(Vec::len), Some(2));
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            json!({ "name": ["third"], "tags": ["first", "second"] })
        );
        assert!(errors.into_result(()).is_err());
        assert!(FieldErrors::new().into_result(1).is_ok());
    }

    #[test]
    fn statuses_and_bodies() {
        let err = ApiError::invalid("cooking_time", "too small");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.body(), json!({ "cooking_time": ["too small"] }));

        let err = ApiError::InvalidRequest(String::from("Recipe is not in the list."));
        assert_eq!(err.body(), json!({ "errors": "Recipe is not in the list." }));

        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::InvalidPage.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::InvalidPage.body(), json!({ "detail": "Invalid page." }));
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);

        let err = ApiError::Internal(String::from("relation \"users\" does not exist"));
        assert_eq!(err.body(), json!({ "detail": "Internal server error." }));
    }

    #[test]
    fn known_constraints_map_to_fields() {
        assert_eq!(
            constraint_violation("recipes_name_key"),
            Some(Violation::Field("name", "Recipe with this name already exists."))
        );
        assert_eq!(constraint_violation("unknown_constraint"), None);

        let err: ApiError = QueryError::new(String::from("boom")).into();
        assert!(matches!(err, ApiError::Internal(_)));
    }

    #[test]
    fn vanished_user_is_a_stale_session() {
        for constraint in ["recipes_author_id_fkey", "favorites_user_id_fkey", "shopping_carts_user_id_fkey"] {
            assert_eq!(foreign_key_violation(constraint), Some(Violation::StaleSession));
        }
        assert_eq!(foreign_key_violation("recipe_tags_tag_id_fkey"), None);

        let err: ApiError = QueryError {
            info: String::from("insert or update on table \"favorites\" violates foreign key constraint"),
            violation: Some(Violation::StaleSession),
        }
        .into();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn api_errors_are_warp_rejections() {
        let rejection = warp::Rejection::from(ApiError::NotFound);
        assert!(matches!(rejection.find::<ApiError>(), Some(ApiError::NotFound)));
    }
}
