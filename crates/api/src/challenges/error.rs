// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use juniper::{FieldError, IntoFieldError, Object, ScalarValue, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::db::StoreError;

/// Stable, machine-checkable error kinds exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    AlreadyReviewed,
    StoreUnavailable,
    PartialReconciliation,
    Unauthenticated,
    Forbidden,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::AlreadyReviewed => "ALREADY_REVIEWED",
            ErrorKind::StoreUnavailable => "STORE_UNAVAILABLE",
            ErrorKind::PartialReconciliation => "PARTIAL_RECONCILIATION",
            ErrorKind::Unauthenticated => "UNAUTHENTICATED",
            ErrorKind::Forbidden => "FORBIDDEN",
        }
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Verification {id} was already reviewed as {status:?}")]
    AlreadyReviewed {
        id: Uuid,
        status: crate::db::models::VerificationStatus,
    },
    #[error("Backing store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
    #[error("Reconciliation incomplete: {} challenge(s) failed to persist", failed.len())]
    PartialReconciliation {
        succeeded: Vec<String>,
        failed: Vec<String>,
    },
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Insufficient permissions")]
    Forbidden,
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Validation(_) => ErrorKind::Validation,
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::AlreadyReviewed { .. } => ErrorKind::AlreadyReviewed,
            ServiceError::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            ServiceError::PartialReconciliation { .. } => ErrorKind::PartialReconciliation,
            ServiceError::Unauthenticated => ErrorKind::Unauthenticated,
            ServiceError::Forbidden => ErrorKind::Forbidden,
        }
    }
}

fn string_list<S: ScalarValue>(items: &[String]) -> Value<S> {
    Value::list(items.iter().map(|i| Value::scalar(i.clone())).collect())
}

impl<S: ScalarValue> IntoFieldError<S> for ServiceError {
    fn into_field_error(self) -> FieldError<S> {
        let mut extensions = Object::with_capacity(3);
        extensions.add_field("kind", Value::scalar(self.kind().as_str().to_string()));
        if let ServiceError::PartialReconciliation { succeeded, failed } = &self {
            extensions.add_field("succeeded", string_list(succeeded));
            extensions.add_field("failed", string_list(failed));
        }
        FieldError::new(self.to_string(), Value::Object(extensions))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use juniper::{DefaultScalarValue, graphql_value};

    use super::*;

    fn field_error(err: ServiceError) -> FieldError<DefaultScalarValue> {
        err.into_field_error()
    }

    #[test]
    fn test_error_kind_in_extensions() {
        let err = field_error(ServiceError::NotFound("Verification x".to_string()));
        assert_eq!(err.message(), "Verification x not found");
        assert_eq!(err.extensions(), &graphql_value!({ "kind": "NOT_FOUND" }));
    }

    #[test]
    fn test_partial_reconciliation_lists_ids() {
        let err = field_error(ServiceError::PartialReconciliation {
            succeeded: vec!["FIRST_VISIT".to_string()],
            failed: vec!["SHARE_SITE".to_string()],
        });
        assert_eq!(
            err.extensions(),
            &graphql_value!({
                "kind": "PARTIAL_RECONCILIATION",
                "succeeded": ["FIRST_VISIT"],
                "failed": ["SHARE_SITE"]
            })
        );
    }

    #[test]
    fn test_store_errors_are_unavailable() {
        let err: ServiceError = StoreError::Connection("refused".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
    }
}
