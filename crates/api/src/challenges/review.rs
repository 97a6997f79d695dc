// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use juniper::GraphQLEnum;
use uuid::Uuid;

use super::{ServiceError, ServiceResult};
use crate::db::{
    Store,
    models::{ReviewUpdate, Verification, VerificationStatus},
};

#[derive(GraphQLEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    Approve,
    Reject,
}

#[derive(Debug, Clone)]
pub struct ReviewRequest {
    pub action: ReviewAction,
    pub verification_id: Uuid,
    pub admin_id: Uuid,
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub verification: Verification,
    /// `false` when the verification already carried this exact outcome.
    pub changed: bool,
}

pub async fn approve(
    store: &dyn Store,
    verification_id: Uuid,
    admin_id: Uuid,
) -> ServiceResult<ReviewOutcome> {
    apply(
        store,
        verification_id,
        ReviewUpdate {
            status: VerificationStatus::Approved,
            reviewed_at: chrono::Utc::now(),
            reviewed_by: admin_id,
            rejection_reason: None,
        },
    )
    .await
}

pub async fn reject(
    store: &dyn Store,
    verification_id: Uuid,
    admin_id: Uuid,
    reason: &str,
) -> ServiceResult<ReviewOutcome> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(ServiceError::validation(
            "A reason is required to reject a verification",
        ));
    }
    apply(
        store,
        verification_id,
        ReviewUpdate {
            status: VerificationStatus::Rejected,
            reviewed_at: chrono::Utc::now(),
            reviewed_by: admin_id,
            rejection_reason: Some(reason.to_string()),
        },
    )
    .await
}

pub async fn review(store: &dyn Store, request: ReviewRequest) -> ServiceResult<ReviewOutcome> {
    match request.action {
        ReviewAction::Approve => approve(store, request.verification_id, request.admin_id).await,
        ReviewAction::Reject => {
            reject(
                store,
                request.verification_id,
                request.admin_id,
                request.reason.as_deref().unwrap_or_default(),
            )
            .await
        }
    }
}

async fn apply(
    store: &dyn Store,
    verification_id: Uuid,
    update: ReviewUpdate,
) -> ServiceResult<ReviewOutcome> {
    let target = update.status;
    if let Some(verification) = store.review_verification(verification_id, update).await? {
        tracing::info!(
            "Verification {verification_id} marked {target:?} by {}",
            verification.reviewed_by.unwrap_or_default()
        );
        return Ok(ReviewOutcome {
            verification,
            changed: true,
        });
    }

    // The conditional update matched nothing: find out why.
    match store.get_verification(verification_id).await? {
        None => Err(ServiceError::NotFound(format!(
            "Verification {verification_id}"
        ))),
        Some(verification) if verification.status == target => Ok(ReviewOutcome {
            verification,
            changed: false,
        }),
        Some(verification) => Err(ServiceError::AlreadyReviewed {
            id: verification_id,
            status: verification.status,
        }),
    }
}
