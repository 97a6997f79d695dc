// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use juniper::{GraphQLObject, graphql_object};

use crate::{
    challenges::{
        ChallengeDefinition, ServiceError, ServiceResult, reconcile,
        review::{self, ReviewAction, ReviewRequest},
        verifications::{self, SubmitVerification},
    },
    db::models::{Verification, VerificationStatus},
    graphql::{Context, count, parse_id},
};

#[graphql_object]
#[graphql(context = Context)]
impl Verification {
    pub fn id(&self) -> String {
        self.id.to_string()
    }

    pub fn user_id(&self) -> String {
        self.user_id.to_string()
    }

    pub fn challenge_id(&self) -> &str {
        &self.challenge_id
    }

    pub fn challenge(&self, ctx: &Context) -> Option<ChallengeDefinition> {
        ctx.catalog().get(&self.challenge_id).cloned()
    }

    pub fn photo_url(&self) -> &str {
        &self.photo_url
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> VerificationStatus {
        self.status
    }

    pub fn submitted_at(&self) -> String {
        self.submitted_at.to_rfc3339()
    }

    pub fn reviewed_at(&self) -> Option<String> {
        self.reviewed_at.map(|t| t.to_rfc3339())
    }

    pub fn reviewed_by(&self) -> Option<String> {
        self.reviewed_by.map(|id| id.to_string())
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }
}

#[derive(GraphQLObject, Debug, Clone)]
pub struct ReviewResult {
    pub success: bool,
    pub message: String,
    pub status: Option<VerificationStatus>,
}

/// Returns the ID of the new verification.
pub async fn submit_verification(
    ctx: &Context,
    challenge_id: String,
    photo_url: String,
    description: Option<String>,
) -> ServiceResult<String> {
    let user = ctx.require_authentication()?;
    tracing::debug!("Verification submission from {}", ctx.get_ip());
    let verification = verifications::submit(
        ctx.store(),
        ctx.catalog(),
        SubmitVerification {
            user_id: user.user_id,
            challenge_id,
            photo_url,
            description,
        },
    )
    .await?;
    Ok(verification.id.to_string())
}

pub async fn my_verifications(ctx: &Context) -> ServiceResult<Vec<Verification>> {
    let user = ctx.require_authentication()?;
    verifications::list_by_user(ctx.store(), user.user_id).await
}

pub async fn list_verifications(
    ctx: &Context,
    user_id: Option<String>,
) -> ServiceResult<Vec<Verification>> {
    ctx.require_admin()?;
    match user_id {
        Some(raw) => verifications::list_by_user(ctx.store(), parse_id(&raw, "user")?).await,
        None => verifications::list_all(ctx.store()).await,
    }
}

pub async fn review_verification(
    ctx: &Context,
    action: ReviewAction,
    verification_id: String,
    reason: Option<String>,
) -> ServiceResult<ReviewResult> {
    let admin = ctx.require_admin()?;
    let request = ReviewRequest {
        action,
        verification_id: parse_id(&verification_id, "verification")?,
        admin_id: admin.user_id,
        reason,
    };

    match review::review(ctx.store(), request).await {
        Ok(outcome) => {
            let verification = outcome.verification;
            if outcome.changed {
                // Keep the stored projection current. Failing here only
                // leaves drift for the next reconciliation to repair.
                if let Err(e) =
                    reconcile::reconcile(ctx.store(), ctx.catalog(), verification.user_id).await
                {
                    tracing::warn!(
                        "Status update after review of {} failed: {e}",
                        verification.id
                    );
                }
            }
            let message = match (outcome.changed, verification.status) {
                (true, VerificationStatus::Approved) => "Verification approved",
                (true, _) => "Verification rejected",
                (false, _) => "Verification was already reviewed with this outcome",
            };
            Ok(ReviewResult {
                success: true,
                message: message.to_string(),
                status: Some(verification.status),
            })
        }
        Err(ServiceError::AlreadyReviewed { id, status }) => Ok(ReviewResult {
            success: false,
            message: ServiceError::AlreadyReviewed { id, status }.to_string(),
            status: Some(status),
        }),
        Err(e) => Err(e),
    }
}

pub async fn delete_verification(ctx: &Context, verification_id: String) -> ServiceResult<bool> {
    ctx.require_admin()?;
    verifications::delete(ctx.store(), parse_id(&verification_id, "verification")?).await?;
    Ok(true)
}

/// Returns the number of deleted verifications.
pub async fn reset_verifications(ctx: &Context, user_id: String) -> ServiceResult<i32> {
    let admin = ctx.require_admin()?;
    let user_id = parse_id(&user_id, "user")?;
    tracing::warn!("Admin {} resets verifications of {user_id}", admin.user_id);
    let deleted = verifications::delete_all_for_user(ctx.store(), user_id).await?;
    Ok(count(deleted))
}
