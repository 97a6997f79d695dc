// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use juniper::graphql_object;

use crate::{
    challenges::{
        ServiceResult,
        reconcile::{ReconcileReport, SyncSummary},
        review::ReviewAction,
    },
    db::models::ChallengeState,
    graphql::handlers::{self, verifications::ReviewResult},
};

use super::Context;

pub struct Mutation;

#[graphql_object]
#[graphql(
    context = Context,
)]
impl Mutation {
    /// Submits photo evidence for a challenge and returns the verification ID.
    async fn submit_verification(
        context: &Context,
        challenge_id: String,
        photo_url: String,
        description: Option<String>,
    ) -> ServiceResult<String> {
        handlers::verifications::submit_verification(context, challenge_id, photo_url, description)
            .await
    }

    /// Approves or rejects a pending verification. A reason is required to reject.
    async fn review_verification(
        context: &Context,
        action: ReviewAction,
        verification_id: String,
        reason: Option<String>,
    ) -> ServiceResult<ReviewResult> {
        handlers::verifications::review_verification(context, action, verification_id, reason)
            .await
    }

    /// Overrides a stored challenge status. The next reconciliation may overwrite it.
    async fn update_challenge_status(
        context: &Context,
        user_id: String,
        challenge_id: String,
        status: ChallengeState,
    ) -> ServiceResult<bool> {
        handlers::challenges::update_challenge_status(context, user_id, challenge_id, status).await
    }

    async fn reconcile_challenges(
        context: &Context,
        user_id: Option<String>,
    ) -> ServiceResult<ReconcileReport> {
        handlers::challenges::reconcile_challenges(context, user_id).await
    }

    async fn reconcile_all_challenges(context: &Context) -> ServiceResult<SyncSummary> {
        handlers::challenges::reconcile_all_challenges(context).await
    }

    async fn delete_verification(context: &Context, verification_id: String) -> ServiceResult<bool> {
        handlers::verifications::delete_verification(context, verification_id).await
    }

    /// Permanently deletes every verification of a user.
    async fn reset_verifications(context: &Context, user_id: String) -> ServiceResult<i32> {
        handlers::verifications::reset_verifications(context, user_id).await
    }

    async fn mark_notification_read(
        context: &Context,
        notification_id: String,
    ) -> ServiceResult<bool> {
        handlers::notifications::mark_notification_read(context, notification_id).await
    }

    async fn remove_notification(context: &Context, notification_id: String) -> ServiceResult<bool> {
        handlers::notifications::remove_notification(context, notification_id).await
    }
}

#[cfg(test)]
mod tests {
    use std::{net::IpAddr, sync::Arc};

    use juniper::{EmptySubscription, graphql_vars};
    use serde_json::{Value, json};

    use crate::{
        challenges::ChallengeCatalog,
        db::MemoryStore,
        graphql::{AuthenticatedUser, BaseContext, Query, Schema, auth::UserRole},
    };

    use super::*;

    struct Harness {
        schema: Schema,
        base: BaseContext,
        user: AuthenticatedUser,
        admin: AuthenticatedUser,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                schema: Schema::new(Query, Mutation, EmptySubscription::new()),
                base: BaseContext {
                    store: Arc::new(MemoryStore::new()),
                    catalog: Arc::new(ChallengeCatalog::builtin()),
                    verifying_key: None,
                    strict_status_updates: false,
                },
                user: AuthenticatedUser {
                    user_id: uuid::Uuid::now_v7(),
                    role: UserRole::User,
                },
                admin: AuthenticatedUser {
                    user_id: uuid::Uuid::now_v7(),
                    role: UserRole::Admin,
                },
            }
        }

        async fn run(&self, as_user: Option<&AuthenticatedUser>, document: &str) -> (Value, Value) {
            let ctx = Context::new(
                self.base.clone(),
                IpAddr::from([127, 0, 0, 1]),
                as_user.cloned(),
            );
            let (data, errors) =
                juniper::execute(document, None, &self.schema, &graphql_vars! {}, &ctx)
                    .await
                    .expect("Invalid GraphQL document");
            (
                serde_json::to_value(&data).unwrap(),
                serde_json::to_value(&errors).unwrap(),
            )
        }
    }

    #[tokio::test]
    async fn test_submit_review_and_progress() {
        let h = Harness::new();

        let (data, errors) = h
            .run(
                Some(&h.user),
                r#"mutation { submitVerification(challengeId: "FIRST_VISIT", photoUrl: "https://cdn.example.com/x.jpg") }"#,
            )
            .await;
        assert_eq!(errors, json!([]));
        let verification_id = data["submitVerification"].as_str().unwrap().to_string();

        let (data, _) = h
            .run(
                Some(&h.user),
                "{ challengeProgress { challengeId status } }",
            )
            .await;
        assert_eq!(
            data["challengeProgress"][0],
            json!({ "challengeId": "FIRST_VISIT", "status": "PENDING_VERIFICATION" })
        );

        let review = format!(
            r#"mutation {{ reviewVerification(action: APPROVE, verificationId: "{verification_id}") {{ success status }} }}"#
        );
        let (data, errors) = h.run(Some(&h.admin), &review).await;
        assert_eq!(errors, json!([]));
        assert_eq!(
            data["reviewVerification"],
            json!({ "success": true, "status": "APPROVED" })
        );

        // The review refreshed the stored projection.
        let (data, _) = h
            .run(
                Some(&h.user),
                "{ storedChallengeProgress { challengeId status } }",
            )
            .await;
        let stored = data["storedChallengeProgress"].as_array().unwrap();
        assert!(stored.contains(&json!({ "challengeId": "FIRST_VISIT", "status": "COMPLETED" })));

        let reject = format!(
            r#"mutation {{ reviewVerification(action: REJECT, verificationId: "{verification_id}", reason: "late") {{ success status }} }}"#
        );
        let (data, errors) = h.run(Some(&h.admin), &reject).await;
        assert_eq!(errors, json!([]));
        assert_eq!(
            data["reviewVerification"],
            json!({ "success": false, "status": "APPROVED" })
        );
    }

    #[tokio::test]
    async fn test_errors_carry_kind() {
        let h = Harness::new();

        let (_, errors) = h
            .run(
                None,
                r#"mutation { submitVerification(challengeId: "FIRST_VISIT", photoUrl: "https://cdn.example.com/x.jpg") }"#,
            )
            .await;
        assert_eq!(errors[0]["extensions"]["kind"], "UNAUTHENTICATED");

        let (_, errors) = h
            .run(Some(&h.user), r#"mutation { resetVerifications(userId: "00000000-0000-0000-0000-000000000000") }"#)
            .await;
        assert_eq!(errors[0]["extensions"]["kind"], "FORBIDDEN");

        let (_, errors) = h
            .run(
                Some(&h.admin),
                r#"mutation { reviewVerification(action: REJECT, verificationId: "00000000-0000-0000-0000-000000000000") { success } }"#,
            )
            .await;
        assert_eq!(errors[0]["extensions"]["kind"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_reconcile_twice_reports_no_changes() {
        let h = Harness::new();
        let document = "mutation { reconcileChallenges { updatedCount } }";

        let (data, _) = h.run(Some(&h.user), document).await;
        assert_eq!(data["reconcileChallenges"]["updatedCount"], 5);
        let (data, _) = h.run(Some(&h.user), document).await;
        assert_eq!(data["reconcileChallenges"]["updatedCount"], 0);
    }
}
