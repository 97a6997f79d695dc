// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use juniper::graphql_object;

use crate::{
    challenges::{ChallengeDefinition, ServiceResult, resolver::ChallengeStatus},
    db::models::{AdminNotification, StoredChallengeStatus, Verification},
    graphql::{auth::UserRole, handlers},
};

use super::Context;

pub struct Query;

#[graphql_object]
#[graphql(context = Context)]
impl Query {
    fn is_authenticated(context: &Context) -> bool {
        context.is_authenticated()
    }

    fn viewer_role(context: &Context) -> Option<UserRole> {
        context.role()
    }

    fn challenges(context: &Context) -> Vec<ChallengeDefinition> {
        handlers::challenges::get_challenges(context)
    }

    async fn my_verifications(context: &Context) -> ServiceResult<Vec<Verification>> {
        handlers::verifications::my_verifications(context).await
    }

    /// All verifications, or those of one user. Admin only.
    async fn verifications(
        context: &Context,
        user_id: Option<String>,
    ) -> ServiceResult<Vec<Verification>> {
        handlers::verifications::list_verifications(context, user_id).await
    }

    /// Challenge status derived from the current verification history.
    async fn challenge_progress(
        context: &Context,
        user_id: Option<String>,
    ) -> ServiceResult<Vec<ChallengeStatus>> {
        handlers::challenges::challenge_progress(context, user_id).await
    }

    /// Challenge status as of the last reconciliation or direct update.
    async fn stored_challenge_progress(
        context: &Context,
        user_id: Option<String>,
    ) -> ServiceResult<Vec<StoredChallengeStatus>> {
        handlers::challenges::stored_challenge_progress(context, user_id).await
    }

    async fn unread_notifications(context: &Context) -> ServiceResult<Vec<AdminNotification>> {
        handlers::notifications::unread_notifications(context).await
    }
}
