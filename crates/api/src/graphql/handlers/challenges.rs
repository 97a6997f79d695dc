// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use juniper::graphql_object;

use crate::{
    challenges::{
        ChallengeDefinition, ServiceResult,
        reconcile::{self, ReconcileReport, SyncSummary},
        resolver::{self, ChallengeStatus},
        status::{self, StatusUpdate},
    },
    db::models::{ChallengeState, StoredChallengeStatus},
    graphql::{Context, count, parse_id},
};

#[graphql_object]
#[graphql(context = Context)]
impl ChallengeStatus {
    fn challenge_id(&self) -> &str {
        &self.challenge_id
    }

    fn status(&self) -> ChallengeState {
        self.state
    }

    fn completed_at(&self) -> Option<String> {
        self.completed_at.map(|t| t.to_rfc3339())
    }
}

#[graphql_object]
#[graphql(context = Context)]
impl StoredChallengeStatus {
    fn challenge_id(&self) -> &str {
        &self.challenge_id
    }

    fn status(&self) -> ChallengeState {
        self.state
    }

    fn completed_at(&self) -> Option<String> {
        self.completed_at.map(|t| t.to_rfc3339())
    }

    /// When this status was last written, by reconciliation or directly
    fn updated_at(&self) -> String {
        self.updated_at.to_rfc3339()
    }
}

#[graphql_object]
#[graphql(context = Context)]
impl ReconcileReport {
    fn user_id(&self) -> String {
        self.user_id.to_string()
    }

    fn updated_count(&self) -> i32 {
        count(self.updated_count)
    }

    fn challenges(&self) -> &Vec<ChallengeStatus> {
        &self.challenges
    }
}

#[graphql_object]
#[graphql(context = Context)]
impl SyncSummary {
    fn users(&self) -> i32 {
        count(self.users)
    }

    fn updated_count(&self) -> i32 {
        count(self.updated_count)
    }
}

pub fn get_challenges(ctx: &Context) -> Vec<ChallengeDefinition> {
    // Public information, no authentication needed.
    ctx.catalog().definitions().to_vec()
}

pub async fn challenge_progress(
    ctx: &Context,
    user_id: Option<String>,
) -> ServiceResult<Vec<ChallengeStatus>> {
    let user_id = ctx.target_user(user_id)?;
    resolver::resolve(ctx.store(), ctx.catalog(), user_id).await
}

pub async fn stored_challenge_progress(
    ctx: &Context,
    user_id: Option<String>,
) -> ServiceResult<Vec<StoredChallengeStatus>> {
    let user_id = ctx.target_user(user_id)?;
    status::stored_statuses(ctx.store(), user_id).await
}

pub async fn update_challenge_status(
    ctx: &Context,
    user_id: String,
    challenge_id: String,
    state: ChallengeState,
) -> ServiceResult<bool> {
    let admin = ctx.require_admin()?;
    let update = StatusUpdate {
        user_id: parse_id(&user_id, "user")?,
        challenge_id,
        state,
    };
    tracing::info!(
        "Admin {} overrides {} of {}",
        admin.user_id,
        update.challenge_id,
        update.user_id
    );
    status::update_challenge_status(
        ctx.store(),
        ctx.catalog(),
        update,
        ctx.strict_status_updates(),
    )
    .await?;
    Ok(true)
}

pub async fn reconcile_challenges(
    ctx: &Context,
    user_id: Option<String>,
) -> ServiceResult<ReconcileReport> {
    let user_id = ctx.target_user(user_id)?;
    reconcile::reconcile(ctx.store(), ctx.catalog(), user_id).await
}

pub async fn reconcile_all_challenges(ctx: &Context) -> ServiceResult<SyncSummary> {
    ctx.require_admin()?;
    reconcile::reconcile_all(ctx.store(), ctx.catalog()).await
}
