// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{sync::Arc, time::Duration};

use uuid::Uuid;

use super::{
    ChallengeCatalog, ServiceError, ServiceResult,
    notifications::{self, AdminEvent},
    resolver::{self, ChallengeStatus},
};
use crate::db::{
    Store,
    models::{NewChallengeStatus, NotificationKind},
};

#[derive(Debug, Clone)]
pub struct ReconcileReport {
    pub user_id: Uuid,
    /// Number of stored statuses whose value actually changed
    pub updated_count: usize,
    pub challenges: Vec<ChallengeStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub users: usize,
    pub updated_count: usize,
}

/// Re-derives a user's challenge statuses and overwrites the stored ones.
///
/// Running this again without intervening writes changes nothing and reports
/// zero updates. Every challenge is attempted even if some writes fail; in
/// that case the error lists which ids were persisted and which were not.
/// Reviews committed after the verifications were read are picked up by the
/// next run.
pub async fn reconcile(
    store: &dyn Store,
    catalog: &ChallengeCatalog,
    user_id: Uuid,
) -> ServiceResult<ReconcileReport> {
    let challenges = resolver::resolve(store, catalog, user_id).await?;
    let now = chrono::Utc::now();

    let mut updated_count = 0;
    let mut succeeded = Vec::new();
    let mut failed = Vec::new();
    for status in &challenges {
        let write = store
            .write_challenge_status(NewChallengeStatus {
                user_id,
                challenge_id: status.challenge_id.clone(),
                state: status.state,
                completed_at: status.completed_at,
                updated_at: now,
            })
            .await;
        match write {
            Ok(changed) => {
                if changed {
                    updated_count += 1;
                }
                succeeded.push(status.challenge_id.clone());
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to persist status of {} for user {user_id}: {e}",
                    status.challenge_id
                );
                failed.push(status.challenge_id.clone());
            }
        }
    }

    if !failed.is_empty() {
        notifications::notify_admins(
            store,
            AdminEvent {
                kind: NotificationKind::ReconciliationFailed,
                user_id,
                challenge_id: failed.first().cloned(),
                verification_id: None,
            },
        )
        .await;
        return Err(ServiceError::PartialReconciliation { succeeded, failed });
    }

    if updated_count > 0 {
        tracing::info!("Reconciled user {user_id}: {updated_count} challenge status(es) updated");
    }
    Ok(ReconcileReport {
        user_id,
        updated_count,
        challenges,
    })
}

/// Reconciles every user that has verifications or stored statuses.
///
/// Users whose verifications were all deleted are included, so their stored
/// statuses fall back to what the remaining history supports.
///
/// Failures are collected rather than aborting the pass. Failed entries are
/// reported as `user:challenge`, or just `user` when nothing could be derived.
pub async fn reconcile_all(
    store: &dyn Store,
    catalog: &ChallengeCatalog,
) -> ServiceResult<SyncSummary> {
    let users = store.users_to_reconcile().await?;

    let mut summary = SyncSummary::default();
    let mut succeeded = Vec::new();
    let mut failed = Vec::new();
    for user_id in users {
        summary.users += 1;
        match reconcile(store, catalog, user_id).await {
            Ok(report) => {
                summary.updated_count += report.updated_count;
                succeeded.extend(
                    report
                        .challenges
                        .iter()
                        .map(|c| format!("{user_id}:{}", c.challenge_id)),
                );
            }
            Err(ServiceError::PartialReconciliation {
                succeeded: ok,
                failed: failed_ids,
            }) => {
                succeeded.extend(ok.iter().map(|id| format!("{user_id}:{id}")));
                failed.extend(failed_ids.iter().map(|id| format!("{user_id}:{id}")));
            }
            Err(e) => {
                tracing::warn!("Failed to reconcile user {user_id}: {e}");
                failed.push(user_id.to_string());
            }
        }
    }

    if !failed.is_empty() {
        return Err(ServiceError::PartialReconciliation { succeeded, failed });
    }
    Ok(summary)
}

/// Runs [`reconcile_all`] forever on a fixed interval.
pub async fn run_periodic(
    store: Arc<dyn Store>,
    catalog: Arc<ChallengeCatalog>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        match reconcile_all(store.as_ref(), &catalog).await {
            Ok(summary) => tracing::debug!(
                "Periodic reconciliation done: {} user(s), {} update(s)",
                summary.users,
                summary.updated_count
            ),
            Err(e) => tracing::warn!("Periodic reconciliation failed: {e}"),
        }
    }
}
