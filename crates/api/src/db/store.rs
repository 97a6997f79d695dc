// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::models::{
    AdminNotification, NewAdminNotification, NewChallengeStatus, NewVerification, ReviewUpdate,
    StoredChallengeStatus, Verification,
};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database connection unavailable: {0}")]
    Connection(String),
    #[error("Database query failed: {0}")]
    Query(#[from] diesel::result::Error),
    #[error("In-memory store lock was poisoned")]
    Poisoned,
}

/// Everything the challenge workflow persists.
///
/// The store is the only place state lives between requests, so any check that
/// must hold under concurrent writers (see [`Store::review_verification`]) is
/// expressed as a single conditional write here rather than a read followed by
/// a write in the caller.
#[async_trait]
pub trait Store: Send + Sync {
    /* =========================
     * VERIFICATIONS
     * ========================= */

    async fn insert_verification(
        &self,
        verification: NewVerification,
    ) -> Result<Verification, StoreError>;

    async fn get_verification(&self, id: Uuid) -> Result<Option<Verification>, StoreError>;

    /// Most recently submitted first, ties broken by descending id.
    async fn list_verifications_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Verification>, StoreError>;

    /// Same ordering as [`Store::list_verifications_for_user`].
    async fn list_verifications(&self) -> Result<Vec<Verification>, StoreError>;

    /// Applies `update` only if the verification is still pending.
    ///
    /// Returns the updated row, or `None` if nothing was changed (either the id
    /// does not exist or another review got there first).
    async fn review_verification(
        &self,
        id: Uuid,
        update: ReviewUpdate,
    ) -> Result<Option<Verification>, StoreError>;

    async fn delete_verification(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn delete_verifications_for_user(&self, user_id: Uuid) -> Result<usize, StoreError>;

    /// Every user with a verification or a stored challenge status.
    async fn users_to_reconcile(&self) -> Result<Vec<Uuid>, StoreError>;

    /* =========================
     * CHALLENGE STATUSES
     * ========================= */

    async fn list_challenge_statuses(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<StoredChallengeStatus>, StoreError>;

    /// Inserts or overwrites the stored status for `(user_id, challenge_id)`.
    /// Returns `false` if the stored state and completion time were already equal.
    async fn write_challenge_status(&self, status: NewChallengeStatus) -> Result<bool, StoreError>;

    /* =========================
     * ADMIN NOTIFICATIONS
     * ========================= */

    async fn insert_notification(
        &self,
        notification: NewAdminNotification,
    ) -> Result<AdminNotification, StoreError>;

    async fn mark_notification_read(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn remove_notification(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Newest first.
    async fn list_unread_notifications(&self) -> Result<Vec<AdminNotification>, StoreError>;
}
