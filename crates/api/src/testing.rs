// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Store wrapper with switchable failures for exercising error paths in tests.

use std::{
    collections::HashSet,
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::{
    MemoryStore, Store, StoreError,
    models::{
        AdminNotification, NewAdminNotification, NewChallengeStatus, NewVerification,
        ReviewUpdate, StoredChallengeStatus, Verification,
    },
};

#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    notifications_down: AtomicBool,
    failing_status_writes: Mutex<HashSet<String>>,
}

fn unavailable() -> StoreError {
    StoreError::Connection("injected failure".to_string())
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_notifications(&self) {
        self.notifications_down.store(true, Ordering::SeqCst);
    }

    pub fn fail_status_writes_for(&self, challenge_id: &str) {
        self.failing_status_writes
            .lock()
            .unwrap()
            .insert(challenge_id.to_string());
    }

    fn check_notifications(&self) -> Result<(), StoreError> {
        if self.notifications_down.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(())
    }
}

#[async_trait]
impl Store for FlakyStore {
    async fn insert_verification(
        &self,
        verification: NewVerification,
    ) -> Result<Verification, StoreError> {
        self.inner.insert_verification(verification).await
    }

    async fn get_verification(&self, id: Uuid) -> Result<Option<Verification>, StoreError> {
        self.inner.get_verification(id).await
    }

    async fn list_verifications_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Verification>, StoreError> {
        self.inner.list_verifications_for_user(user_id).await
    }

    async fn list_verifications(&self) -> Result<Vec<Verification>, StoreError> {
        self.inner.list_verifications().await
    }

    async fn review_verification(
        &self,
        id: Uuid,
        update: ReviewUpdate,
    ) -> Result<Option<Verification>, StoreError> {
        self.inner.review_verification(id, update).await
    }

    async fn delete_verification(&self, id: Uuid) -> Result<bool, StoreError> {
        self.inner.delete_verification(id).await
    }

    async fn delete_verifications_for_user(&self, user_id: Uuid) -> Result<usize, StoreError> {
        self.inner.delete_verifications_for_user(user_id).await
    }

    async fn users_to_reconcile(&self) -> Result<Vec<Uuid>, StoreError> {
        self.inner.users_to_reconcile().await
    }

    async fn list_challenge_statuses(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<StoredChallengeStatus>, StoreError> {
        self.inner.list_challenge_statuses(user_id).await
    }

    async fn write_challenge_status(&self, status: NewChallengeStatus) -> Result<bool, StoreError> {
        let failing = self
            .failing_status_writes
            .lock()
            .unwrap()
            .contains(&status.challenge_id);
        if failing {
            return Err(unavailable());
        }
        self.inner.write_challenge_status(status).await
    }

    async fn insert_notification(
        &self,
        notification: NewAdminNotification,
    ) -> Result<AdminNotification, StoreError> {
        self.check_notifications()?;
        self.inner.insert_notification(notification).await
    }

    async fn mark_notification_read(&self, id: Uuid) -> Result<bool, StoreError> {
        self.check_notifications()?;
        self.inner.mark_notification_read(id).await
    }

    async fn remove_notification(&self, id: Uuid) -> Result<bool, StoreError> {
        self.check_notifications()?;
        self.inner.remove_notification(id).await
    }

    async fn list_unread_notifications(&self) -> Result<Vec<AdminNotification>, StoreError> {
        self.check_notifications()?;
        self.inner.list_unread_notifications().await
    }
}
