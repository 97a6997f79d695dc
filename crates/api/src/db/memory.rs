// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{
    collections::{BTreeSet, HashMap},
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use uuid::Uuid;

use super::{
    Store, StoreError,
    models::{
        AdminNotification, NewAdminNotification, NewChallengeStatus, NewVerification,
        ReviewUpdate, StoredChallengeStatus, Verification, VerificationStatus,
    },
};

#[derive(Default)]
struct MemoryState {
    verifications: Vec<Verification>,
    statuses: HashMap<(Uuid, String), StoredChallengeStatus>,
    notifications: Vec<AdminNotification>,
}

/// A process-local [`Store`], used when no database is configured and in tests.
///
/// Every operation runs under one lock, which gives the same compare-and-set
/// behaviour for reviews that the conditional `UPDATE` gives in Postgres.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn newest_first(records: &mut [Verification]) {
    records.sort_by(|a, b| {
        b.submitted_at
            .cmp(&a.submitted_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_verification(
        &self,
        verification: NewVerification,
    ) -> Result<Verification, StoreError> {
        let record = Verification::from(verification);
        self.state()?.verifications.push(record.clone());
        Ok(record)
    }

    async fn get_verification(&self, id: Uuid) -> Result<Option<Verification>, StoreError> {
        Ok(self
            .state()?
            .verifications
            .iter()
            .find(|v| v.id == id)
            .cloned())
    }

    async fn list_verifications_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Verification>, StoreError> {
        let mut records: Vec<Verification> = self
            .state()?
            .verifications
            .iter()
            .filter(|v| v.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut records);
        Ok(records)
    }

    async fn list_verifications(&self) -> Result<Vec<Verification>, StoreError> {
        let mut records = self.state()?.verifications.clone();
        newest_first(&mut records);
        Ok(records)
    }

    async fn review_verification(
        &self,
        id: Uuid,
        update: ReviewUpdate,
    ) -> Result<Option<Verification>, StoreError> {
        let mut state = self.state()?;
        let Some(record) = state
            .verifications
            .iter_mut()
            .find(|v| v.id == id && v.status == VerificationStatus::Pending)
        else {
            return Ok(None);
        };
        record.status = update.status;
        record.reviewed_at = Some(update.reviewed_at);
        record.reviewed_by = Some(update.reviewed_by);
        record.rejection_reason = update.rejection_reason;
        Ok(Some(record.clone()))
    }

    async fn delete_verification(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state()?;
        let before = state.verifications.len();
        state.verifications.retain(|v| v.id != id);
        Ok(state.verifications.len() != before)
    }

    async fn delete_verifications_for_user(&self, user_id: Uuid) -> Result<usize, StoreError> {
        let mut state = self.state()?;
        let before = state.verifications.len();
        state.verifications.retain(|v| v.user_id != user_id);
        Ok(before - state.verifications.len())
    }

    async fn users_to_reconcile(&self) -> Result<Vec<Uuid>, StoreError> {
        let state = self.state()?;
        let users: BTreeSet<Uuid> = state
            .verifications
            .iter()
            .map(|v| v.user_id)
            .chain(state.statuses.keys().map(|(user_id, _)| *user_id))
            .collect();
        Ok(users.into_iter().collect())
    }

    async fn list_challenge_statuses(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<StoredChallengeStatus>, StoreError> {
        let mut records: Vec<StoredChallengeStatus> = self
            .state()?
            .statuses
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.challenge_id.cmp(&b.challenge_id));
        Ok(records)
    }

    async fn write_challenge_status(&self, status: NewChallengeStatus) -> Result<bool, StoreError> {
        let mut state = self.state()?;
        let key = (status.user_id, status.challenge_id.clone());
        if let Some(existing) = state.statuses.get(&key)
            && existing.state == status.state
            && existing.completed_at == status.completed_at
        {
            return Ok(false);
        }
        state.statuses.insert(
            key,
            StoredChallengeStatus {
                user_id: status.user_id,
                challenge_id: status.challenge_id,
                state: status.state,
                completed_at: status.completed_at,
                updated_at: status.updated_at,
            },
        );
        Ok(true)
    }

    async fn insert_notification(
        &self,
        notification: NewAdminNotification,
    ) -> Result<AdminNotification, StoreError> {
        let record = AdminNotification::from(notification);
        self.state()?.notifications.push(record.clone());
        Ok(record)
    }

    async fn mark_notification_read(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state()?;
        match state.notifications.iter_mut().find(|n| n.id == id) {
            Some(notification) => {
                notification.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_notification(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state()?;
        let before = state.notifications.len();
        state.notifications.retain(|n| n.id != id);
        Ok(state.notifications.len() != before)
    }

    async fn list_unread_notifications(&self) -> Result<Vec<AdminNotification>, StoreError> {
        let mut records: Vec<AdminNotification> = self
            .state()?
            .notifications
            .iter()
            .filter(|n| !n.is_read)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(records)
    }
}
