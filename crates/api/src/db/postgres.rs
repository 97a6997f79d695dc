// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::collections::BTreeSet;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{
    AsyncPgConnection, RunQueryDsl,
    pooled_connection::{
        AsyncDieselConnectionManager,
        bb8::{Pool, PooledConnection},
    },
};
use uuid::Uuid;

use super::{
    Store, StoreError,
    models::{
        AdminNotification, NewAdminNotification, NewChallengeStatus, NewVerification,
        ReviewUpdate, StoredChallengeStatus, Verification, VerificationStatus,
    },
};

pub type PgPool = Pool<AsyncPgConnection>;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
        let pool = Pool::builder()
            .build(manager)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self::new(pool))
    }

    async fn conn(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, StoreError> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_verification(
        &self,
        verification: NewVerification,
    ) -> Result<Verification, StoreError> {
        let inserted = diesel::insert_into(crate::db::schema::verifications::table)
            .values(&verification)
            .returning(Verification::as_returning())
            .get_result(&mut self.conn().await?)
            .await?;
        Ok(inserted)
    }

    async fn get_verification(&self, verification_id: Uuid) -> Result<Option<Verification>, StoreError> {
        use crate::db::schema::verifications::dsl::*;
        let record = verifications
            .filter(id.eq(verification_id))
            .select(Verification::as_select())
            .first(&mut self.conn().await?)
            .await
            .optional()?;
        Ok(record)
    }

    async fn list_verifications_for_user(
        &self,
        uid: Uuid,
    ) -> Result<Vec<Verification>, StoreError> {
        use crate::db::schema::verifications::dsl::*;
        let records = verifications
            .filter(user_id.eq(uid))
            .order_by((submitted_at.desc(), id.desc()))
            .select(Verification::as_select())
            .load(&mut self.conn().await?)
            .await?;
        Ok(records)
    }

    async fn list_verifications(&self) -> Result<Vec<Verification>, StoreError> {
        use crate::db::schema::verifications::dsl::*;
        let records = verifications
            .order_by((submitted_at.desc(), id.desc()))
            .select(Verification::as_select())
            .load(&mut self.conn().await?)
            .await?;
        Ok(records)
    }

    async fn review_verification(
        &self,
        verification_id: Uuid,
        update: ReviewUpdate,
    ) -> Result<Option<Verification>, StoreError> {
        use crate::db::schema::verifications::dsl::*;
        // The status filter makes this a compare-and-set: of two concurrent
        // reviews only one can match the pending row.
        let updated = diesel::update(
            verifications
                .filter(id.eq(verification_id))
                .filter(status.eq(VerificationStatus::Pending)),
        )
        .set((
            status.eq(update.status),
            reviewed_at.eq(Some(update.reviewed_at)),
            reviewed_by.eq(Some(update.reviewed_by)),
            rejection_reason.eq(update.rejection_reason),
        ))
        .returning(Verification::as_returning())
        .get_result(&mut self.conn().await?)
        .await
        .optional()?;
        Ok(updated)
    }

    async fn delete_verification(&self, verification_id: Uuid) -> Result<bool, StoreError> {
        use crate::db::schema::verifications::dsl::*;
        let deleted = diesel::delete(verifications.filter(id.eq(verification_id)))
            .execute(&mut self.conn().await?)
            .await?;
        Ok(deleted > 0)
    }

    async fn delete_verifications_for_user(&self, uid: Uuid) -> Result<usize, StoreError> {
        use crate::db::schema::verifications::dsl::*;
        let deleted = diesel::delete(verifications.filter(user_id.eq(uid)))
            .execute(&mut self.conn().await?)
            .await?;
        Ok(deleted)
    }

    async fn users_to_reconcile(&self) -> Result<Vec<Uuid>, StoreError> {
        use crate::db::schema::{challenge_statuses, verifications};
        let mut conn = self.conn().await?;
        let users = verifications::table
            .select(verifications::user_id)
            .union(challenge_statuses::table.select(challenge_statuses::user_id))
            .load::<Uuid>(&mut conn)
            .await?;
        Ok(users.into_iter().collect::<BTreeSet<_>>().into_iter().collect())
    }

    async fn list_challenge_statuses(
        &self,
        uid: Uuid,
    ) -> Result<Vec<StoredChallengeStatus>, StoreError> {
        use crate::db::schema::challenge_statuses::dsl::*;
        let records = challenge_statuses
            .filter(user_id.eq(uid))
            .order_by(challenge_id.asc())
            .select(StoredChallengeStatus::as_select())
            .load(&mut self.conn().await?)
            .await?;
        Ok(records)
    }

    async fn write_challenge_status(&self, new_status: NewChallengeStatus) -> Result<bool, StoreError> {
        use crate::db::schema::challenge_statuses::dsl::*;
        let mut conn = self.conn().await?;

        // Only rows whose value actually differs count as an update, so
        // rewriting an unchanged projection reports no change.
        let updated = diesel::update(
            challenge_statuses
                .filter(user_id.eq(new_status.user_id))
                .filter(challenge_id.eq(&new_status.challenge_id))
                .filter(
                    state
                        .ne(new_status.state)
                        .or(completed_at.is_distinct_from(new_status.completed_at)),
                ),
        )
        .set((
            state.eq(new_status.state),
            completed_at.eq(new_status.completed_at),
            updated_at.eq(new_status.updated_at),
        ))
        .execute(&mut conn)
        .await?;
        if updated > 0 {
            return Ok(true);
        }

        let inserted = diesel::insert_into(challenge_statuses)
            .values(&new_status)
            .on_conflict((user_id, challenge_id))
            .do_nothing()
            .execute(&mut conn)
            .await?;
        Ok(inserted > 0)
    }

    async fn insert_notification(
        &self,
        notification: NewAdminNotification,
    ) -> Result<AdminNotification, StoreError> {
        let inserted = diesel::insert_into(crate::db::schema::admin_notifications::table)
            .values(&notification)
            .returning(AdminNotification::as_returning())
            .get_result(&mut self.conn().await?)
            .await?;
        Ok(inserted)
    }

    async fn mark_notification_read(&self, notification_id: Uuid) -> Result<bool, StoreError> {
        use crate::db::schema::admin_notifications::dsl::*;
        let updated = diesel::update(admin_notifications.filter(id.eq(notification_id)))
            .set(is_read.eq(true))
            .execute(&mut self.conn().await?)
            .await?;
        Ok(updated > 0)
    }

    async fn remove_notification(&self, notification_id: Uuid) -> Result<bool, StoreError> {
        use crate::db::schema::admin_notifications::dsl::*;
        let deleted = diesel::delete(admin_notifications.filter(id.eq(notification_id)))
            .execute(&mut self.conn().await?)
            .await?;
        Ok(deleted > 0)
    }

    async fn list_unread_notifications(&self) -> Result<Vec<AdminNotification>, StoreError> {
        use crate::db::schema::admin_notifications::dsl::*;
        let records = admin_notifications
            .filter(is_read.eq(false))
            .order_by(created_at.desc())
            .select(AdminNotification::as_select())
            .load(&mut self.conn().await?)
            .await?;
        Ok(records)
    }
}
