// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use juniper::GraphQLEnum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::schema::*;

#[derive(
    diesel_derive_enum::DbEnum,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Deserialize,
    Serialize,
    Clone,
    Copy,
    GraphQLEnum,
)]
#[DbValueStyle = "UPPERCASE"]
#[ExistingTypePath = "crate::db::schema::sql_types::VerificationStatus"]
#[serde(rename_all = "UPPERCASE")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
}

impl VerificationStatus {
    /// Approved and rejected verifications never change again.
    pub fn is_terminal(self) -> bool {
        !matches!(self, VerificationStatus::Pending)
    }
}

#[derive(
    diesel_derive_enum::DbEnum,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Deserialize,
    Serialize,
    Clone,
    Copy,
    GraphQLEnum,
)]
#[DbValueStyle = "SCREAMING_SNAKE_CASE"]
#[ExistingTypePath = "crate::db::schema::sql_types::ChallengeState"]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChallengeState {
    InProgress,
    PendingVerification,
    Completed,
    Rejected,
}

#[derive(
    diesel_derive_enum::DbEnum,
    Debug,
    PartialEq,
    Eq,
    Deserialize,
    Serialize,
    Clone,
    Copy,
    GraphQLEnum,
)]
#[DbValueStyle = "SCREAMING_SNAKE_CASE"]
#[ExistingTypePath = "crate::db::schema::sql_types::NotificationKind"]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    VerificationSubmitted,
    ReconciliationFailed,
}

/* =========================
 * VERIFICATIONS
 * ========================= */

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = verifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Verification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub challenge_id: String,
    pub photo_url: String,
    pub description: String,
    pub status: VerificationStatus,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<Uuid>,
    pub rejection_reason: Option<String>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = verifications)]
pub struct NewVerification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub challenge_id: String,
    pub photo_url: String,
    pub description: String,
    pub status: VerificationStatus,
    pub submitted_at: DateTime<Utc>,
}

impl From<NewVerification> for Verification {
    fn from(new: NewVerification) -> Self {
        Self {
            id: new.id,
            user_id: new.user_id,
            challenge_id: new.challenge_id,
            photo_url: new.photo_url,
            description: new.description,
            status: new.status,
            submitted_at: new.submitted_at,
            reviewed_at: None,
            reviewed_by: None,
            rejection_reason: None,
        }
    }
}

/// The fields written by a review. Applied only while the row is still pending.
#[derive(Debug, Clone)]
pub struct ReviewUpdate {
    pub status: VerificationStatus,
    pub reviewed_at: DateTime<Utc>,
    pub reviewed_by: Uuid,
    pub rejection_reason: Option<String>,
}

/* =========================
 * CHALLENGE STATUSES
 * ========================= */

#[derive(Queryable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = challenge_statuses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StoredChallengeStatus {
    pub user_id: Uuid,
    pub challenge_id: String,
    pub state: ChallengeState,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = challenge_statuses)]
pub struct NewChallengeStatus {
    pub user_id: Uuid,
    pub challenge_id: String,
    pub state: ChallengeState,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/* =========================
 * ADMIN NOTIFICATIONS
 * ========================= */

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = admin_notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AdminNotification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub user_id: Uuid,
    pub challenge_id: Option<String>,
    pub verification_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = admin_notifications)]
pub struct NewAdminNotification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub user_id: Uuid,
    pub challenge_id: Option<String>,
    pub verification_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<NewAdminNotification> for AdminNotification {
    fn from(new: NewAdminNotification) -> Self {
        Self {
            id: new.id,
            kind: new.kind,
            user_id: new.user_id,
            challenge_id: new.challenge_id,
            verification_id: new.verification_id,
            is_read: new.is_read,
            created_at: new.created_at,
        }
    }
}
