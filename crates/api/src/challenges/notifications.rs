// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use uuid::Uuid;

use super::{ServiceError, ServiceResult};
use crate::db::{
    Store,
    models::{AdminNotification, NewAdminNotification, NotificationKind},
};

#[derive(Debug, Clone)]
pub struct AdminEvent {
    pub kind: NotificationKind,
    pub user_id: Uuid,
    pub challenge_id: Option<String>,
    pub verification_id: Option<Uuid>,
}

/// Records an event for the admin panel.
///
/// Failures are logged and swallowed: notifications are observational and must
/// not change the outcome of the operation that emitted them.
pub async fn notify_admins(store: &dyn Store, event: AdminEvent) -> Option<AdminNotification> {
    let kind = event.kind;
    let result = store
        .insert_notification(NewAdminNotification {
            id: Uuid::now_v7(),
            kind: event.kind,
            user_id: event.user_id,
            challenge_id: event.challenge_id,
            verification_id: event.verification_id,
            is_read: false,
            created_at: chrono::Utc::now(),
        })
        .await;
    match result {
        Ok(notification) => Some(notification),
        Err(e) => {
            tracing::warn!("Failed to record {kind:?} notification: {e}");
            None
        }
    }
}

pub async fn mark_read(store: &dyn Store, notification_id: Uuid) -> ServiceResult<()> {
    if store.mark_notification_read(notification_id).await? {
        Ok(())
    } else {
        Err(ServiceError::NotFound(format!(
            "Notification {notification_id}"
        )))
    }
}

pub async fn remove(store: &dyn Store, notification_id: Uuid) -> ServiceResult<()> {
    if store.remove_notification(notification_id).await? {
        Ok(())
    } else {
        Err(ServiceError::NotFound(format!(
            "Notification {notification_id}"
        )))
    }
}

pub async fn list_unread(store: &dyn Store) -> ServiceResult<Vec<AdminNotification>> {
    Ok(store.list_unread_notifications().await?)
}
