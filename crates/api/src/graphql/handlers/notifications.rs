// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use juniper::graphql_object;

use crate::{
    challenges::{ServiceResult, notifications},
    db::models::{AdminNotification, NotificationKind},
    graphql::{Context, parse_id},
};

// Permission checks happen in the functions below, which are the only way to
// reach these objects.
#[graphql_object]
#[graphql(context = Context)]
impl AdminNotification {
    pub fn id(&self) -> String {
        self.id.to_string()
    }

    pub fn kind(&self) -> NotificationKind {
        self.kind
    }

    pub fn user_id(&self) -> String {
        self.user_id.to_string()
    }

    pub fn challenge_id(&self) -> Option<&str> {
        self.challenge_id.as_deref()
    }

    pub fn verification_id(&self) -> Option<String> {
        self.verification_id.map(|id| id.to_string())
    }

    pub fn is_read(&self) -> bool {
        self.is_read
    }

    pub fn created_at(&self) -> String {
        self.created_at.to_rfc3339()
    }
}

pub async fn unread_notifications(ctx: &Context) -> ServiceResult<Vec<AdminNotification>> {
    ctx.require_admin()?;
    notifications::list_unread(ctx.store()).await
}

pub async fn mark_notification_read(ctx: &Context, notification_id: String) -> ServiceResult<bool> {
    ctx.require_admin()?;
    notifications::mark_read(ctx.store(), parse_id(&notification_id, "notification")?).await?;
    Ok(true)
}

pub async fn remove_notification(ctx: &Context, notification_id: String) -> ServiceResult<bool> {
    ctx.require_admin()?;
    notifications::remove(ctx.store(), parse_id(&notification_id, "notification")?).await?;
    Ok(true)
}
