// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use uuid::Uuid;

use super::{ChallengeCatalog, ServiceError, ServiceResult, notifications};
use crate::db::{
    Store,
    models::{NewVerification, NotificationKind, Verification, VerificationStatus},
};

#[derive(Debug, Clone)]
pub struct SubmitVerification {
    pub user_id: Uuid,
    pub challenge_id: String,
    pub photo_url: String,
    pub description: Option<String>,
}

fn validate_photo_url(photo_url: &str) -> ServiceResult<()> {
    if photo_url.is_empty() {
        return Err(ServiceError::validation("A photo URL is required"));
    }
    if !(photo_url.starts_with("https://") || photo_url.starts_with("http://")) {
        return Err(ServiceError::validation(
            "Photo URL must be an http(s) URL",
        ));
    }
    Ok(())
}

/// Records new evidence for a challenge as a pending verification.
///
/// Earlier verifications for the same challenge are left untouched; reviews
/// always address a single verification id. Admins are notified afterwards,
/// but a failed notification never fails the submission.
pub async fn submit(
    store: &dyn Store,
    catalog: &ChallengeCatalog,
    input: SubmitVerification,
) -> ServiceResult<Verification> {
    let challenge_id = input.challenge_id.trim();
    if challenge_id.is_empty() {
        return Err(ServiceError::validation("A challenge ID is required"));
    }
    if !catalog.contains(challenge_id) {
        return Err(ServiceError::validation(format!(
            "Unknown challenge: {challenge_id}"
        )));
    }
    let photo_url = input.photo_url.trim();
    validate_photo_url(photo_url)?;

    let verification = store
        .insert_verification(NewVerification {
            id: Uuid::now_v7(),
            user_id: input.user_id,
            challenge_id: challenge_id.to_string(),
            photo_url: photo_url.to_string(),
            description: input.description.unwrap_or_default(),
            status: VerificationStatus::Pending,
            submitted_at: chrono::Utc::now(),
        })
        .await?;
    tracing::info!(
        "Verification {} submitted by {} for {}",
        verification.id,
        verification.user_id,
        verification.challenge_id
    );

    notifications::notify_admins(
        store,
        notifications::AdminEvent {
            kind: NotificationKind::VerificationSubmitted,
            user_id: verification.user_id,
            challenge_id: Some(verification.challenge_id.clone()),
            verification_id: Some(verification.id),
        },
    )
    .await;

    Ok(verification)
}

pub async fn list_by_user(store: &dyn Store, user_id: Uuid) -> ServiceResult<Vec<Verification>> {
    Ok(store.list_verifications_for_user(user_id).await?)
}

pub async fn list_all(store: &dyn Store) -> ServiceResult<Vec<Verification>> {
    Ok(store.list_verifications().await?)
}

/// Irreversibly removes one verification.
pub async fn delete(store: &dyn Store, verification_id: Uuid) -> ServiceResult<()> {
    if !store.delete_verification(verification_id).await? {
        return Err(ServiceError::NotFound(format!(
            "Verification {verification_id}"
        )));
    }
    tracing::info!("Deleted verification {verification_id}");
    Ok(())
}

/// Irreversibly removes every verification of a user. Used by support tooling.
pub async fn delete_all_for_user(store: &dyn Store, user_id: Uuid) -> ServiceResult<usize> {
    let deleted = store.delete_verifications_for_user(user_id).await?;
    tracing::warn!("Deleted {deleted} verification(s) of user {user_id}");
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::MemoryStore, testing::FlakyStore};

    fn submission(user_id: Uuid, challenge_id: &str) -> SubmitVerification {
        SubmitVerification {
            user_id,
            challenge_id: challenge_id.to_string(),
            photo_url: "https://cdn.example.com/proof.jpg".to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_submit_creates_pending_record() {
        let store = MemoryStore::new();
        let catalog = ChallengeCatalog::builtin();
        let user = Uuid::now_v7();

        let created = submit(&store, &catalog, submission(user, "FIRST_VISIT"))
            .await
            .expect("Failed to submit");

        let listed = list_by_user(&store, user).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);
        assert_eq!(listed[0].status, VerificationStatus::Pending);
        assert!(listed[0].reviewed_at.is_none());
        assert!(listed[0].reviewed_by.is_none());
        assert_eq!(listed[0].description, "");
    }

    #[tokio::test]
    async fn test_submit_notifies_admins() {
        let store = MemoryStore::new();
        let catalog = ChallengeCatalog::builtin();
        let created = submit(&store, &catalog, submission(Uuid::now_v7(), "SHARE_SITE"))
            .await
            .unwrap();

        let unread = store.list_unread_notifications().await.unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].kind, NotificationKind::VerificationSubmitted);
        assert_eq!(unread[0].verification_id, Some(created.id));
    }

    #[tokio::test]
    async fn test_submit_rejects_missing_fields() {
        let store = MemoryStore::new();
        let catalog = ChallengeCatalog::builtin();
        let user = Uuid::now_v7();

        let mut no_photo = submission(user, "FIRST_VISIT");
        no_photo.photo_url = "  ".to_string();
        let mut bad_photo = submission(user, "FIRST_VISIT");
        bad_photo.photo_url = "file:///etc/passwd".to_string();

        for input in [
            submission(user, ""),
            submission(user, "NOT_A_CHALLENGE"),
            no_photo,
            bad_photo,
        ] {
            let err = submit(&store, &catalog, input).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)), "{err:?}");
        }
        assert!(list_by_user(&store, user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_survives_notification_failure() {
        let store = FlakyStore::new();
        store.fail_notifications();
        let catalog = ChallengeCatalog::builtin();
        let user = Uuid::now_v7();

        let created = submit(&store, &catalog, submission(user, "FIRST_VISIT"))
            .await
            .expect("Submission must not fail because of notifications");

        let listed = list_by_user(&store, user).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);
    }

    #[tokio::test]
    async fn test_multiple_pending_records_allowed() {
        let store = MemoryStore::new();
        let catalog = ChallengeCatalog::builtin();
        let user = Uuid::now_v7();

        let first = submit(&store, &catalog, submission(user, "FIRST_VISIT"))
            .await
            .unwrap();
        let second = submit(&store, &catalog, submission(user, "FIRST_VISIT"))
            .await
            .unwrap();

        let listed = list_by_user(&store, user).await.unwrap();
        assert_eq!(listed.len(), 2);
        // Most recent first.
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
        assert!(listed.iter().all(|v| v.status == VerificationStatus::Pending));
    }

    #[tokio::test]
    async fn test_delete_all_for_user() {
        let store = MemoryStore::new();
        let catalog = ChallengeCatalog::builtin();
        let user = Uuid::now_v7();
        let other = Uuid::now_v7();

        submit(&store, &catalog, submission(user, "FIRST_VISIT")).await.unwrap();
        submit(&store, &catalog, submission(user, "SHARE_SITE")).await.unwrap();
        submit(&store, &catalog, submission(other, "SHARE_SITE")).await.unwrap();

        assert_eq!(delete_all_for_user(&store, user).await.unwrap(), 2);
        assert!(list_by_user(&store, user).await.unwrap().is_empty());
        assert_eq!(list_all(&store).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_verification() {
        let store = MemoryStore::new();
        let err = delete(&store, Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
