// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use uuid::Uuid;

use super::{ChallengeCatalog, ServiceError, ServiceResult, resolver};
use crate::db::{
    Store,
    models::{ChallengeState, NewChallengeStatus, StoredChallengeStatus},
};

#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub user_id: Uuid,
    pub challenge_id: String,
    pub state: ChallengeState,
}

/// Writes a stored challenge status directly, bypassing the resolver.
///
/// The next reconciliation overwrites whatever is written here. With `strict`
/// set, only the state the verification history currently supports is
/// accepted, e.g. `COMPLETED` needs the latest review to be an approval.
pub async fn update_challenge_status(
    store: &dyn Store,
    catalog: &ChallengeCatalog,
    update: StatusUpdate,
    strict: bool,
) -> ServiceResult<()> {
    if !catalog.contains(&update.challenge_id) {
        return Err(ServiceError::validation(format!(
            "Unknown challenge: {}",
            update.challenge_id
        )));
    }

    let now = chrono::Utc::now();
    let mut completed_at = (update.state == ChallengeState::Completed).then_some(now);

    if strict {
        let supported = resolver::resolve(store, catalog, update.user_id)
            .await?
            .into_iter()
            .find(|s| s.challenge_id == update.challenge_id);
        match supported {
            Some(status) if status.state == update.state => completed_at = status.completed_at,
            Some(status) => {
                return Err(ServiceError::validation(format!(
                    "Cannot set {:?} for {}: its verifications support {:?}",
                    update.state, update.challenge_id, status.state
                )));
            }
            None => {
                return Err(ServiceError::validation(format!(
                    "Unknown challenge: {}",
                    update.challenge_id
                )));
            }
        }
    }

    store
        .write_challenge_status(NewChallengeStatus {
            user_id: update.user_id,
            challenge_id: update.challenge_id.clone(),
            state: update.state,
            completed_at,
            updated_at: now,
        })
        .await?;
    tracing::info!(
        "Challenge {} of user {} set to {:?} directly",
        update.challenge_id,
        update.user_id,
        update.state
    );
    Ok(())
}

/// The statuses as last persisted, which may lag behind [`super::resolver::resolve`].
pub async fn stored_statuses(
    store: &dyn Store,
    user_id: Uuid,
) -> ServiceResult<Vec<StoredChallengeStatus>> {
    Ok(store.list_challenge_statuses(user_id).await?)
}
