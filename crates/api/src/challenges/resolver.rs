// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{ChallengeCatalog, ServiceResult};
use crate::db::{
    Store,
    models::{ChallengeState, Verification, VerificationStatus},
};

/// A user's derived progress on one challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeStatus {
    pub challenge_id: String,
    pub state: ChallengeState,
    /// Set only when `state` is [`ChallengeState::Completed`]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct Evidence<'a> {
    latest_reviewed: Option<(DateTime<Utc>, &'a Verification)>,
    has_pending: bool,
}

/// Derives the status of every catalog challenge from a user's verifications.
///
/// The most recently reviewed verification decides the outcome, ties on
/// `reviewed_at` going to the higher id. A pending verification only matters
/// while nothing has been reviewed yet. Verifications for challenges outside
/// the catalog are ignored. The result follows catalog order.
pub fn derive_statuses(
    catalog: &ChallengeCatalog,
    verifications: &[Verification],
) -> Vec<ChallengeStatus> {
    let mut evidence: HashMap<&str, Evidence<'_>> = HashMap::new();
    for verification in verifications {
        let entry = evidence
            .entry(verification.challenge_id.as_str())
            .or_default();
        let Some(reviewed_at) = verification.reviewed_at else {
            entry.has_pending = true;
            continue;
        };
        let newer = entry.latest_reviewed.is_none_or(|(latest_at, latest)| {
            (reviewed_at, verification.id) > (latest_at, latest.id)
        });
        if newer {
            entry.latest_reviewed = Some((reviewed_at, verification));
        }
    }

    catalog
        .definitions()
        .iter()
        .map(|definition| {
            let entry = evidence.get(definition.id.as_str());
            let (state, completed_at) = match entry.and_then(|e| e.latest_reviewed) {
                Some((reviewed_at, v)) if v.status == VerificationStatus::Approved => {
                    (ChallengeState::Completed, Some(reviewed_at))
                }
                Some(_) => (ChallengeState::Rejected, None),
                None if entry.is_some_and(|e| e.has_pending) => {
                    (ChallengeState::PendingVerification, None)
                }
                None => (ChallengeState::InProgress, None),
            };
            ChallengeStatus {
                challenge_id: definition.id.clone(),
                state,
                completed_at,
            }
        })
        .collect()
}

/// Reads the user's verifications and derives their current challenge status.
///
/// Performs no writes. Callers that need an authoritative answer should use
/// this instead of the stored projection, which is only as fresh as the last
/// reconciliation.
pub async fn resolve(
    store: &dyn Store,
    catalog: &ChallengeCatalog,
    user_id: Uuid,
) -> ServiceResult<Vec<ChallengeStatus>> {
    let verifications = store.list_verifications_for_user(user_id).await?;
    Ok(derive_statuses(catalog, &verifications))
}
