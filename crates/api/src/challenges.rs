// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Challenge verification workflow: evidence submission, admin review, and the
//! derived per-user challenge status.
//!
//! Stored challenge statuses are a projection of the verification history.
//! The last reconciliation wins; callers that need the current truth use
//! [`resolver::resolve`] instead of reading the stored projection.

mod catalog;
mod error;
pub mod notifications;
pub mod reconcile;
pub mod resolver;
pub mod review;
pub mod status;
pub mod verifications;

pub use catalog::{CatalogError, ChallengeCatalog, ChallengeDefinition};
pub use error::{ErrorKind, ServiceError, ServiceResult};
