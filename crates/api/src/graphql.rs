// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{net::IpAddr, sync::Arc};

use juniper::EmptySubscription;
pub use mutation::Mutation;
pub use query::Query;

use crate::{
    challenges::{ChallengeCatalog, ServiceError, ServiceResult},
    db::Store,
    graphql::auth::UserRole,
};

pub mod auth;
mod handlers;
mod mutation;
mod query;

#[derive(Clone)]
pub struct BaseContext {
    pub store: Arc<dyn Store>,
    pub catalog: Arc<ChallengeCatalog>,
    pub verifying_key: Option<ed25519_dalek::VerifyingKey>,
    pub strict_status_updates: bool,
}

pub struct Context {
    base: BaseContext,
    ip: IpAddr,
    user: Option<AuthenticatedUser>,
}

impl juniper::Context for Context {}

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: uuid::Uuid,
    pub role: UserRole,
}

impl Context {
    pub fn new(base: BaseContext, ip: IpAddr, user_details: Option<AuthenticatedUser>) -> Self {
        Self {
            base,
            ip,
            user: user_details,
        }
    }

    /// Resolves the caller from an `Authorization: Bearer …` header value.
    pub fn authenticate(base: &BaseContext, authorization: Option<&str>) -> Option<AuthenticatedUser> {
        let token = authorization?.strip_prefix("Bearer ")?;
        let key = base.verifying_key.as_ref()?;
        match auth::verify_access_token(token.trim(), key) {
            Ok(claims) => Some(AuthenticatedUser {
                user_id: claims.sub,
                role: claims.role,
            }),
            Err(e) => {
                tracing::debug!("Rejected access token: {e}");
                None
            }
        }
    }

    pub fn store(&self) -> &dyn Store {
        self.base.store.as_ref()
    }

    pub fn catalog(&self) -> &ChallengeCatalog {
        &self.base.catalog
    }

    pub fn strict_status_updates(&self) -> bool {
        self.base.strict_status_updates
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn role(&self) -> Option<UserRole> {
        self.user.as_ref().map(|u| u.role)
    }

    pub fn require_authentication(&self) -> ServiceResult<AuthenticatedUser> {
        self.user.clone().ok_or(ServiceError::Unauthenticated)
    }

    pub fn require_admin(&self) -> ServiceResult<AuthenticatedUser> {
        let user = self.require_authentication()?;
        if user.role >= UserRole::Admin {
            Ok(user)
        } else {
            Err(ServiceError::Forbidden)
        }
    }

    /// The user an operation targets: the caller by default, anyone for admins.
    pub fn target_user(&self, user_id: Option<String>) -> ServiceResult<uuid::Uuid> {
        let caller = self.require_authentication()?;
        match user_id {
            None => Ok(caller.user_id),
            Some(raw) => {
                let requested = parse_id(&raw, "user")?;
                if requested != caller.user_id && caller.role < UserRole::Admin {
                    return Err(ServiceError::Forbidden);
                }
                Ok(requested)
            }
        }
    }

    pub fn get_ip(&self) -> &IpAddr {
        &self.ip
    }
}

pub(crate) fn parse_id(raw: &str, what: &str) -> ServiceResult<uuid::Uuid> {
    uuid::Uuid::parse_str(raw.trim())
        .map_err(|_| ServiceError::validation(format!("Invalid {what} ID: {raw:?}")))
}

/// GraphQL `Int` is 32-bit; larger counts saturate.
pub(crate) fn count(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

pub type Schema = juniper::RootNode<Query, Mutation, EmptySubscription<Context>>;
