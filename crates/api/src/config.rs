// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Postgres connection string. Without it, state is kept in memory only.
    pub database_url: Option<String>,
    pub listen_addr: SocketAddr,
    /// JSON-serialized ed25519 verifying key of the auth service
    pub auth_public_key_file: Option<PathBuf>,
    pub challenge_catalog_file: Option<PathBuf>,
    pub reconcile_interval: Option<Duration>,
    pub strict_status_updates: bool,
}

fn invalid(var: &'static str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

impl Config {
    /// Reads the configuration from the process environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv()
            && !e.not_found()
        {
            tracing::warn!("Failed to load .env file: {e}");
        }
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let listen_addr = match get("LISTEN_ADDR") {
            Some(value) => value
                .parse()
                .map_err(|e| invalid("LISTEN_ADDR", &value, e))?,
            None => SocketAddr::from(([0, 0, 0, 0, 0, 0, 0, 0], 3000)),
        };

        let reconcile_interval = match get("RECONCILE_INTERVAL_SECS") {
            Some(value) => match value.parse::<u64>() {
                Ok(0) => return Err(invalid("RECONCILE_INTERVAL_SECS", &value, "must be positive")),
                Ok(secs) => Some(Duration::from_secs(secs)),
                Err(e) => return Err(invalid("RECONCILE_INTERVAL_SECS", &value, e)),
            },
            None => None,
        };

        let strict_status_updates = match get("STRICT_STATUS_UPDATES") {
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => return Err(invalid("STRICT_STATUS_UPDATES", &value, "expected a boolean")),
            },
            None => false,
        };

        Ok(Self {
            database_url: get("DATABASE_URL"),
            listen_addr,
            auth_public_key_file: get("AUTH_PUBLIC_KEY_FILE").map(PathBuf::from),
            challenge_catalog_file: get("CHALLENGE_CATALOG_FILE").map(PathBuf::from),
            reconcile_interval,
            strict_status_updates,
        })
    }
}
