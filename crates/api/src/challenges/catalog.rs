// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{collections::HashSet, path::Path};

use juniper::GraphQLObject;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(GraphQLObject, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeDefinition {
    /// Stable identifier, e.g. `FIRST_VISIT`
    pub id: String,
    pub title: String,
    /// Whether completing the challenge needs photo evidence
    pub requires_evidence: bool,
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read challenge catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse challenge catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Challenge catalog is empty")]
    Empty,
    #[error("Challenge catalog contains an entry with an empty id")]
    BlankId,
    #[error("Duplicate challenge id in catalog: {0}")]
    DuplicateId(String),
}

/// The fixed set of challenges every user can work on. Loaded once at startup.
#[derive(Debug, Clone)]
pub struct ChallengeCatalog {
    definitions: Vec<ChallengeDefinition>,
}

fn builtin(id: &str, title: &str, requires_evidence: bool) -> ChallengeDefinition {
    ChallengeDefinition {
        id: id.to_string(),
        title: title.to_string(),
        requires_evidence,
    }
}

impl ChallengeCatalog {
    pub fn new(definitions: Vec<ChallengeDefinition>) -> Result<Self, CatalogError> {
        if definitions.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for definition in &definitions {
            if definition.id.trim().is_empty() {
                return Err(CatalogError::BlankId);
            }
            if !seen.insert(definition.id.as_str()) {
                return Err(CatalogError::DuplicateId(definition.id.clone()));
            }
        }
        Ok(Self { definitions })
    }

    pub fn builtin() -> Self {
        Self {
            definitions: vec![
                builtin("FIRST_VISIT", "Visit your published site", true),
                builtin("CREATE_SITE", "Create your first site", false),
                builtin("CUSTOMIZE_THEME", "Customize your site theme", true),
                builtin("PUBLISH_SITE", "Publish your site to a subdomain", true),
                builtin("SHARE_SITE", "Share your site with a friend", true),
            ],
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, CatalogError> {
        Self::new(serde_json::from_str(contents)?)
    }

    pub fn get(&self, id: &str) -> Option<&ChallengeDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn definitions(&self) -> &[ChallengeDefinition] {
        &self.definitions
    }
}
