// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Verification of access tokens issued by the platform's auth service.
//!
//! Tokens are compact JWTs signed with EdDSA. This service only ever verifies
//! them; issuing and refreshing sessions happens elsewhere.

use std::path::Path;

use base64::prelude::*;
use ed25519_dalek::{Signature, SignatureError, Verifier, VerifyingKey};
use juniper::GraphQLEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(
    Debug, PartialEq, Eq, Deserialize, Serialize, Clone, Copy, Ord, PartialOrd, GraphQLEnum,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    User,
    Admin,
}

#[derive(Serialize, Deserialize)]
struct JwtHeader {
    alg: String,
    typ: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub role: UserRole,
    pub exp: i64,
    pub iat: i64,
    pub nbf: i64,
}

impl AccessClaims {
    pub fn is_valid_at(&self, timestamp: i64) -> bool {
        timestamp >= self.nbf && timestamp <= self.exp
    }
}

#[derive(Error, Debug)]
pub enum JwtValidationError {
    #[error("Invalid JWT format")]
    InvalidFormat,
    #[error("Base64 decoding error: {0}")]
    Base64DecodingError(#[from] base64::DecodeError),
    #[error("Unsupported JWT algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("Invalid JWT signature: {0}")]
    InvalidSignature(#[from] SignatureError),
    #[error("JWT parsing error: {0}")]
    ParsingError(#[from] serde_json::Error),
    #[error("JWT is not valid at the current time")]
    InvalidTime,
}

#[derive(Error, Debug)]
pub enum KeyLoadError {
    #[error("Failed to read verifying key: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse verifying key: {0}")]
    Parse(#[from] serde_json::Error),
}

pub fn load_verifying_key(path: &Path) -> Result<VerifyingKey, KeyLoadError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Checks signature and validity window of `token` and returns its claims.
pub fn verify_access_token(
    token: &str,
    verifying_key: &VerifyingKey,
) -> Result<AccessClaims, JwtValidationError> {
    let (signed_data, signature_segment) = token
        .rsplit_once('.')
        .ok_or(JwtValidationError::InvalidFormat)?;
    let (header_segment, payload_segment) = signed_data
        .split_once('.')
        .ok_or(JwtValidationError::InvalidFormat)?;
    if payload_segment.contains('.') {
        return Err(JwtValidationError::InvalidFormat);
    }

    let header: JwtHeader = serde_json::from_slice(&BASE64_URL_SAFE.decode(header_segment)?)?;
    if header.alg != "EdDSA" {
        return Err(JwtValidationError::UnsupportedAlgorithm(header.alg));
    }

    let signature = Signature::from_slice(&BASE64_URL_SAFE.decode(signature_segment)?)?;
    verifying_key.verify(signed_data.as_bytes(), &signature)?;

    let claims: AccessClaims =
        serde_json::from_slice(&BASE64_URL_SAFE.decode(payload_segment)?)?;
    if !claims.is_valid_at(chrono::Utc::now().timestamp()) {
        return Err(JwtValidationError::InvalidTime);
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::{SigningKey, ed25519::signature::Signer};
    use rand::rngs::OsRng;

    use super::*;

    fn sign(claims: &AccessClaims, key: &SigningKey) -> String {
        let header = JwtHeader {
            alg: "EdDSA".to_string(),
            typ: "JWT".to_string(),
        };
        let signing_input = format!(
            "{}.{}",
            BASE64_URL_SAFE.encode(serde_json::to_vec(&header).unwrap()),
            BASE64_URL_SAFE.encode(serde_json::to_vec(claims).unwrap())
        );
        let signature: Signature = key.sign(signing_input.as_bytes());
        format!(
            "{signing_input}.{}",
            BASE64_URL_SAFE.encode(signature.to_bytes())
        )
    }

    fn claims(valid_for: i64) -> AccessClaims {
        let now = chrono::Utc::now().timestamp();
        AccessClaims {
            sub: Uuid::now_v7(),
            role: UserRole::Admin,
            exp: now + valid_for,
            iat: now,
            nbf: now,
        }
    }

    #[test]
    fn test_valid_token() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let issued = claims(600);
        let token = sign(&issued, &signing_key);

        let verified = verify_access_token(&token, &signing_key.verifying_key())
            .expect("Failed to verify token");
        assert_eq!(verified.sub, issued.sub);
        assert_eq!(verified.role, UserRole::Admin);
    }

    #[test]
    fn test_invalid_signature() {
        let token = sign(&claims(600), &SigningKey::generate(&mut OsRng));
        let other = SigningKey::generate(&mut OsRng).verifying_key();
        assert!(matches!(
            verify_access_token(&token, &other),
            Err(JwtValidationError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_expired_token() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let token = sign(&claims(-60), &signing_key);
        assert!(matches!(
            verify_access_token(&token, &signing_key.verifying_key()),
            Err(JwtValidationError::InvalidTime)
        ));
    }

    #[test]
    fn test_malformed_token() {
        let key = SigningKey::generate(&mut OsRng).verifying_key();
        for token in ["", "abc", "a.b", "a.b.c.d"] {
            assert!(verify_access_token(token, &key).is_err(), "{token}");
        }
    }

    #[test]
    fn test_verifying_key_round_trips_through_json() {
        let key = SigningKey::generate(&mut OsRng).verifying_key();
        let path = std::env::temp_dir().join(format!("hostonhome-key-{}", Uuid::now_v7()));
        std::fs::write(&path, serde_json::to_string(&key).unwrap()).unwrap();
        let loaded = load_verifying_key(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, key);
    }
}
