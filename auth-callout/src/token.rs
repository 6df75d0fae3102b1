/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 */

//! User credential signing and decoding.
//!
//! Credentials use the NATS JWT encoding: a `{"typ":"JWT","alg":"ed25519-nkey"}`
//! header and the claims, each serialized as JSON and base64url-encoded
//! without padding, followed by the raw Ed25519 signature over
//! `header.payload`. The NATS server verifies them with the issuer's public
//! account nkey.

use crate::error::{CredentialError, TokenError};
use auth_callout_types::UserClaims;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use nkeys::KeyPair;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const TOKEN_TYPE: &str = "JWT";
pub const ALGORITHM: &str = "ed25519-nkey";
/// Algorithm name used by version 1 NATS JWTs; still accepted when decoding.
const LEGACY_ALGORITHM: &str = "ed25519";

#[derive(Debug, Serialize, Deserialize)]
struct JwtHeader {
    typ: String,
    alg: String,
}

/// Anything that can sign user credentials.
pub trait IssueCredential: Send + Sync {
    /// Public nkey that will appear as `iss` on every credential.
    fn issuer(&self) -> &str;

    /// Sign `claims`, overwriting `iss` with [`IssueCredential::issuer`].
    fn issue(&self, claims: UserClaims) -> Result<String, CredentialError>;
}

/// Signs user credentials with an account nkey.
///
/// The key pair is immutable after construction and shared through an `Arc`,
/// so clones are cheap and safe to hand to concurrent tasks.
#[derive(Clone)]
pub struct CredentialSigner {
    key_pair: Arc<KeyPair>,
    issuer: String,
}

impl CredentialSigner {
    pub fn new(key_pair: KeyPair) -> Self {
        let issuer = key_pair.public_key();
        Self {
            key_pair: Arc::new(key_pair),
            issuer,
        }
    }

    pub fn from_seed(seed: &str) -> Result<Self, CredentialError> {
        KeyPair::from_seed(seed)
            .map(Self::new)
            .map_err(|e| CredentialError::InvalidSeed(e.to_string()))
    }
}

impl IssueCredential for CredentialSigner {
    fn issuer(&self) -> &str {
        &self.issuer
    }

    fn issue(&self, mut claims: UserClaims) -> Result<String, CredentialError> {
        claims.iss = self.issuer.clone();

        let header = JwtHeader {
            typ: TOKEN_TYPE.to_string(),
            alg: ALGORITHM.to_string(),
        };
        let header = serde_json::to_vec(&header)
            .map_err(|e| CredentialError::SigningFailed(format!("header encoding: {e}")))?;
        let payload = serde_json::to_vec(&claims)
            .map_err(|e| CredentialError::SigningFailed(format!("claims encoding: {e}")))?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(payload)
        );
        let signature = self
            .key_pair
            .sign(signing_input.as_bytes())
            .map_err(|e| CredentialError::SigningFailed(e.to_string()))?;

        Ok(format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }
}

/// Verify and decode a user credential signed by `expected_issuer`.
///
/// Checks the header algorithm, that `iss` names the expected account key and
/// that the signature verifies against it. Expiry is left to the broker.
pub fn decode_credential(token: &str, expected_issuer: &str) -> Result<UserClaims, TokenError> {
    let mut segments = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::Malformed("expected 3 segments".to_string()));
    };

    let decode = |segment: &str| {
        URL_SAFE_NO_PAD
            .decode(segment)
            .map_err(|e| TokenError::Malformed(format!("bad base64url segment: {e}")))
    };

    let header: JwtHeader = serde_json::from_slice(&decode(header)?)
        .map_err(|e| TokenError::Malformed(format!("bad header: {e}")))?;
    if header.alg != ALGORITHM && header.alg != LEGACY_ALGORITHM {
        return Err(TokenError::Malformed(format!(
            "unsupported algorithm {}",
            header.alg
        )));
    }

    let claims: UserClaims = serde_json::from_slice(&decode(payload)?)
        .map_err(|e| TokenError::Malformed(format!("bad claims: {e}")))?;
    if claims.iss != expected_issuer {
        return Err(TokenError::InvalidSignature);
    }

    let verifier = KeyPair::from_public_key(expected_issuer)
        .map_err(|e| TokenError::Malformed(format!("bad issuer key: {e}")))?;
    let signing_input_len = token.len() - signature.len() - 1;
    verifier
        .verify(token[..signing_input_len].as_bytes(), &decode(signature)?)
        .map_err(|_| TokenError::InvalidSignature)?;

    Ok(claims)
}
