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

//! Application token validation.
//!
//! Verifies the JWT a client presents in its connect options: three
//! base64url segments, an HMAC signature computed with the configured
//! secret, strongly typed claims and an `exp` strictly after now.

use crate::error::TokenError;
use auth_callout_types::ApplicationClaims;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};

/// Algorithms accepted for application tokens. The verification key is a
/// shared secret, so only the HMAC family can ever validate.
const ACCEPTED_ALGORITHMS: &[Algorithm] = &[Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Anything that can turn a presented token into verified claims.
pub trait VerifyToken: Send + Sync {
    /// Verify `token` as of the Unix timestamp `now`.
    fn verify_at(&self, token: &str, now: i64) -> Result<ApplicationClaims, TokenError>;

    fn verify(&self, token: &str) -> Result<ApplicationClaims, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }
}

/// Verifier for application tokens signed with a shared secret.
///
/// Holds only the decoding key; cheap to share across tasks.
#[derive(Clone)]
pub struct AppTokenVerifier {
    key: DecodingKey,
}

impl AppTokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

impl VerifyToken for AppTokenVerifier {
    fn verify_at(&self, token: &str, now: i64) -> Result<ApplicationClaims, TokenError> {
        check_segments(token)?;

        let header = jsonwebtoken::decode_header(token)
            .map_err(|e| TokenError::Malformed(format!("bad header: {e}")))?;
        if !ACCEPTED_ALGORITHMS.contains(&header.alg) {
            return Err(TokenError::Malformed(format!(
                "unsupported algorithm {:?}",
                header.alg
            )));
        }

        let mut validation = Validation::new(header.alg);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        validation.set_required_spec_claims(&["exp", "sub"]);
        // Expiry is checked below with an exclusive boundary and no leeway.
        validation.validate_exp = false;
        validation.validate_aud = false;

        let claims = jsonwebtoken::decode::<ApplicationClaims>(token, &self.key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed(e.to_string()),
            })?
            .claims;

        check_identifier("sub", &claims.sub)?;
        check_identifier("guild_id", &claims.guild_id)?;

        if claims.exp <= now {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

fn check_segments(token: &str) -> Result<(), TokenError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(TokenError::Malformed(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    }
    for segment in segments {
        if segment.is_empty() || URL_SAFE_NO_PAD.decode(segment).is_err() {
            return Err(TokenError::Malformed(
                "segments must be non-empty base64url".to_string(),
            ));
        }
    }
    Ok(())
}

/// Identifiers are substituted into subject patterns, so each one must stay
/// a single subject token.
fn check_identifier(claim: &str, value: &str) -> Result<(), TokenError> {
    if value.is_empty() {
        return Err(TokenError::Malformed(format!("missing {claim} claim")));
    }
    if value
        .chars()
        .any(|c| matches!(c, '.' | '*' | '>') || c.is_whitespace() || c.is_control())
    {
        return Err(TokenError::Malformed(format!(
            "{claim} contains characters not allowed in a subject"
        )));
    }
    Ok(())
}
