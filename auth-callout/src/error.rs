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

//! Error types for token verification, credential signing and replying.
//!
//! [`TokenError`] messages are returned to the connecting client, so they
//! describe token validity only. [`CredentialError`] carries operational
//! detail and is only ever logged.

use thiserror::Error;

/// Why a presented token was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Wrong segmentation, undecodable segments, bad JSON or unusable claims.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// The signature does not match the configured verification key.
    #[error("signature verification failed")]
    InvalidSignature,

    /// `exp` is at or before the verification time.
    #[error("token has expired")]
    Expired,
}

/// Failure to produce a signed user credential.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("invalid signing seed: {0}")]
    InvalidSeed(String),

    #[error("signing failed: {0}")]
    SigningFailed(String),
}

/// Failure to send a callout reply back to the broker.
#[derive(Debug, Error)]
pub enum RespondError {
    #[error("message has no reply subject")]
    NoReplySubject,

    #[error("failed to publish reply: {0}")]
    Publish(String),
}
