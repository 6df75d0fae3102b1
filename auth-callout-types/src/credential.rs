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

//! Issued user credential (NATS user JWT) claims.
//!
//! The callout signs these claims with its account nkey and hands the token
//! back to the NATS server, which enforces the embedded permissions for the
//! lifetime of the connection.

use crate::permissions::PermissionSet;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// JWT payload of an issued user credential.
///
/// # Example payload
///
/// ```json
/// {
///   "jti": "6f1c0c6e-5d0e-4d0b-9a51-3f7d1f7f1a11",
///   "iat": 1707000000,
///   "iss": "ADQ3...",
///   "name": "user-8812",
///   "sub": "UCXK...",
///   "aud": "APP",
///   "exp": 1707086400,
///   "nats": {
///     "pub": { "allow": ["round.participant.join.guild-42"] },
///     "sub": { "allow": ["round.*.guild-42"] },
///     "resp": { "max": 1, "ttl": 5000000000 },
///     "type": "user",
///     "version": 2
///   }
/// }
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct UserClaims {
    /// Unique credential id.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub jti: String,

    /// Issued-at timestamp (Unix seconds).
    pub iat: i64,

    /// Public account nkey of the signer. Always set by the signer itself.
    pub iss: String,

    /// Application subject id, for diagnostics only.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Broker-assigned user nkey for this connection.
    pub sub: String,

    /// Broker account the credential is scoped to.
    pub aud: String,

    /// Expiration timestamp (Unix seconds).
    pub exp: i64,

    pub nats: NatsUser,
}

/// The `nats` section of a user JWT.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NatsUser {
    #[serde(flatten)]
    pub permissions: PermissionSet,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resp: Option<ResponsePermission>,

    #[serde(rename = "type")]
    pub kind: String,

    pub version: u32,
}

impl NatsUser {
    pub const CLAIM_TYPE: &'static str = "user";
    pub const VERSION: u32 = 2;

    pub fn new(permissions: PermissionSet, resp: Option<ResponsePermission>) -> Self {
        Self {
            permissions,
            resp,
            kind: Self::CLAIM_TYPE.to_string(),
            version: Self::VERSION,
        }
    }
}

/// Bounds request/reply exchanges addressed to this identity.
///
/// `ttl` is carried on the wire in nanoseconds, as the NATS server expects.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ResponsePermission {
    #[serde(rename = "max")]
    pub max_msgs: i64,
    #[serde(with = "duration_nanos")]
    pub ttl: Duration,
}

impl Default for ResponsePermission {
    fn default() -> Self {
        Self {
            max_msgs: 1,
            ttl: Duration::from_millis(5000),
        }
    }
}

mod duration_nanos {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_nanos()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_nanos)
    }
}
