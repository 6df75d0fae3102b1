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

//! Application token claims.
//!
//! The application token is a signed JWT issued by the game backend. The
//! callout verifies the signature and reads the identity, the guild the
//! client acts in and the coarse role within that guild.

use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Coarse authorization level of a guild member.
///
/// Any role string other than the three known values maps to
/// [`Role::Viewer`], the least privileged role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    #[default]
    Viewer,
    Player,
    Editor,
}

impl Role {
    /// Total mapping from a raw role claim to a [`Role`].
    ///
    /// Matching is exact; `"Editor"` or `" editor"` are not `editor`.
    pub fn from_claim(raw: &str) -> Self {
        match raw {
            "editor" => Role::Editor,
            "player" => Role::Player,
            _ => Role::Viewer,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Player => "player",
            Role::Editor => "editor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RoleVisitor)
    }
}

/// Accepts any JSON value so that a role of the wrong type degrades to
/// `viewer` instead of failing the whole token.
struct RoleVisitor;

impl<'de> Visitor<'de> for RoleVisitor {
    type Value = Role;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a role string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Role, E> {
        Ok(Role::from_claim(v))
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<Role, E> {
        Ok(Role::Viewer)
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<Role, E> {
        Ok(Role::Viewer)
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<Role, E> {
        Ok(Role::Viewer)
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<Role, E> {
        Ok(Role::Viewer)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Role, E> {
        Ok(Role::Viewer)
    }

    fn visit_none<E: de::Error>(self) -> Result<Role, E> {
        Ok(Role::Viewer)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Role, D::Error> {
        deserializer.deserialize_any(RoleVisitor)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Role, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(Role::Viewer)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Role, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(Role::Viewer)
    }
}

/// JWT payload of an application token.
///
/// # Example payload
///
/// ```json
/// {
///   "sub": "user-8812",
///   "guild_id": "guild-42",
///   "role": "player",
///   "iat": 1707000000,
///   "exp": 1707086400
/// }
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ApplicationClaims {
    /// End-user identifier.
    pub sub: String,

    /// Guild (tenant) the user acts in. Every derived permission is scoped to it.
    #[serde(alias = "guild")]
    pub guild_id: String,

    /// Missing or unknown roles deserialize as [`Role::Viewer`].
    #[serde(default)]
    pub role: Role,

    /// Issued-at timestamp (Unix seconds).
    #[serde(default)]
    pub iat: i64,

    /// Expiration timestamp (Unix seconds).
    pub exp: i64,
}
