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

//! Messages exchanged with the NATS server on the auth callout subject.
//!
//! - Request: `{ "connect_opts": { "pass": "<token>" }, "client_info": { ... } }`
//! - Response: `{ "jwt": "<credential>" }` or `{ "error": "<reason>" }`

use serde::{Deserialize, Serialize};

/// One connection attempt as delivered by the broker.
///
/// Constructed per attempt and discarded once the callout has replied.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct InboundConnectionRequest {
    #[serde(default)]
    pub connect_opts: ConnectOpts,

    #[serde(default)]
    pub client_info: ClientInfo,

    /// Identity key the broker generated for this connection, when provided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_nkey: Option<String>,
}

impl InboundConnectionRequest {
    /// The application token presented by the client.
    ///
    /// Read from the password option; falls back to the token option.
    /// Empty strings count as absent.
    pub fn presented_credential(&self) -> Option<&str> {
        [&self.connect_opts.pass, &self.connect_opts.auth_token]
            .into_iter()
            .filter_map(|value| value.as_deref())
            .find(|value| !value.is_empty())
    }
}

/// Client connect options. Only the credential-bearing fields are read.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ConnectOpts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

/// Diagnostic metadata about the connecting client. Never trusted for
/// authorization.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Outcome of one callout: a signed credential or a denial reason, never both.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum CalloutResponse {
    #[serde(rename = "jwt")]
    Issued(String),
    #[serde(rename = "error")]
    Denied(String),
}

impl CalloutResponse {
    pub fn denied(reason: impl Into<String>) -> Self {
        CalloutResponse::Denied(reason.into())
    }

    pub fn jwt(&self) -> Option<&str> {
        match self {
            CalloutResponse::Issued(jwt) => Some(jwt),
            CalloutResponse::Denied(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            CalloutResponse::Issued(_) => None,
            CalloutResponse::Denied(reason) => Some(reason),
        }
    }
}
