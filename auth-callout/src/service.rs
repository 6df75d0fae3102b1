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

//! Callout orchestration.
//!
//! Each connection request walks
//! `Start → TokenExtracted → Verified → PermissionsBuilt → Issued` and ends in
//! either a signed credential or a denial. Nothing is retried and nothing is
//! kept between requests.

use crate::config::Config;
use crate::error::{CredentialError, TokenError};
use crate::permissions::build_permissions;
use crate::token::{CredentialSigner, IssueCredential};
use crate::token_validator::{AppTokenVerifier, VerifyToken};
use auth_callout_types::{
    CalloutResponse, InboundConnectionRequest, NatsUser, ResponsePermission, UserClaims,
};
use chrono::Utc;
use nkeys::KeyPair;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

pub const MISSING_TOKEN: &str = "missing authentication token";
pub const SIGNING_FAILED: &str = "internal error generating credentials";

const DEFAULT_CREDENTIAL_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Progress of a single connection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    TokenExtracted,
    Verified,
    PermissionsBuilt,
    Issued,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::TokenExtracted => "token_extracted",
            Stage::Verified => "verified",
            Stage::PermissionsBuilt => "permissions_built",
            Stage::Issued => "issued",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
enum Denial {
    MissingToken,
    InvalidToken(TokenError),
    SigningFailed(CredentialError),
}

impl Denial {
    /// The last stage reached before the request was denied.
    fn stage(&self) -> Stage {
        match self {
            Denial::MissingToken => Stage::Start,
            Denial::InvalidToken(_) => Stage::TokenExtracted,
            Denial::SigningFailed(_) => Stage::PermissionsBuilt,
        }
    }

    /// Reason sent back to the client.
    fn reason(&self) -> String {
        match self {
            Denial::MissingToken => MISSING_TOKEN.to_string(),
            Denial::InvalidToken(e) => format!("invalid token: {e}"),
            Denial::SigningFailed(_) => SIGNING_FAILED.to_string(),
        }
    }
}

/// Turns connection requests into callout responses.
///
/// Holds only read-only state, so one instance behind an `Arc` serves every
/// concurrent request.
pub struct CalloutService<V = AppTokenVerifier, S = CredentialSigner> {
    verifier: V,
    signer: S,
    audience: String,
    credential_ttl: Duration,
    response_permission: ResponsePermission,
}

impl CalloutService {
    /// Build the production service from configuration.
    pub fn from_config(config: &Config) -> Result<Self, CredentialError> {
        let signer = CredentialSigner::from_seed(&config.issuer_seed)?;
        let verifier = AppTokenVerifier::new(&config.app_jwt_secret);
        Ok(Self::new(verifier, signer, config.audience.clone())
            .with_credential_ttl(config.credential_ttl)
            .with_response_permission(config.response_permission))
    }
}

impl<V: VerifyToken, S: IssueCredential> CalloutService<V, S> {
    pub fn new(verifier: V, signer: S, audience: impl Into<String>) -> Self {
        Self {
            verifier,
            signer,
            audience: audience.into(),
            credential_ttl: DEFAULT_CREDENTIAL_TTL,
            response_permission: ResponsePermission::default(),
        }
    }

    pub fn with_credential_ttl(mut self, ttl: Duration) -> Self {
        self.credential_ttl = ttl;
        self
    }

    pub fn with_response_permission(mut self, resp: ResponsePermission) -> Self {
        self.response_permission = resp;
        self
    }

    pub fn issuer(&self) -> &str {
        self.signer.issuer()
    }

    pub fn handle_connection_request(&self, req: &InboundConnectionRequest) -> CalloutResponse {
        self.handle_connection_request_at(req, Utc::now().timestamp())
    }

    /// Handle a request as of the Unix timestamp `now`.
    pub fn handle_connection_request_at(
        &self,
        req: &InboundConnectionRequest,
        now: i64,
    ) -> CalloutResponse {
        let host = req.client_info.host.as_deref().unwrap_or("unknown");

        match self.authorize(req, now) {
            Ok(jwt) => CalloutResponse::Issued(jwt),
            Err(denial) => {
                match &denial {
                    Denial::MissingToken => {
                        info!(host, "connection denied");
                    }
                    Denial::InvalidToken(e) => {
                        warn!(host, reason = %e, "connection denied: invalid token");
                    }
                    Denial::SigningFailed(e) => {
                        error!(host, error = %e, "failed to sign user credential");
                    }
                }
                debug!(
                    host,
                    connection_id = ?req.client_info.connection_id,
                    client_name = ?req.client_info.name,
                    stage = %denial.stage(),
                    reason = %denial.reason(),
                    "callout denied"
                );
                CalloutResponse::Denied(denial.reason())
            }
        }
    }

    fn authorize(&self, req: &InboundConnectionRequest, now: i64) -> Result<String, Denial> {
        let token = req.presented_credential().ok_or(Denial::MissingToken)?;
        trace!(stage = %Stage::TokenExtracted, "callout progress");

        let claims = self
            .verifier
            .verify_at(token, now)
            .map_err(Denial::InvalidToken)?;
        trace!(stage = %Stage::Verified, "callout progress");

        let permissions = build_permissions(claims.role, &claims.guild_id, &claims.sub);
        trace!(stage = %Stage::PermissionsBuilt, "callout progress");

        let subject = match req.user_nkey.as_deref() {
            Some(nkey) if !nkey.is_empty() => nkey.to_string(),
            _ => KeyPair::new_user().public_key(),
        };
        let ttl = i64::try_from(self.credential_ttl.as_secs()).unwrap_or(i64::MAX);

        let user = UserClaims {
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now,
            // Overwritten by the signer.
            iss: String::new(),
            name: claims.sub.clone(),
            sub: subject,
            aud: self.audience.clone(),
            exp: now.saturating_add(ttl),
            nats: NatsUser::new(permissions, Some(self.response_permission)),
        };

        let jwt = self.signer.issue(user).map_err(Denial::SigningFailed)?;

        debug!(
            sub = %claims.sub,
            guild = %claims.guild_id,
            role = %claims.role,
            stage = %Stage::Issued,
            "issued user credential"
        );
        Ok(jwt)
    }
}
