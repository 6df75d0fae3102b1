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

//! Service configuration loaded from environment variables.

use auth_callout_types::ResponsePermission;
use std::env;
use std::fmt;
use std::time::Duration;

/// Reserved system subject on which the NATS server publishes auth requests.
pub const DEFAULT_CALLOUT_SUBJECT: &str = "$SYS.REQ.USER.AUTH";

/// Configuration for the auth callout service.
#[derive(Clone)]
pub struct Config {
    /// NATS server URL (e.g. "nats://localhost:4222").
    pub nats_url: String,
    /// Credentials of the callout's own auth-exempt user, if any.
    pub nats_user: Option<(String, String)>,
    /// Account nkey seed (`SA...`) used to sign issued credentials.
    pub issuer_seed: String,
    /// Shared secret verifying application tokens (HMAC).
    pub app_jwt_secret: String,
    /// Broker account the issued credentials are scoped to.
    pub audience: String,
    /// Subject the service listens on for connection requests.
    pub callout_subject: String,
    /// Optional queue group so several replicas share the load.
    pub queue_group: Option<String>,
    /// Lifetime of issued credentials (default: 24 hours).
    pub credential_ttl: Duration,
    /// Reply limits embedded into every issued credential.
    pub response_permission: ResponsePermission,
}

// Keeps the seed and secret out of `{:?}` output.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("nats_url", &self.nats_url)
            .field("nats_user", &self.nats_user.as_ref().map(|(user, _)| user))
            .field("audience", &self.audience)
            .field("callout_subject", &self.callout_subject)
            .field("queue_group", &self.queue_group)
            .field("credential_ttl", &self.credential_ttl)
            .field("response_permission", &self.response_permission)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Required
    /// - `ISSUER_SEED`
    /// - `APP_JWT_SECRET`
    ///
    /// # Optional
    /// - `NATS_URL` (default: `"nats://localhost:4222"`)
    /// - `NATS_USER`, `NATS_PASSWORD`
    /// - `AUTH_AUDIENCE` (default: `"APP"`)
    /// - `AUTH_CALLOUT_SUBJECT` (default: `"$SYS.REQ.USER.AUTH"`)
    /// - `AUTH_QUEUE_GROUP`
    /// - `CREDENTIAL_TTL_SECS` (default: `"86400"`)
    /// - `RESP_MAX_MSGS` (default: `"1"`), `RESP_TTL_MS` (default: `"5000"`)
    pub fn from_env() -> Result<Self, String> {
        let issuer_seed = required("ISSUER_SEED")?;
        if !issuer_seed.starts_with("SA") {
            return Err("ISSUER_SEED must be an account nkey seed (SA...)".to_string());
        }
        let app_jwt_secret = required("APP_JWT_SECRET")?;

        let nats_url = optional("NATS_URL").unwrap_or_else(|| "nats://localhost:4222".to_string());
        let nats_user = match optional("NATS_USER") {
            Some(user) => {
                let password = env::var("NATS_PASSWORD")
                    .map_err(|_| "NATS_PASSWORD required when NATS_USER is set")?;
                Some((user, password))
            }
            None => None,
        };
        let audience = optional("AUTH_AUDIENCE").unwrap_or_else(|| "APP".to_string());
        let callout_subject =
            optional("AUTH_CALLOUT_SUBJECT").unwrap_or_else(|| DEFAULT_CALLOUT_SUBJECT.to_string());
        let queue_group = optional("AUTH_QUEUE_GROUP");

        let ttl_secs = parse_positive("CREDENTIAL_TTL_SECS", 86_400)?;
        let max_msgs = parse_positive("RESP_MAX_MSGS", 1)?;
        let resp_ttl_ms = parse_positive("RESP_TTL_MS", 5_000)?;

        Ok(Self {
            nats_url,
            nats_user,
            issuer_seed,
            app_jwt_secret,
            audience,
            callout_subject,
            queue_group,
            credential_ttl: Duration::from_secs(ttl_secs),
            response_permission: ResponsePermission {
                max_msgs: i64::try_from(max_msgs)
                    .map_err(|_| "RESP_MAX_MSGS is out of range".to_string())?,
                ttl: Duration::from_millis(resp_ttl_ms),
            },
        })
    }
}

fn required(name: &str) -> Result<String, String> {
    optional(name).ok_or_else(|| format!("{name} environment variable is required"))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|s| !s.is_empty())
}

fn parse_positive(name: &str, default: u64) -> Result<u64, String> {
    match optional(name) {
        None => Ok(default),
        Some(raw) => match raw.parse::<u64>() {
            Ok(0) | Err(_) => Err(format!("{name} must be a positive integer")),
            Ok(value) => Ok(value),
        },
    }
}
