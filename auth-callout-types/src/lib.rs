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

//! Shared types for the guild broker auth callout.
//!
//! This crate defines the contract between the callout service, the
//! application token issuer and the NATS server: application token claims,
//! the role model, permission sets, issued user credential claims and the
//! request/response messages exchanged on the callout subject.
//! It is intentionally framework-agnostic — no NATS client, no crypto.

pub mod claims;
pub mod credential;
pub mod permissions;
pub mod wire;

pub use claims::{ApplicationClaims, Role};
pub use credential::{NatsUser, ResponsePermission, UserClaims};
pub use permissions::{Permission, PermissionSet};
pub use wire::{CalloutResponse, ClientInfo, ConnectOpts, InboundConnectionRequest};
