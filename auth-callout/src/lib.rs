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


//! Guild broker auth callout library.
//!
//! The NATS server forwards every client connection attempt to this service.
//! It verifies the application token the client presented, derives the
//! guild-scoped publish/subscribe permissions for the caller's role and
//! answers with a NATS user credential signed by the account nkey. The
//! binary entry point (`main.rs`) wires configuration, the NATS client and
//! [`transport::run`] together.

pub mod config;
pub mod error;
pub mod permissions;
pub mod service;
pub mod token;
pub mod token_validator;
pub mod transport;
