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

//! NATS transport for the auth callout.
//!
//! Subscribes to the callout subject, hands every request to a fresh task and
//! replies on the request's reply subject. Replies go through the narrow
//! [`Responder`] trait so the request path can be exercised without a broker.

use crate::error::RespondError;
use crate::service::CalloutService;
use crate::token::IssueCredential;
use crate::token_validator::VerifyToken;
use anyhow::anyhow;
use async_nats::Client;
use auth_callout_types::{CalloutResponse, InboundConnectionRequest};
use bytes::Bytes;
use futures::StreamExt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const INVALID_REQUEST: &str = "invalid request format";

/// A connection request as received from the broker.
#[derive(Debug, Clone)]
pub struct CalloutMessage {
    pub subject: String,
    pub reply: Option<String>,
    pub payload: Bytes,
}

impl From<async_nats::Message> for CalloutMessage {
    fn from(msg: async_nats::Message) -> Self {
        Self {
            subject: msg.subject.to_string(),
            reply: msg.reply.map(|reply| reply.to_string()),
            payload: msg.payload,
        }
    }
}

/// Sends a reply for a received message.
pub trait Responder: Send + Sync {
    fn respond(
        &self,
        original: &CalloutMessage,
        payload: Bytes,
    ) -> impl Future<Output = Result<(), RespondError>> + Send;
}

/// Replies by publishing to the message's reply subject.
#[derive(Clone)]
pub struct NatsResponder {
    client: Client,
}

impl NatsResponder {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Responder for NatsResponder {
    async fn respond(&self, original: &CalloutMessage, payload: Bytes) -> Result<(), RespondError> {
        let reply = original.reply.clone().ok_or(RespondError::NoReplySubject)?;
        self.client
            .publish(reply, payload)
            .await
            .map_err(|e| RespondError::Publish(e.to_string()))
    }
}

/// Decode a raw request body and run it through the service.
pub fn process_payload<V, S>(service: &CalloutService<V, S>, payload: &[u8]) -> CalloutResponse
where
    V: VerifyToken,
    S: IssueCredential,
{
    match serde_json::from_slice::<InboundConnectionRequest>(payload) {
        Ok(request) => service.handle_connection_request(&request),
        Err(e) => {
            warn!(error = %e, "malformed connection request");
            CalloutResponse::denied(INVALID_REQUEST)
        }
    }
}

/// Handle one callout message end to end. Reply failures are logged and
/// dropped; the broker times the connection attempt out on its own.
#[tracing::instrument(level = "debug", skip_all, fields(subject = %message.subject))]
pub async fn handle_message<V, S, R>(
    service: &CalloutService<V, S>,
    responder: &R,
    message: CalloutMessage,
) where
    V: VerifyToken,
    S: IssueCredential,
    R: Responder,
{
    let response = process_payload(service, &message.payload);
    let body = match serde_json::to_vec(&response) {
        Ok(body) => Bytes::from(body),
        Err(e) => {
            error!("failed to encode callout response: {e}");
            return;
        }
    };

    match responder.respond(&message, body).await {
        Ok(()) => debug!(granted = response.jwt().is_some(), "replied to callout"),
        Err(e) => error!("failed to reply to callout request: {e}"),
    }
}

/// Serve callout requests until `shutdown` resolves or the subscription ends.
pub async fn run<V, S>(
    client: Client,
    service: Arc<CalloutService<V, S>>,
    subject: String,
    queue_group: Option<String>,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<()>
where
    V: VerifyToken + 'static,
    S: IssueCredential + 'static,
{
    let subscription = match queue_group {
        Some(group) => client.queue_subscribe(subject.clone(), group).await,
        None => client.subscribe(subject.clone()).await,
    };
    let mut subscriber = subscription
        .map_err(|e| anyhow!("error subscribing to subject {subject}: {e}"))?;
    info!("Subscribed to subject {}", subject);

    let responder = Arc::new(NatsResponder::new(client.clone()));
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown requested");
                break;
            }
            message = subscriber.next() => {
                let Some(message) = message else {
                    warn!("callout subscription closed");
                    break;
                };
                let service = service.clone();
                let responder = responder.clone();
                tokio::spawn(async move {
                    handle_message(&*service, &*responder, message.into()).await;
                });
            }
        }
    }

    subscriber
        .unsubscribe()
        .await
        .map_err(|e| anyhow!("error unsubscribing from {subject}: {e}"))?;
    client
        .flush()
        .await
        .map_err(|e| anyhow!("error flushing NATS client: {e}"))?;
    Ok(())
}
