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


//! End-to-end callout scenarios: broker request body in, reply body out,
//! with the real verifier, permission policy and nkey signer.


use auth_callout::transport::{handle_message, process_payload, INVALID_REQUEST};
use auth_callout_types::CalloutResponse;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use test_helpers::*;

fn sorted(mut v: Vec<String>) -> Vec<String> {
    v.sort();
    v
}

#[test]
fn missing_token_is_denied() {
    let service = build_service();
    let response = process_payload(&service, request_body("").as_bytes());
    assert_eq!(
        response,
        CalloutResponse::Denied("missing authentication token".to_string())
    );
}

#[test]
fn absent_connect_options_are_a_missing_token() {
    let service = build_service();
    let response = process_payload(&service, br#"{"client_info":{"host":"10.1.1.1"}}"#);
    assert_eq!(response.error(), Some("missing authentication token"));
}

#[test]
fn tampered_signature_is_denied() {
    let service = build_service();
    let token = app_token("u1", "G", "editor", 600);
    let (input, signature) = token.rsplit_once('.').unwrap();
    let mut sig = URL_SAFE_NO_PAD.decode(signature).unwrap();
    sig[0] ^= 0xff;
    let tampered = format!("{input}.{}", URL_SAFE_NO_PAD.encode(sig));

    let response = process_payload(&service, request_body(&tampered).as_bytes());
    let error = response.error().expect("should be denied");
    assert!(error.starts_with("invalid token"), "{error}");
    assert!(response.jwt().is_none());
}

#[test]
fn expired_token_is_denied_with_reason() {
    let service = build_service();
    let token = app_token("u1", "G", "editor", -5);
    let response = process_payload(&service, request_body(&token).as_bytes());
    assert_eq!(response.error(), Some("invalid token: token has expired"));
}

#[test]
fn token_signed_by_someone_else_is_denied() {
    let service = build_service();
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &serde_json::json!({ "sub": "u1", "guild_id": "G", "role": "editor", "exp": i64::MAX / 2 }),
        &jsonwebtoken::EncodingKey::from_secret(b"attacker"),
    )
    .unwrap();
    let response = process_payload(&service, request_body(&token).as_bytes());
    assert_eq!(
        response.error(),
        Some("invalid token: signature verification failed")
    );
}

#[test]
fn editor_gets_exactly_the_editor_publish_rights() {
    let service = build_service();
    let token = app_token("U", "G", "editor", 600);
    let response = process_payload(&service, request_body(&token).as_bytes());

    let jwt = response.jwt().expect("editor should be admitted");
    assert!(!jwt.is_empty());
    let claims = issued_claims(&service, jwt);

    assert_eq!(
        sorted(claims.nats.permissions.publish.allow.clone()),
        sorted(
            [
                "round.create.G",
                "round.update.G",
                "round.delete.G",
                "round.participant.*.G",
                "score.submit.G",
            ]
            .map(String::from)
            .to_vec()
        )
    );
    assert!(claims
        .nats
        .permissions
        .subscribe
        .allow
        .contains(&"score.*.G".to_string()));
    assert_eq!(claims.aud, TEST_AUDIENCE);
    assert_eq!(claims.iss, service.issuer());
    assert_eq!(claims.name, "U");
    assert_eq!(claims.nats.kind, "user");
    assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
}

#[test]
fn player_cannot_publish_score_submissions() {
    let service = build_service();
    let token = app_token("U", "G", "player", 600);
    let response = process_payload(&service, request_body(&token).as_bytes());

    let claims = issued_claims(&service, response.jwt().expect("player should be admitted"));
    let publish = &claims.nats.permissions.publish.allow;
    assert!(!publish.contains(&"score.submit.G".to_string()));
    assert_eq!(
        publish,
        &["round.participant.join.G", "round.participant.leave.G"]
    );
    assert!(claims
        .nats
        .permissions
        .subscribe
        .allow
        .contains(&"score.*.U".to_string()));
}

#[test]
fn unknown_role_is_admitted_as_viewer() {
    let service = build_service();
    let token = app_token("U", "G", "overlord", 600);
    let response = process_payload(&service, request_body(&token).as_bytes());

    let claims = issued_claims(&service, response.jwt().expect("should be admitted"));
    assert!(claims.nats.permissions.publish.allow.is_empty());
    assert_eq!(
        claims.nats.permissions.subscribe.allow,
        ["round.*.G", "leaderboard.*.G", "guild.*.G"]
    );
}

#[test]
fn credential_payload_has_broker_layout() {
    let service = build_service();
    let token = app_token("U", "G", "player", 600);
    let jwt = process_payload(&service, request_body(&token).as_bytes())
        .jwt()
        .map(str::to_string)
        .unwrap();

    let payload = jwt.split('.').nth(1).unwrap();
    let payload: serde_json::Value =
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();
    for field in ["sub", "iss", "aud", "exp", "iat"] {
        assert!(payload.get(field).is_some(), "missing {field}");
    }
    assert_eq!(payload["nats"]["type"], "user");
    assert_eq!(payload["nats"]["version"], 2);
    assert_eq!(payload["nats"]["resp"]["max"], 1);
    assert_eq!(payload["nats"]["resp"]["ttl"], 5_000_000_000u64);
    assert!(payload["nats"]["pub"]["allow"].is_array());
    assert!(payload["nats"]["sub"]["allow"].is_array());
}

#[test]
fn malformed_body_is_denied() {
    let service = build_service();
    let response = process_payload(&service, b"{not json");
    assert_eq!(response.error(), Some(INVALID_REQUEST));
}

#[tokio::test]
async fn reply_body_is_sent_to_reply_subject() {
    let service = build_service();
    let responder = RecordingResponder::default();
    let token = app_token("U", "G", "viewer", 600);

    handle_message(&service, &responder, callout_message(request_body(&token))).await;
    handle_message(&service, &responder, callout_message("garbage".to_string())).await;

    let replies = responder.replies.lock().unwrap().clone();
    assert_eq!(replies.len(), 2);
    assert!(replies
        .iter()
        .all(|(reply, _)| reply.as_deref() == Some("_INBOX.callout.1")));

    let bodies = responder.bodies();
    assert!(bodies[0]["jwt"].is_string());
    assert!(bodies[0].get("error").is_none());
    assert_eq!(bodies[1], serde_json::json!({ "error": "invalid request format" }));
}

#[tokio::test]
async fn concurrent_requests_are_independent() {
    let service = std::sync::Arc::new(build_service());
    let mut handles = Vec::new();
    for i in 0..16 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            let guild = format!("guild{i}");
            let token = app_token(&format!("user{i}"), &guild, "editor", 600);
            let response = process_payload(&*service, request_body(&token).as_bytes());
            (guild, response)
        }));
    }

    for handle in handles {
        let (guild, response) = handle.await.unwrap();
        let claims = issued_claims(&service, response.jwt().unwrap());
        assert!(claims
            .nats
            .permissions
            .patterns()
            .all(|p| p.ends_with(&guild) || p.starts_with("user.")));
    }
}
