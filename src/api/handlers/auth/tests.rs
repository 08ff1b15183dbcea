use super::{AuthConfig, AuthState};
use crate::{
    api::{app, cors_layer},
    clock::{Clock, ManualClock},
    directory::MemoryDirectory,
};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{
        Request, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
};
use secrecy::SecretString;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

fn config() -> AuthConfig {
    AuthConfig::new(SecretString::from("handler-test-secret".to_string()))
}

fn build(config: AuthConfig) -> anyhow::Result<(Arc<ManualClock>, Arc<AuthState>, Router)> {
    let clock = Arc::new(ManualClock::starting_now());
    let directory = Arc::new(MemoryDirectory::new(clock.clone() as Arc<dyn Clock>));
    let state = Arc::new(AuthState::with_parts(config, clock.clone(), directory));
    let router = app(Arc::clone(&state), cors_layer(None)?);
    Ok((clock, state, router))
}

async fn post_json(router: &Router, uri: &str, body: Value) -> anyhow::Result<(StatusCode, Value)> {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))?,
        )
        .await?;
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, serde_json::from_slice(&body)?))
}

async fn get_with_auth(
    router: &Router,
    uri: &str,
    authorization: Option<&str>,
) -> anyhow::Result<(StatusCode, Value)> {
    let mut request = Request::builder().method("GET").uri(uri);
    if let Some(value) = authorization {
        request = request.header(AUTHORIZATION, value);
    }
    let response = router.clone().oneshot(request.body(Body::empty())?).await?;
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, serde_json::from_slice(&body)?))
}

#[tokio::test]
async fn login_rejects_missing_identifier() -> anyhow::Result<()> {
    let (_clock, _state, router) = build(config())?;

    for body in [json!({}), json!({"identifier": "   "})] {
        let (status, payload) = post_json(&router, "/auth/login", body).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(payload["success"], false);
        assert_eq!(payload["message"], "Phone number or email is required");
    }
    Ok(())
}

#[tokio::test]
async fn login_rejects_invalid_identifier() -> anyhow::Result<()> {
    let (_clock, _state, router) = build(config())?;
    let (status, payload) = post_json(&router, "/auth/login", json!({"identifier": "nobody"})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(payload["message"], "Please enter a valid phone number or email");
    Ok(())
}

#[tokio::test]
async fn login_without_exposure_hides_the_code() -> anyhow::Result<()> {
    let (_clock, state, router) = build(config())?;
    let (status, payload) =
        post_json(&router, "/auth/login", json!({"identifier": " +1 202 555 0123 "})).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["success"], true);
    assert_eq!(payload["message"], "OTP sent to your phone");
    assert!(payload.get("_debug_otp").is_none());

    let session_id = payload["sessionId"].as_str().unwrap_or_default();
    let session = state.sessions().get(session_id)?;
    assert_eq!(session.identifier, "+1 202 555 0123");
    Ok(())
}

#[tokio::test]
async fn login_with_exposure_returns_the_code() -> anyhow::Result<()> {
    let (_clock, _state, router) = build(config().with_expose_codes(true))?;
    let (status, payload) =
        post_json(&router, "/auth/login", json!({"identifier": "user@example.com"})).await?;

    assert_eq!(status, StatusCode::OK);
    let code = payload["_debug_otp"].as_str().unwrap_or_default().to_string();
    assert_eq!(code.len(), 6);
    assert_eq!(
        payload["message"],
        format!("OTP sent to your email. Use: {code}")
    );
    Ok(())
}

#[tokio::test]
async fn verify_requires_both_fields() -> anyhow::Result<()> {
    let (_clock, _state, router) = build(config())?;
    for body in [json!({}), json!({"sessionId": "session_x"}), json!({"otp": "123456"})] {
        let (status, payload) = post_json(&router, "/auth/verify-otp", body).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(payload["message"], "Session ID and OTP are required");
    }
    Ok(())
}

#[tokio::test]
async fn verify_failures_are_unauthorized_with_codes() -> anyhow::Result<()> {
    let (clock, _state, router) = build(config().with_demo_code(Some("123456".to_string())))?;

    let (status, payload) = post_json(
        &router,
        "/auth/verify-otp",
        json!({"sessionId": "session_missing", "otp": "123456"}),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(payload["code"], "SESSION_INVALID");
    assert_eq!(payload["message"], "Invalid or expired session");

    let (_, login) = post_json(&router, "/auth/login", json!({"identifier": "a@b.co"})).await?;
    let session_id = login["sessionId"].clone();

    let (status, payload) = post_json(
        &router,
        "/auth/verify-otp",
        json!({"sessionId": session_id, "otp": "000000"}),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(payload["code"], "INVALID_OTP");
    assert_eq!(payload["success"], false);

    clock.advance(chrono::Duration::seconds(301));
    let (status, payload) = post_json(
        &router,
        "/auth/verify-otp",
        json!({"sessionId": session_id, "otp": "123456"}),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(payload["code"], "OTP_EXPIRED");
    assert_eq!(payload["message"], "OTP expired");
    Ok(())
}

#[tokio::test]
async fn too_many_attempts_is_reported() -> anyhow::Result<()> {
    let (_clock, _state, router) = build(config().with_demo_code(Some("123456".to_string())))?;
    let (_, login) = post_json(&router, "/auth/login", json!({"identifier": "a@b.co"})).await?;
    let session_id = login["sessionId"].clone();

    for _ in 0..3 {
        post_json(
            &router,
            "/auth/verify-otp",
            json!({"sessionId": session_id, "otp": "999999"}),
        )
        .await?;
    }

    let (status, payload) = post_json(
        &router,
        "/auth/verify-otp",
        json!({"sessionId": session_id, "otp": "123456"}),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(payload["code"], "TOO_MANY_ATTEMPTS");
    assert_eq!(payload["message"], "Too many attempts. Please try again.");
    Ok(())
}

#[tokio::test]
async fn gate_reports_each_failure_kind() -> anyhow::Result<()> {
    let (_clock, _state, router) = build(config())?;

    let (status, payload) = get_with_auth(&router, "/auth/me", None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(payload["code"], "NO_TOKEN");
    assert_eq!(payload["message"], "No authorization token provided");

    let (status, payload) = get_with_auth(&router, "/auth/me", Some("Token abc")).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(payload["code"], "INVALID_AUTH_FORMAT");
    assert_eq!(
        payload["message"],
        "Invalid authorization format. Use: Bearer <token>"
    );

    let (status, payload) = get_with_auth(&router, "/auth/me", Some("Bearer abc")).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(payload["code"], "INVALID_TOKEN");
    assert_eq!(payload["reason"], "malformed");
    assert_eq!(payload["message"], "Invalid token");
    Ok(())
}

#[tokio::test]
async fn expired_token_is_rejected_with_reason() -> anyhow::Result<()> {
    let (clock, _state, router) = build(
        config()
            .with_demo_code(Some("123456".to_string()))
            .with_token_ttl_seconds(60),
    )?;
    let (_, login) = post_json(&router, "/auth/login", json!({"identifier": "a@b.co"})).await?;
    let (_, verified) = post_json(
        &router,
        "/auth/verify-otp",
        json!({"sessionId": login["sessionId"], "otp": "123456"}),
    )
    .await?;
    let bearer = format!("Bearer {}", verified["token"].as_str().unwrap_or_default());

    clock.advance(chrono::Duration::seconds(60));
    let (status, payload) = get_with_auth(&router, "/auth/me", Some(&bearer)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(payload["reason"], "expired");
    assert_eq!(payload["message"], "Token has expired");
    Ok(())
}

#[tokio::test]
async fn master_token_is_accepted_only_when_configured() -> anyhow::Result<()> {
    let (_clock, _state, router) = build(config())?;
    let (status, _) = get_with_auth(&router, "/auth/me", Some("Bearer qa-master")).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_clock, _state, router) = build(
        config().with_master_token(Some(SecretString::from("qa-master".to_string()))),
    )?;
    let (status, payload) = get_with_auth(&router, "/auth/me", Some("Bearer qa-master")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["user"]["userId"], "master_user");
    Ok(())
}

#[tokio::test]
async fn inspection_is_hidden_unless_enabled() -> anyhow::Result<()> {
    let (_clock, state, router) = build(config())?;
    state.issuer().issue("user@example.com");

    let response = router
        .clone()
        .oneshot(Request::builder().uri("/api/otp/latest").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn inspection_reports_latest_code() -> anyhow::Result<()> {
    let (_clock, state, router) = build(config().with_expose_codes(true))?;
    let first = state.issuer().issue("a@example.com");
    let second = state.issuer().issue("b@example.com");

    let response = router
        .clone()
        .oneshot(Request::builder().uri("/api/otp/latest").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await?;
    assert_eq!(
        std::str::from_utf8(&body)?,
        format!("Latest OTP is {} for session {}", second.code, second.session_id)
    );

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/otp/latest?identifier=a@example.com")
                .body(Body::empty())?,
        )
        .await?;
    let body = to_bytes(response.into_body(), usize::MAX).await?;
    assert_eq!(
        std::str::from_utf8(&body)?,
        format!("Latest OTP is {} for session {}", first.code, first.session_id)
    );

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/otp/latest?identifier=nobody@example.com")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn unknown_path_returns_json_404() -> anyhow::Result<()> {
    let (_clock, _state, router) = build(config())?;
    let (status, payload) = get_with_auth(&router, "/does/not/exist", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(payload, json!({"success": false, "message": "Endpoint not found"}));
    Ok(())
}

#[tokio::test]
async fn request_id_is_generated_and_propagated() -> anyhow::Result<()> {
    let (_clock, _state, router) = build(config())?;

    let response = router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;
    assert!(response.headers().contains_key("x-request-id"));

    let response = router
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "req-123")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|value| value.to_str().ok()),
        Some("req-123")
    );
    Ok(())
}
