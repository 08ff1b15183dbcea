use crate::api::handlers::health;
use anyhow::{Context, Result, anyhow};
use axum::{
    Extension, Router,
    body::Body,
    extract::MatchedPath,
    http::{
        HeaderName, HeaderValue, Method, Request,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::options,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{Span, info, info_span, warn};
use ulid::Ulid;
use url::Url;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

pub(crate) mod handlers;
mod openapi;
pub(crate) mod sweep;

pub use handlers::auth::{AuthConfig, AuthState, MAX_TTL_SECONDS};
pub use openapi::openapi;

/// Build the API router with all documented routes registered.
#[must_use]
pub fn router() -> OpenApiRouter {
    openapi::api_router()
}

/// Assemble the full application: documented routes, Swagger UI, the
/// fallback, and the shared middleware stack.
#[must_use]
pub fn app(auth_state: Arc<AuthState>, cors: CorsLayer) -> Router {
    let (router, api_doc) = router().split_for_parts();
    router
        .route("/health", options(health::health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api_doc))
        .fallback(handlers::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(auth_state)),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, auth_config: AuthConfig, cors_origin: Option<String>) -> Result<()> {
    log_testing_aids(&auth_config);

    let session_sweep = auth_config.session_sweep_interval();
    let token_sweep = auth_config.token_sweep_interval();
    let auth_state = Arc::new(AuthState::new(auth_config));

    // Expiry is checked on every read; sweepers only bound memory.
    sweep::spawn_session_sweeper(auth_state.clone(), session_sweep);
    sweep::spawn_token_sweeper(auth_state.clone(), token_sweep);

    let cors = cors_layer(cors_origin.as_deref())?;
    let app = app(auth_state, cors);

    let listener = TcpListener::bind(format!("::0:{port}"))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {err}");
            }
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn log_testing_aids(auth_config: &AuthConfig) {
    if auth_config.demo_code().is_some() {
        warn!("Demo code is enabled: every login receives the same fixed code");
    }
    if auth_config.master_token_enabled() {
        warn!("Master token is enabled: it bypasses token validation");
    }
    if auth_config.expose_codes() {
        warn!("Code exposure is enabled: codes are returned in responses and /api/otp/latest");
    }
}

/// CORS for the configured origin, or any origin when none is set.
///
/// # Errors
/// Returns an error if the origin is not a valid URL with a host.
pub fn cors_layer(cors_origin: Option<&str>) -> Result<CorsLayer> {
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS]);

    match cors_origin {
        Some(origin) => Ok(cors.allow_origin(AllowOrigin::exact(exact_origin(origin)?))),
        None => Ok(cors.allow_origin(Any)),
    }
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

fn exact_origin(origin: &str) -> Result<HeaderValue> {
    let parsed = Url::parse(origin).with_context(|| format!("Invalid CORS origin: {origin}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("CORS origin must include a valid host: {origin}"))?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build CORS origin header")
}
