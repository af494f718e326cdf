//! HTTP API.
//!
//! | Method | Path                    | Success                     |
//! |--------|-------------------------|-----------------------------|
//! | POST   | `/secret`, `/file`      | 200 `{"message": id}`       |
//! | GET    | `/secret/{id}`          | 200 secret JSON             |
//! | DELETE | `/secret/{id}`          | 204                         |
//! | GET    | `/secret/{id}/status`   | 200 `{"oneTime": bool}`     |
//! | GET    | `/config`               | 200 client-facing settings  |
//! | GET    | `/health`               | 200                         |
//!
//! `/file` mirrors every `/secret` route unless uploads are disabled.

mod error;
mod handlers;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Method, header},
    routing::{get, post},
};
use tower_http::{
    LatencyUnit,
    cors::{AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::{DefaultOnFailure, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use vanish_core::{Environment, SecretService, SecretStore};

pub use self::error::ApiError;
use crate::{HttpConfig, ServerError};

const HSTS_VALUE: &str = "max-age=31536000; includeSubDomains";

/// Headers added to every response
const SECURITY_HEADERS: [(HeaderName, &str); 5] = [
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "DENY"),
    (header::REFERRER_POLICY, "no-referrer"),
    (header::X_XSS_PROTECTION, "1; mode=block"),
    (header::CONTENT_SECURITY_POLICY, "default-src 'none'; frame-ancestors 'none'"),
];

/// Request bodies carry JSON-escaped ciphertext plus envelope fields.
const BODY_OVERHEAD: usize = 1024;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState<S: SecretStore, E: Environment> {
    service: SecretService<S, E>,
    http: Arc<HttpConfig>,
}

/// Build the API router around `service`.
///
/// # Errors
///
/// Returns `ServerError::Config` if the CORS origin is not a valid header
/// value.
pub fn router<S: SecretStore, E: Environment>(
    service: SecretService<S, E>,
    http: HttpConfig,
) -> Result<Router, ServerError> {
    let origin = HeaderValue::from_str(&http.cors_allow_origin).map_err(|_| {
        ServerError::Config(format!("invalid CORS origin: {:?}", http.cors_allow_origin))
    })?;
    let body_limit = service.policy().max_length.saturating_mul(2).saturating_add(BODY_OVERHEAD);

    let mut routes = Router::new()
        .route("/secret", post(handlers::create_secret::<S, E>))
        .route(
            "/secret/:id",
            get(handlers::get_secret::<S, E>).delete(handlers::delete_secret::<S, E>),
        )
        .route("/secret/:id/status", get(handlers::secret_status::<S, E>));

    if http.disable_upload {
        tracing::info!("file uploads disabled");
    } else {
        routes = routes
            .route("/file", post(handlers::create_secret::<S, E>))
            .route(
                "/file/:id",
                get(handlers::get_secret::<S, E>).delete(handlers::delete_secret::<S, E>),
            )
            .route("/file/:id/status", get(handlers::secret_status::<S, E>));
    }

    let hsts = http.hsts;
    let any_origin = http.cors_allow_origin == "*";
    let state = AppState { service, http: Arc::new(http) };

    let trace_layer = TraceLayer::new_for_http()
        .on_response(
            DefaultOnResponse::new()
                .include_headers(false)
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Micros),
        )
        .on_failure(DefaultOnFailure::new().latency_unit(LatencyUnit::Micros));

    let allow_origin =
        if any_origin { AllowOrigin::any() } else { AllowOrigin::exact(origin.clone()) };
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(allow_origin);

    let mut router = routes
        .route("/config", get(handlers::config::<S, E>))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
        .layer(cors)
        .layer(SetResponseHeaderLayer::if_not_present(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin));

    for (name, value) in SECURITY_HEADERS {
        router = router
            .layer(SetResponseHeaderLayer::overriding(name, HeaderValue::from_static(value)));
    }
    if hsts {
        router = router.layer(SetResponseHeaderLayer::overriding(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(HSTS_VALUE),
        ));
    }

    Ok(router.layer(trace_layer))
}
