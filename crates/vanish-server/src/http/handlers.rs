//! Request handlers.
//!
//! Store calls are synchronous, so each handler moves its service call onto
//! the blocking pool. A one-time secret is only serialized into the response
//! after the service call, delete included, has returned.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use vanish_core::{Environment, SecretService, SecretStore, ServiceError};
use vanish_proto::{
    Secret, SecretId,
    api::{ConfigResponse, MessageResponse, StatusResponse},
};

use super::{AppState, error::ApiError};

/// Run a service call on the blocking pool.
async fn blocking<S, E, T>(
    state: &AppState<S, E>,
    call: impl FnOnce(&SecretService<S, E>) -> Result<T, ServiceError> + Send + 'static,
) -> Result<T, ApiError>
where
    S: SecretStore,
    E: Environment,
    T: Send + 'static,
{
    let service = state.service.clone();
    tokio::task::spawn_blocking(move || call(&service))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(ApiError::from)
}

/// Ids that are not canonical UUIDs cannot name a stored secret.
fn parse_id(raw: &str) -> Result<SecretId, ApiError> {
    SecretId::parse(raw).map_err(|_| ApiError::Service(ServiceError::NotFound))
}

/// `POST /secret` and `POST /file`
pub async fn create_secret<S: SecretStore, E: Environment>(
    State(state): State<AppState<S, E>>,
    body: Result<Json<Secret>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(secret) = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            tracing::debug!(reason = %rejection.body_text(), "rejected request body");
            ApiError::InvalidJson
        }
    })?;

    let id = blocking(&state, move |service| service.create_secret(&secret)).await?;

    Ok(Json(MessageResponse::new(id.to_string())))
}

/// `GET /secret/{id}` and `GET /file/{id}`
pub async fn get_secret<S: SecretStore, E: Environment>(
    State(state): State<AppState<S, E>>,
    Path(id): Path<String>,
) -> Result<Json<Secret>, ApiError> {
    let id = parse_id(&id)?;
    let secret = blocking(&state, move |service| service.retrieve_secret(&id)).await?;

    Ok(Json(secret))
}

/// `DELETE /secret/{id}` and `DELETE /file/{id}`
pub async fn delete_secret<S: SecretStore, E: Environment>(
    State(state): State<AppState<S, E>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    let existed = blocking(&state, move |service| service.delete_secret(&id)).await?;

    if existed { Ok(StatusCode::NO_CONTENT) } else { Err(ServiceError::NotFound.into()) }
}

/// `GET /secret/{id}/status` and `GET /file/{id}/status`
pub async fn secret_status<S: SecretStore, E: Environment>(
    State(state): State<AppState<S, E>>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let id = parse_id(&id)?;
    let one_time = blocking(&state, move |service| service.secret_status(&id)).await?;

    Ok(Json(StatusResponse { one_time }))
}

/// `GET /config`
pub async fn config<S: SecretStore, E: Environment>(
    State(state): State<AppState<S, E>>,
) -> Json<ConfigResponse> {
    let policy = state.service.policy();
    Json(ConfigResponse {
        disable_upload: state.http.disable_upload,
        force_one_time_secrets: policy.force_one_time,
        force_expiration: policy.max_expiration,
    })
}

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Fallback for unknown routes.
pub async fn not_found() -> ApiError {
    ApiError::RouteNotFound
}
