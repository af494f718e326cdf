//! Mapping of service failures onto HTTP responses.
//!
//! Every error body is `{"message": "..."}` with a human-readable message.
//! Store details never reach the client; they are logged instead.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use vanish_core::ServiceError;
use vanish_proto::api::MessageResponse;

/// Errors returned by the HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A service operation failed
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// The request body is not a valid secret
    #[error("Unable to parse json")]
    InvalidJson,

    /// The request body is over the size limit; reported like a long message
    #[error("The encrypted message is too long")]
    PayloadTooLarge,

    /// No route matches the request
    #[error("Not found")]
    RouteNotFound,

    /// A blocking store task did not complete
    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Service(ServiceError::Validation(_))
            | Self::InvalidJson
            | Self::PayloadTooLarge => StatusCode::BAD_REQUEST,
            Self::Service(ServiceError::NotFound) | Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::Service(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            match &self {
                Self::Service(err) => {
                    let cause = std::error::Error::source(err).map(ToString::to_string);
                    tracing::error!(error = %err, cause = ?cause, "request failed");
                },
                Self::Internal(detail) => tracing::error!(detail = %detail, "request failed"),
                _ => {},
            }
        }

        (status, Json(MessageResponse::new(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use vanish_core::{StoreError, ValidationError};

    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(
            ApiError::from(ServiceError::from(ValidationError::MessageTooLong)).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::from(ServiceError::NotFound).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(ServiceError::Clear(StoreError::Io("down".into()))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::InvalidJson.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::PayloadTooLarge.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn backend_detail_stays_out_of_message() {
        let err = ApiError::from(ServiceError::Retrieve(StoreError::Io("disk on fire".into())));

        assert_eq!(err.to_string(), "Failed to retrieve secret");
    }
}
