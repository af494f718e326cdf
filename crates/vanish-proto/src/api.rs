//! HTTP request and response bodies.
//!
//! Requests to `POST /secret` and `POST /file` use [`Secret`](crate::Secret)
//! directly.

use serde::{Deserialize, Serialize};

/// `{"message": …}`: the id on success, the reason on failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Id or error reason
    pub message: String,
}

impl MessageResponse {
    /// Wrap a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Body of `GET /secret/{id}/status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Whether reading the secret will delete it
    #[serde(rename = "oneTime")]
    pub one_time: bool,
}

/// Body of `GET /config`, consumed by web clients to adapt their forms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigResponse {
    /// File uploads are switched off
    #[serde(rename = "DISABLE_UPLOAD")]
    pub disable_upload: bool,
    /// Every secret must be one-time
    #[serde(rename = "FORCE_ONETIME_SECRETS")]
    pub force_one_time_secrets: bool,
    /// Server maximum expiration in seconds, if configured
    #[serde(rename = "FORCE_EXPIRATION", default, skip_serializing_if = "Option::is_none")]
    pub force_expiration: Option<i32>,
}
