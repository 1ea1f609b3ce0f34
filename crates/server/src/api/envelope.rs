//! Uniform `{Success, Error, Response}` wrapper used by every rule route.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use spider_registry::RegistryError;
use tracing::{error, warn};
use utoipa::ToSchema;

/// Response envelope.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct Envelope {
    /// Whether the operation succeeded.
    #[schema(example = true)]
    pub success: bool,
    /// Human-readable failure description, `null` on success.
    pub error: Option<String>,
    /// Operation result, `null` on failure or when there is nothing to return.
    #[schema(value_type = Option<Object>)]
    pub response: Option<serde_json::Value>,
}

impl Envelope {
    /// A successful envelope carrying `value`.
    pub fn success<T: Serialize>(value: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(value).map_err(|e| {
            error!(error = %e, "failed to serialize response");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "failed to serialize response")
        })?;
        Ok(Self {
            success: true,
            error: None,
            response: Some(value),
        })
    }

    /// A successful envelope with no payload.
    pub fn empty() -> Self {
        Self {
            success: true,
            error: None,
            response: None,
        }
    }

    /// A failed envelope.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            response: None,
        }
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// A failed request: the HTTP status plus the message placed in the envelope.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

/// HTTP status for each registry failure.
pub fn status_for(err: &RegistryError) -> StatusCode {
    match err {
        RegistryError::InvalidDocument(_)
        | RegistryError::InvalidRule(_)
        | RegistryError::InvalidUrl { .. } => StatusCode::BAD_REQUEST,
        RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
        RegistryError::FetchFailed(_) => StatusCode::BAD_GATEWAY,
        RegistryError::ExtractionFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
        RegistryError::StoreUnavailable(_) | RegistryError::Corrupt { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        if err.is_operational() {
            error!(error = %err, "rule operation failed");
        } else if !err.is_caller_error() {
            warn!(error = %err, "rule operation failed");
        }
        Self::new(status_for(&err), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(Envelope::failure(self.message))).into_response()
    }
}
