//! # HTTP Error Taxonomy
//!
//! Maps pipeline failures to structured HTTP responses. Validation
//! failures carry the normalized invalid-parameter list; lookup misses
//! name the missing identity; collaborator failures are logged
//! server-side and redacted from clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crest_schema::{invalid_parameters, InvalidParameter, SchemaError};

use crate::codec::{DecodeError, EncodeError};
use crate::repository::RepositoryError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g. "NOT_FOUND", "BAD_REQUEST").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Per-field validation detail, present only for validation failures.
    #[serde(rename = "invalidParameters", skip_serializing_if = "Option::is_none")]
    pub invalid_parameters: Option<Vec<InvalidParameter>>,
    /// Free-form detail, present only for lookup misses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Pipeline-level error type that implements [`IntoResponse`].
///
/// The pipeline never swallows an error: every failure either
/// short-circuits as one of these variants or propagates verbatim from a
/// collaborator into [`HttpError::Internal`].
#[derive(Error, Debug)]
pub enum HttpError {
    /// Schema validation rejected the request (400).
    #[error("bad request: {} invalid parameter(s)", .invalid_parameters.len())]
    BadRequest {
        invalid_parameters: Vec<InvalidParameter>,
    },

    /// Lookup miss (404). The detail names the missing identity.
    #[error("not found: {detail}")]
    NotFound { detail: String },

    /// The body transcoding collaborator rejected the request (400).
    #[error("unable to decode request body: {message}")]
    Decode { message: String },

    /// Collaborator failure (500). Message is logged but never returned
    /// to the client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HttpError {
    /// Wrap a schema rejection as a 400 with the normalized list.
    pub fn validation(error: SchemaError) -> Self {
        Self::BadRequest {
            invalid_parameters: invalid_parameters(&error.issues),
        }
    }

    /// Construct a lookup-miss error naming the absent identity.
    pub fn no_entry(id: &str) -> Self {
        Self::NotFound {
            detail: format!("There is no entry with id \"{id}\""),
        }
    }

    /// HTTP status and machine-readable code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadRequest { .. } => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Decode { .. } => (StatusCode::BAD_REQUEST, "DECODE_ERROR"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl From<RepositoryError> for HttpError {
    fn from(error: RepositoryError) -> Self {
        Self::Internal(error.to_string())
    }
}

impl From<DecodeError> for HttpError {
    fn from(error: DecodeError) -> Self {
        Self::Decode {
            message: error.message,
        }
    }
}

impl From<EncodeError> for HttpError {
    fn from(error: EncodeError) -> Self {
        Self::Internal(error.to_string())
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose collaborator failure detail to clients.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_owned(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::NotFound { .. } => tracing::debug!(error = %self, "lookup miss"),
            Self::BadRequest { .. } | Self::Decode { .. } => {
                tracing::debug!(error = %self, "request rejected")
            }
        }

        let (invalid_parameters, detail) = match self {
            Self::BadRequest { invalid_parameters } => (Some(invalid_parameters), None),
            Self::NotFound { detail } => (None, Some(detail)),
            _ => (None, None),
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_owned(),
                message,
                invalid_parameters,
                detail,
            },
        };

        (status, Json(body)).into_response()
    }
}
