//! Body transcoding collaborators.
//!
//! The pipeline treats wire encoding as injected behavior: a [`Decoder`]
//! turns request bytes into a value, an [`Encoder`] turns the validated
//! output back into bytes and names the content type the response must
//! mirror. [`JsonCodec`] covers `application/json`; other formats are
//! additional implementations, not pipeline changes.

use serde_json::Value;
use thiserror::Error;

/// The decoder rejected the body or its content type.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct DecodeError {
    pub message: String,
}

impl DecodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The encoder could not serialize the output value.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct EncodeError {
    pub message: String,
}

impl EncodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Content-type-driven request body decoding.
pub trait Decoder: Send + Sync {
    fn decode(&self, body: &[u8], content_type: &str) -> Result<Value, DecodeError>;

    /// Content types this decoder accepts.
    fn content_types(&self) -> &[&'static str];
}

/// Content-type-driven response body encoding.
pub trait Encoder: Send + Sync {
    fn encode(&self, value: &Value) -> Result<Vec<u8>, EncodeError>;

    /// Content type the response header must mirror.
    fn content_type(&self) -> &'static str;
}

/// JSON transcoding for `application/json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

const APPLICATION_JSON: &str = "application/json";

impl Decoder for JsonCodec {
    fn decode(&self, body: &[u8], content_type: &str) -> Result<Value, DecodeError> {
        // Parameters like `; charset=utf-8` do not change the format.
        let essence = content_type.split(';').next().unwrap_or("").trim();
        if !essence.eq_ignore_ascii_case(APPLICATION_JSON) {
            return Err(DecodeError::new(format!(
                "unsupported content type \"{content_type}\""
            )));
        }
        serde_json::from_slice(body)
            .map_err(|error| DecodeError::new(format!("invalid json: {error}")))
    }

    fn content_types(&self) -> &[&'static str] {
        &[APPLICATION_JSON]
    }
}

impl Encoder for JsonCodec {
    fn encode(&self, value: &Value) -> Result<Vec<u8>, EncodeError> {
        serde_json::to_vec(value).map_err(|error| EncodeError::new(error.to_string()))
    }

    fn content_type(&self) -> &'static str {
        APPLICATION_JSON
    }
}
