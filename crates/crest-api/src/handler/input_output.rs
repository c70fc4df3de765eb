//! # Generic Input/Output Pipeline
//!
//! One configurable handler covers every resource endpoint. A request
//! flows through fixed gates: path attributes are validated, the input
//! (body or query string) is decoded and validated, the domain callback
//! runs, the result is optionally enriched, then validated against the
//! output schema and encoded. The first failing gate short-circuits with
//! an [`HttpError`]; in particular the callback never runs on invalid
//! input.
//!
//! An output-schema rejection means the service produced a value outside
//! its own contract. It is logged loudly and still reported as a
//! validation failure so the contract breach is visible to the caller.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::{RawPathParams, Request};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::RequestPartsExt;
use futures_util::future::BoxFuture;
use serde_json::{Map, Value};

use crest_schema::Schema;

use crate::codec::{Decoder, Encoder};
use crate::error::HttpError;

/// Maximum accepted request body size.
const BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Everything the domain callback sees: validated path attributes,
/// validated input and the raw request head for anything else (headers,
/// extensions, uri).
pub struct CallbackContext {
    pub attributes: Value,
    pub input: Value,
    pub request: Arc<Parts>,
}

/// Domain logic injected into the pipeline. Receives validated data
/// only; returns the raw output value or a pipeline error.
pub type DomainCallback =
    Arc<dyn Fn(CallbackContext) -> BoxFuture<'static, Result<Value, HttpError>> + Send + Sync>;

/// Request head handed to output enrichment.
pub struct EnrichContext {
    pub request: Arc<Parts>,
}

/// Optional post-callback output decoration, e.g. attaching `_links` or
/// `_embedded` before output validation.
#[async_trait::async_trait]
pub trait Enrich: Send + Sync {
    async fn enrich(&self, value: Value, context: &EnrichContext) -> Result<Value, HttpError>;
}

/// Where the handler's input comes from.
pub enum InputSource {
    /// Decode the request body with the injected decoder, then validate.
    Body {
        decoder: Arc<dyn Decoder>,
        schema: Schema,
    },
    /// Decode the query string, then validate.
    Query { schema: Schema },
    /// No input; the callback receives `Null`.
    Empty,
}

/// Output contract: the schema the callback result must satisfy and the
/// encoder producing the response body.
pub struct OutputSpec {
    pub schema: Schema,
    pub encoder: Arc<dyn Encoder>,
}

/// The configured endpoint handler. Cloning is cheap; all configuration
/// is shared behind [`Arc`]s.
#[derive(Clone)]
pub struct InputOutputHandler {
    attributes_schema: Option<Arc<Schema>>,
    input: Arc<InputSource>,
    callback: DomainCallback,
    enrich: Option<Arc<dyn Enrich>>,
    output: Option<Arc<OutputSpec>>,
    status: StatusCode,
}

impl InputOutputHandler {
    pub fn new(
        attributes_schema: Option<Schema>,
        input: InputSource,
        callback: DomainCallback,
        output: Option<OutputSpec>,
        status: StatusCode,
    ) -> Self {
        Self {
            attributes_schema: attributes_schema.map(Arc::new),
            input: Arc::new(input),
            callback,
            enrich: None,
            output: output.map(Arc::new),
            status,
        }
    }

    pub fn with_enrich(mut self, enrich: Arc<dyn Enrich>) -> Self {
        self.enrich = Some(enrich);
        self
    }

    pub async fn handle(&self, request: Request) -> Result<Response, HttpError> {
        let (mut parts, body) = request.into_parts();

        let attributes = match &self.attributes_schema {
            Some(schema) => {
                let raw = raw_attributes(&mut parts).await?;
                schema.validate(&raw).map_err(|error| {
                    tracing::debug!(%error, "path attributes rejected");
                    HttpError::validation(error)
                })?
            }
            None => Value::Object(Map::new()),
        };

        let input = match self.input.as_ref() {
            InputSource::Body { decoder, schema } => {
                let content_type = parts
                    .headers
                    .get(header::CONTENT_TYPE)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("application/json")
                    .to_owned();
                let bytes = to_bytes(body, BODY_LIMIT)
                    .await
                    .map_err(|error| HttpError::Decode {
                        message: format!("unable to read request body: {error}"),
                    })?;
                let decoded = decoder.decode(&bytes, &content_type)?;
                schema.validate(&decoded).map_err(|error| {
                    tracing::debug!(%error, "request body rejected");
                    HttpError::validation(error)
                })?
            }
            InputSource::Query { schema } => {
                let raw = crate::query::parse_query(parts.uri.query().unwrap_or(""));
                schema.validate(&raw).map_err(|error| {
                    tracing::debug!(%error, "query string rejected");
                    HttpError::validation(error)
                })?
            }
            InputSource::Empty => Value::Null,
        };

        let request = Arc::new(parts);
        let output = (self.callback)(CallbackContext {
            attributes,
            input,
            request: Arc::clone(&request),
        })
        .await?;

        let output = match &self.enrich {
            Some(enrich) => enrich.enrich(output, &EnrichContext { request }).await?,
            None => output,
        };

        match &self.output {
            Some(spec) => {
                let validated = spec.schema.validate(&output).map_err(|error| {
                    // The service broke its own output contract.
                    tracing::error!(%error, "output failed contract validation");
                    HttpError::validation(error)
                })?;
                let encoded = spec.encoder.encode(&validated)?;
                Response::builder()
                    .status(self.status)
                    .header(header::CONTENT_TYPE, spec.encoder.content_type())
                    .body(Body::from(encoded))
                    .map_err(|error| HttpError::Internal(error.to_string()))
            }
            None => Response::builder()
                .status(self.status)
                .body(Body::empty())
                .map_err(|error| HttpError::Internal(error.to_string())),
        }
    }
}

/// Collect the router's raw path parameters into a JSON object of
/// strings for attribute validation.
async fn raw_attributes(parts: &mut Parts) -> Result<Value, HttpError> {
    let params = parts
        .extract::<RawPathParams>()
        .await
        .map_err(|error| HttpError::Internal(format!("path parameters unavailable: {error}")))?;
    let mut map = Map::new();
    for (key, value) in params.iter() {
        map.insert(key.to_owned(), Value::String(value.to_owned()));
    }
    Ok(Value::Object(map))
}
