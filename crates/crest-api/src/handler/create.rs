//! Create endpoint: validated body, server-assigned identity and
//! creation timestamp, persisted model echoed back with 201.

use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crest_schema::Schema;

use crate::codec::{Decoder, Encoder};
use crate::handler::input_output::{
    CallbackContext, DomainCallback, Enrich, InputOutputHandler, InputSource, OutputSpec,
};
use crate::repository::Repository;

pub struct CreateConfig {
    pub decoder: Arc<dyn Decoder>,
    /// Domain input schema; identity and timestamps are never client
    /// supplied.
    pub input_schema: Schema,
    pub repository: Arc<dyn Repository>,
    pub output_schema: Schema,
    pub encoder: Arc<dyn Encoder>,
    pub enrich: Option<Arc<dyn Enrich>>,
}

pub fn create_handler(config: CreateConfig) -> InputOutputHandler {
    let repository = config.repository;
    let callback: DomainCallback = Arc::new(move |context: CallbackContext| {
        let repository = Arc::clone(&repository);
        Box::pin(async move {
            let mut model = Map::new();
            model.insert(
                "id".to_owned(),
                Value::String(Uuid::new_v4().to_string()),
            );
            model.insert(
                "createdAt".to_owned(),
                Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
            );
            if let Value::Object(input) = context.input {
                model.extend(input);
            }
            let stored = repository.persist(Value::Object(model)).await?;
            Ok(stored)
        })
    });

    let handler = InputOutputHandler::new(
        None,
        InputSource::Body {
            decoder: config.decoder,
            schema: config.input_schema,
        },
        callback,
        Some(OutputSpec {
            schema: config.output_schema,
            encoder: config.encoder,
        }),
        StatusCode::CREATED,
    );
    match config.enrich {
        Some(enrich) => handler.with_enrich(enrich),
        None => handler,
    }
}
