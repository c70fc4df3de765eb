//! Update endpoint: full replacement of the domain fields. The body may
//! echo envelope fields (clients often resubmit what they read); they
//! are stripped before validation, never merged. Identity and
//! `createdAt` come from the stored model, `updatedAt` is stamped fresh.

use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use crest_schema::Schema;

use crate::codec::{Decoder, Encoder};
use crate::error::HttpError;
use crate::handler::input_output::{
    CallbackContext, DomainCallback, Enrich, InputOutputHandler, InputSource, OutputSpec,
};
use crate::handler::{attribute_id, id_attributes_schema};
use crate::repository::Repository;

pub struct UpdateConfig {
    pub decoder: Arc<dyn Decoder>,
    /// Body schema, usually built with
    /// [`update_request_schema`](crate::model::update_request_schema) so
    /// envelope echoes are tolerated.
    pub input_schema: Schema,
    pub repository: Arc<dyn Repository>,
    pub output_schema: Schema,
    pub encoder: Arc<dyn Encoder>,
    pub enrich: Option<Arc<dyn Enrich>>,
}

pub fn update_handler(config: UpdateConfig) -> InputOutputHandler {
    let repository = config.repository;
    let callback: DomainCallback = Arc::new(move |context: CallbackContext| {
        let repository = Arc::clone(&repository);
        Box::pin(async move {
            let id = attribute_id(&context.attributes)?;
            let Some(existing) = repository.find_one_by_id(&id).await? else {
                return Err(HttpError::no_entry(&id));
            };
            let Value::Object(mut model) = existing else {
                return Err(HttpError::Internal(format!(
                    "stored entry \"{id}\" is not an object"
                )));
            };
            model.insert(
                "updatedAt".to_owned(),
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
        Some(id_attributes_schema()),
        InputSource::Body {
            decoder: config.decoder,
            schema: config.input_schema,
        },
        callback,
        Some(OutputSpec {
            schema: config.output_schema,
            encoder: config.encoder,
        }),
        StatusCode::OK,
    );
    match config.enrich {
        Some(enrich) => handler.with_enrich(enrich),
        None => handler,
    }
}
