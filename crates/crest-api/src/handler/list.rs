//! List endpoint: the query string is the input. Decoded into a JSON
//! mapping, validated (with numeric coercion and paging defaults), then
//! resolved by the repository into the list envelope.

use std::sync::Arc;

use axum::http::StatusCode;

use crest_schema::Schema;

use crate::codec::Encoder;
use crate::handler::input_output::{
    CallbackContext, DomainCallback, Enrich, InputOutputHandler, InputSource, OutputSpec,
};
use crate::repository::Repository;

pub struct ListConfig {
    /// Query schema, usually built with
    /// [`list_query_schema`](crate::model::list_query_schema).
    pub query_schema: Schema,
    pub repository: Arc<dyn Repository>,
    pub output_schema: Schema,
    pub encoder: Arc<dyn Encoder>,
    pub enrich: Option<Arc<dyn Enrich>>,
}

pub fn list_handler(config: ListConfig) -> InputOutputHandler {
    let repository = config.repository;
    let callback: DomainCallback = Arc::new(move |context: CallbackContext| {
        let repository = Arc::clone(&repository);
        Box::pin(async move {
            let list = repository.resolve_list(context.input).await?;
            Ok(list)
        })
    });

    let handler = InputOutputHandler::new(
        None,
        InputSource::Query {
            schema: config.query_schema,
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
