//! Read endpoint: identity from the path, model from the repository,
//! 404 when no entry carries that identity.

use std::sync::Arc;

use axum::http::StatusCode;

use crest_schema::Schema;

use crate::codec::Encoder;
use crate::error::HttpError;
use crate::handler::input_output::{
    CallbackContext, DomainCallback, Enrich, InputOutputHandler, InputSource, OutputSpec,
};
use crate::handler::{attribute_id, id_attributes_schema};
use crate::repository::Repository;

pub struct ReadConfig {
    pub repository: Arc<dyn Repository>,
    pub output_schema: Schema,
    pub encoder: Arc<dyn Encoder>,
    pub enrich: Option<Arc<dyn Enrich>>,
}

pub fn read_handler(config: ReadConfig) -> InputOutputHandler {
    let repository = config.repository;
    let callback: DomainCallback = Arc::new(move |context: CallbackContext| {
        let repository = Arc::clone(&repository);
        Box::pin(async move {
            let id = attribute_id(&context.attributes)?;
            match repository.find_one_by_id(&id).await? {
                Some(model) => Ok(model),
                None => Err(HttpError::no_entry(&id)),
            }
        })
    });

    let handler = InputOutputHandler::new(
        Some(id_attributes_schema()),
        InputSource::Empty,
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

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::handler::testing::{
        empty_request, json_body, pet_handlers, pet_router, seed_pet,
    };
    use crate::repository::InMemoryRepository;

    #[tokio::test]
    async fn returns_the_stored_model() {
        let repository = Arc::new(InMemoryRepository::new());
        seed_pet(&repository, "p1", "Bella").await;
        let app = pet_router(pet_handlers(repository));

        let response = app
            .oneshot(empty_request("GET", "/p1"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["id"], json!("p1"));
        assert_eq!(body["name"], json!("Bella"));
    }

    #[tokio::test]
    async fn missing_entry_is_a_404_naming_the_id() {
        let repository = Arc::new(InMemoryRepository::new());
        let app = pet_router(pet_handlers(repository));

        let response = app
            .oneshot(empty_request("GET", "/does-not-exist"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], json!("NOT_FOUND"));
        assert_eq!(
            body["error"]["detail"],
            json!("There is no entry with id \"does-not-exist\"")
        );
    }
}
