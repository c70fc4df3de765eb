//! Delete endpoint: 404 when the identity is unknown, otherwise remove
//! and answer 204 with no body.

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::Value;

use crate::error::HttpError;
use crate::handler::input_output::{
    CallbackContext, DomainCallback, InputOutputHandler, InputSource,
};
use crate::handler::{attribute_id, id_attributes_schema};
use crate::repository::Repository;

pub struct DeleteConfig {
    pub repository: Arc<dyn Repository>,
}

pub fn delete_handler(config: DeleteConfig) -> InputOutputHandler {
    let repository = config.repository;
    let callback: DomainCallback = Arc::new(move |context: CallbackContext| {
        let repository = Arc::clone(&repository);
        Box::pin(async move {
            let id = attribute_id(&context.attributes)?;
            let Some(model) = repository.find_one_by_id(&id).await? else {
                return Err(HttpError::no_entry(&id));
            };
            repository.remove(model).await?;
            Ok(Value::Null)
        })
    });

    InputOutputHandler::new(
        Some(id_attributes_schema()),
        InputSource::Empty,
        callback,
        None,
        StatusCode::NO_CONTENT,
    )
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::handler::testing::{empty_request, json_body, pet_handlers, pet_router, seed_pet};
    use crate::repository::{InMemoryRepository, Repository};

    #[tokio::test]
    async fn removes_the_entry_and_answers_no_content() {
        let repository = Arc::new(InMemoryRepository::new());
        seed_pet(&repository, "p1", "Bella").await;
        let app = pet_router(pet_handlers(Arc::clone(&repository)));

        let response = app
            .oneshot(empty_request("DELETE", "/p1"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());
        assert!(repository.find_one_by_id("p1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_entry_is_a_404() {
        let repository = Arc::new(InMemoryRepository::new());
        let app = pet_router(pet_handlers(repository));

        let response = app
            .oneshot(empty_request("DELETE", "/nope"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], serde_json::json!("NOT_FOUND"));
    }
}
