//! # Resource Endpoint Handlers
//!
//! The generic [`InputOutputHandler`] pipeline plus the five standard
//! specializations over a [`Repository`](crate::repository::Repository):
//! create, read, update, delete and list. [`resource_router`] mounts
//! whichever handlers a resource provides on the conventional routes.

pub mod create;
pub mod delete;
pub mod input_output;
pub mod list;
pub mod read;
pub mod update;

use axum::body::Body;
use axum::extract::Request;
use axum::http::Response;
use axum::response::IntoResponse;
use axum::routing::MethodRouter;
use axum::Router;
use futures_util::future::BoxFuture;
use serde_json::Value;

use crest_schema::{ObjectSchema, Schema};

pub use create::{create_handler, CreateConfig};
pub use delete::{delete_handler, DeleteConfig};
pub use input_output::{
    CallbackContext, DomainCallback, Enrich, EnrichContext, InputOutputHandler, InputSource,
    OutputSpec,
};
pub use list::{list_handler, ListConfig};
pub use read::{read_handler, ReadConfig};
pub use update::{update_handler, UpdateConfig};

use crate::error::HttpError;

/// Path-attribute schema for the single-entry routes: one non-empty
/// `id` string.
pub fn id_attributes_schema() -> Schema {
    ObjectSchema::new(vec![("id".to_owned(), Schema::non_empty_string())])
        .strict()
        .into_schema()
}

/// Pull the validated `id` attribute out of the callback context.
pub fn attribute_id(attributes: &Value) -> Result<String, HttpError> {
    attributes
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| HttpError::Internal("validated attributes carry no \"id\"".to_owned()))
}

/// The handlers one resource exposes. Any subset works; absent handlers
/// simply leave their method unrouted.
#[derive(Default)]
pub struct ResourceHandlers {
    pub create: Option<InputOutputHandler>,
    pub read: Option<InputOutputHandler>,
    pub update: Option<InputOutputHandler>,
    pub delete: Option<InputOutputHandler>,
    pub list: Option<InputOutputHandler>,
}

/// Mount the handlers on the conventional routes: `GET /` (list),
/// `POST /` (create), `GET /{id}` (read), `PUT /{id}` (update),
/// `DELETE /{id}` (delete). Nest the result under the resource name.
pub fn resource_router(handlers: ResourceHandlers) -> Router {
    let mut router = Router::new();

    let mut collection = MethodRouter::new();
    let mut has_collection = false;
    if let Some(handler) = handlers.list {
        collection = collection.get(service(handler));
        has_collection = true;
    }
    if let Some(handler) = handlers.create {
        collection = collection.post(service(handler));
        has_collection = true;
    }
    if has_collection {
        router = router.route("/", collection);
    }

    let mut entry = MethodRouter::new();
    let mut has_entry = false;
    if let Some(handler) = handlers.read {
        entry = entry.get(service(handler));
        has_entry = true;
    }
    if let Some(handler) = handlers.update {
        entry = entry.put(service(handler));
        has_entry = true;
    }
    if let Some(handler) = handlers.delete {
        entry = entry.delete(service(handler));
        has_entry = true;
    }
    if has_entry {
        router = router.route("/{id}", entry);
    }

    router
}

fn service(
    handler: InputOutputHandler,
) -> impl Fn(Request) -> BoxFuture<'static, Response<Body>> + Clone + Send + Sync + 'static {
    move |request| {
        let handler = handler.clone();
        Box::pin(async move {
            match handler.handle(request).await {
                Ok(response) => response,
                Err(error) => error.into_response(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::handler::testing::{collection_request, empty_request, json_body, pet_handlers};
    use crate::repository::InMemoryRepository;

    use super::{resource_router, ResourceHandlers};

    #[tokio::test]
    async fn full_crud_flow_over_one_router() {
        let repository = Arc::new(InMemoryRepository::new());
        let app = resource_router(pet_handlers(repository));

        // Create, then read the model back under its assigned id.
        let created = json_body(
            app.clone()
                .oneshot(collection_request(
                    "POST",
                    "/",
                    r#"{"name":"Bella","tag":"dog"}"#,
                ))
                .await
                .unwrap(),
        )
        .await;
        let id = created["id"].as_str().unwrap().to_owned();

        let read = json_body(
            app.clone()
                .oneshot(empty_request("GET", &format!("/{id}")))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(read, created);

        // Update replaces the domain fields.
        let updated = json_body(
            app.clone()
                .oneshot(collection_request(
                    "PUT",
                    &format!("/{id}"),
                    r#"{"name":"Luna"}"#,
                ))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(updated["id"], json!(id.as_str()));
        assert_eq!(updated["name"], json!("Luna"));
        // Fields absent from the input survive from the stored model.
        assert_eq!(updated["tag"], json!("dog"));
        assert_eq!(updated["createdAt"], created["createdAt"]);

        // List sees exactly the one entry.
        let listed = json_body(
            app.clone().oneshot(empty_request("GET", "/")).await.unwrap(),
        )
        .await;
        assert_eq!(listed["count"], json!(1));
        assert_eq!(listed["items"][0]["name"], json!("Luna"));

        // Delete, then the entry is gone.
        let deleted = app
            .clone()
            .oneshot(empty_request("DELETE", &format!("/{id}")))
            .await
            .unwrap();
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

        let missing = app
            .oneshot(empty_request("GET", &format!("/{id}")))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn absent_handlers_leave_their_routes_unmounted() {
        let repository = Arc::new(InMemoryRepository::new());
        let mut handlers = pet_handlers(repository);
        handlers.create = None;
        let app = resource_router(handlers);

        let response = app
            .oneshot(collection_request("POST", "/", r#"{"name":"Bella"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn no_handlers_yields_an_empty_router() {
        let app = resource_router(ResourceHandlers::default());
        let response = app.oneshot(empty_request("GET", "/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
