//! # crest-api
//!
//! Resource-oriented HTTP endpoints for Axum, assembled from injected
//! collaborators instead of written per resource. A resource brings its
//! domain schema, a [`repository::Repository`] and a codec; the crate
//! supplies the envelope schemas, the validation pipeline, the error
//! taxonomy and the router wiring.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use crest_api::codec::JsonCodec;
//! use crest_api::handler::{
//!     create_handler, resource_router, CreateConfig, ResourceHandlers,
//! };
//! use crest_api::model::enriched_model_schema;
//! use crest_api::repository::{InMemoryRepository, Repository};
//! use crest_schema::{ObjectSchema, Schema};
//!
//! let domain = ObjectSchema::new(vec![
//!     ("name".to_owned(), Schema::non_empty_string()),
//! ])
//! .strict();
//! let repository: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
//! let codec = Arc::new(JsonCodec);
//!
//! let app = resource_router(ResourceHandlers {
//!     create: Some(create_handler(CreateConfig {
//!         decoder: codec.clone(),
//!         input_schema: domain.clone().into_schema(),
//!         repository,
//!         output_schema: enriched_model_schema(&domain, None).into_schema(),
//!         encoder: codec,
//!         enrich: None,
//!     })),
//!     ..ResourceHandlers::default()
//! });
//! # let _: axum::Router = app;
//! ```

pub mod codec;
pub mod error;
pub mod handler;
pub mod model;
pub mod query;
pub mod repository;

pub use codec::{Decoder, Encoder, JsonCodec};
pub use error::{ErrorBody, ErrorDetail, HttpError};
pub use handler::{resource_router, InputOutputHandler, ResourceHandlers};
pub use repository::{InMemoryRepository, Repository, RepositoryError};
