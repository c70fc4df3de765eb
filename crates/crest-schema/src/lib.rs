//! # crest-schema — Value Schemas and Validation Failures
//!
//! The validation half of the crest resource toolkit:
//!
//! - [`schema`] — a compact combinator set over [`serde_json::Value`]
//!   (strict objects, coercing numbers and dates, unions, defaults) that
//!   the envelope schema builder in `crest-api` composes.
//! - [`issue`] — the structured validation-failure tree. Failure nodes
//!   carry a field path, a kind tag and kind-specific extras; union,
//!   argument and return-type kinds nest child trees of the same shape.
//! - [`normalize`] — flattens a failure tree into the ordered
//!   `invalidParameters` list returned to API clients.
//!
//! This crate is pure: no HTTP, no async, no I/O. The handler pipeline
//! consumes it only through [`Schema::validate`] and
//! [`normalize::invalid_parameters`].

pub mod issue;
pub mod normalize;
pub mod schema;

pub use issue::{ContextValue, Issue, IssueKind, Segment};
pub use normalize::{invalid_parameters, InvalidParameter};
pub use schema::{ObjectSchema, Schema, SchemaError, UnknownKeys};
