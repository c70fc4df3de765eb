//! # Envelope Schema Builder
//!
//! Derives the stored-model, model-list and enriched variants from a
//! domain-fields schema by wrapping it in the standard envelope:
//! identity, timestamps, pagination echo, `_embedded`/`_links`. The
//! builder produces schema artifacts only; the handler pipeline does the
//! validating.
//!
//! The domain schema may be empty — the derived schemas then type-check
//! the envelope-only shape.

use serde_json::json;

use crest_schema::{ObjectSchema, Schema};

/// Envelope fields a client may echo back on update; they are accepted
/// and stripped, never merged.
pub const ENVELOPE_FIELDS: [&str; 5] = ["id", "createdAt", "updatedAt", "_embedded", "_links"];

/// Sort direction for one list sort field: `"asc"` or `"desc"`, optional.
pub fn sort_schema() -> Schema {
    Schema::union(vec![Schema::literal("asc"), Schema::literal("desc")]).optional()
}

/// One hyperlink descriptor: `href` plus optional `name`/`templated`,
/// free-form extra fields allowed.
fn link_schema() -> Schema {
    ObjectSchema::new(vec![
        ("href".to_owned(), Schema::string()),
        ("name".to_owned(), Schema::string().optional()),
        ("templated".to_owned(), Schema::boolean().optional()),
    ])
    .passthrough()
    .into_schema()
}

/// `_links`: relation name to one link or a list of links.
fn links_schema() -> Schema {
    Schema::record(Schema::union(vec![link_schema(), Schema::array(link_schema())])).optional()
}

/// `_embedded` with the given shape, or an open object when unspecified.
fn embedded_schema(shape: Option<Schema>) -> Schema {
    shape
        .unwrap_or_else(|| ObjectSchema::empty().passthrough().into_schema())
        .optional()
}

/// Stored model: identity + timestamps + the domain fields, strict.
pub fn model_schema(domain: &ObjectSchema) -> ObjectSchema {
    let mut fields = vec![
        ("id".to_owned(), Schema::non_empty_string()),
        ("createdAt".to_owned(), Schema::coerced_date()),
        ("updatedAt".to_owned(), Schema::coerced_date().optional()),
    ];
    fields.extend(domain.fields().iter().cloned());
    ObjectSchema::new(fields).strict()
}

/// Model list: the query echo plus `count` (non-negative) and `items`,
/// strict.
pub fn model_list_schema(domain: &ObjectSchema, query: &ObjectSchema) -> ObjectSchema {
    let mut fields = query.fields().to_vec();
    fields.push(("count".to_owned(), Schema::coerced_number_min(0.0)));
    fields.push((
        "items".to_owned(),
        Schema::array(model_schema(domain).into_schema()),
    ));
    ObjectSchema::new(fields).strict()
}

/// Stored model plus optional `_embedded`/`_links`, strict.
pub fn enriched_model_schema(domain: &ObjectSchema, embedded: Option<Schema>) -> ObjectSchema {
    let mut fields = model_schema(domain).fields().to_vec();
    fields.push(("_embedded".to_owned(), embedded_schema(embedded)));
    fields.push(("_links".to_owned(), links_schema()));
    ObjectSchema::new(fields).strict()
}

/// Model list with enriched items plus optional list-level
/// `_embedded`/`_links`, strict.
pub fn enriched_model_list_schema(
    domain: &ObjectSchema,
    query: &ObjectSchema,
    embedded: Option<Schema>,
    list_embedded: Option<Schema>,
) -> ObjectSchema {
    let mut fields = query.fields().to_vec();
    fields.push(("count".to_owned(), Schema::coerced_number_min(0.0)));
    fields.push((
        "items".to_owned(),
        Schema::array(enriched_model_schema(domain, embedded).into_schema()),
    ));
    fields.push(("_embedded".to_owned(), embedded_schema(list_embedded)));
    fields.push(("_links".to_owned(), links_schema()));
    ObjectSchema::new(fields).strict()
}

/// Query shape for list endpoints: `offset`/`limit` (coerced,
/// non-negative, with defaults), a strict `filters` object and a strict
/// `sort` object built from the given sortable field names.
pub fn list_query_schema(filters: ObjectSchema, sort_fields: &[&str]) -> ObjectSchema {
    let sort = ObjectSchema::new(
        sort_fields
            .iter()
            .map(|field| ((*field).to_owned(), sort_schema()))
            .collect(),
    )
    .strict();
    ObjectSchema::new(vec![
        (
            "offset".to_owned(),
            Schema::coerced_number_min(0.0).defaulted(0),
        ),
        (
            "limit".to_owned(),
            Schema::coerced_number_min(0.0).defaulted(20),
        ),
        (
            "filters".to_owned(),
            filters.strict().into_schema().defaulted(json!({})),
        ),
        ("sort".to_owned(), sort.into_schema().defaulted(json!({}))),
    ])
    .strict()
}

/// Update request schema: the domain input schema, tolerating (and
/// dropping) client-echoed envelope fields before validation.
pub fn update_request_schema(input: &ObjectSchema) -> Schema {
    Schema::stripping(&ENVELOPE_FIELDS, input.clone().into_schema())
}
