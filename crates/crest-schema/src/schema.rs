//! Value-level schema combinators.
//!
//! Schemas validate a [`serde_json::Value`] and return the accepted value
//! with coercions and defaults applied, or the ordered list of
//! [`Issue`]s describing every failure. Object fields keep declaration
//! order and all collections are ordered, so the issue list for a given
//! input is deterministic.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::issue::{Issue, IssueKind, Segment};

/// Validation failed; carries every issue found, in input order.
#[derive(Debug, Clone, Error)]
#[error("validation failed with {} issue(s)", .issues.len())]
pub struct SchemaError {
    pub issues: Vec<Issue>,
}

/// How an object schema treats keys it does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownKeys {
    /// Any undeclared key is a validation failure.
    Strict,
    /// Undeclared keys are dropped from the output.
    Strip,
    /// Undeclared keys are copied through untouched.
    Passthrough,
}

/// An object schema: ordered named fields plus an unknown-key policy.
#[derive(Debug, Clone)]
pub struct ObjectSchema {
    fields: Vec<(String, Schema)>,
    unknown_keys: UnknownKeys,
}

impl ObjectSchema {
    /// New object schema; undeclared keys are stripped by default.
    pub fn new(fields: Vec<(String, Schema)>) -> Self {
        Self {
            fields,
            unknown_keys: UnknownKeys::Strip,
        }
    }

    /// Object schema with no declared fields.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Append a field, keeping declaration order.
    pub fn field(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.fields.push((name.into(), schema));
        self
    }

    pub fn strict(mut self) -> Self {
        self.unknown_keys = UnknownKeys::Strict;
        self
    }

    pub fn passthrough(mut self) -> Self {
        self.unknown_keys = UnknownKeys::Passthrough;
        self
    }

    pub fn fields(&self) -> &[(String, Schema)] {
        &self.fields
    }

    pub fn unknown_keys(&self) -> UnknownKeys {
        self.unknown_keys
    }

    pub fn into_schema(self) -> Schema {
        Schema::Object(self)
    }
}

impl From<ObjectSchema> for Schema {
    fn from(object: ObjectSchema) -> Self {
        Schema::Object(object)
    }
}

/// A composable value schema.
#[derive(Debug, Clone)]
pub enum Schema {
    String {
        min_len: Option<usize>,
    },
    Number {
        coerce: bool,
        min: Option<f64>,
    },
    Boolean,
    DateTime {
        coerce: bool,
    },
    Literal(Value),
    Optional(Box<Schema>),
    Defaulted {
        inner: Box<Schema>,
        default: Value,
    },
    Array(Box<Schema>),
    Object(ObjectSchema),
    Record(Box<Schema>),
    /// Ordered alternatives; the first accepting variant wins.
    Union(Vec<Schema>),
    /// Remove the named keys from an object value, then delegate.
    Stripping {
        keys: Vec<String>,
        inner: Box<Schema>,
    },
}

impl Schema {
    pub fn string() -> Self {
        Self::String { min_len: None }
    }

    pub fn non_empty_string() -> Self {
        Self::String { min_len: Some(1) }
    }

    pub fn number() -> Self {
        Self::Number {
            coerce: false,
            min: None,
        }
    }

    /// Number that also accepts numeric strings (query parameters).
    pub fn coerced_number() -> Self {
        Self::Number {
            coerce: true,
            min: None,
        }
    }

    /// Coercing number with an inclusive lower bound.
    pub fn coerced_number_min(min: f64) -> Self {
        Self::Number {
            coerce: true,
            min: Some(min),
        }
    }

    pub fn boolean() -> Self {
        Self::Boolean
    }

    pub fn date() -> Self {
        Self::DateTime { coerce: false }
    }

    /// Date that also accepts epoch milliseconds; output is canonical
    /// RFC 3339 with millisecond precision.
    pub fn coerced_date() -> Self {
        Self::DateTime { coerce: true }
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    pub fn array(item: Schema) -> Self {
        Self::Array(Box::new(item))
    }

    pub fn record(values: Schema) -> Self {
        Self::Record(Box::new(values))
    }

    pub fn union(variants: Vec<Schema>) -> Self {
        Self::Union(variants)
    }

    pub fn stripping(keys: &[&str], inner: Schema) -> Self {
        Self::Stripping {
            keys: keys.iter().map(|k| (*k).to_owned()).collect(),
            inner: Box::new(inner),
        }
    }

    pub fn optional(self) -> Self {
        Self::Optional(Box::new(self))
    }

    pub fn defaulted(self, default: impl Into<Value>) -> Self {
        Self::Defaulted {
            inner: Box::new(self),
            default: default.into(),
        }
    }

    /// Validate `value`, returning the accepted value with coercions and
    /// defaults applied, or every issue found.
    pub fn validate(&self, value: &Value) -> Result<Value, SchemaError> {
        let mut issues = Vec::new();
        match self.check(value, &[], &mut issues) {
            Some(out) if issues.is_empty() => Ok(out),
            _ => Err(SchemaError { issues }),
        }
    }

    /// Coarse type label used in required-field and mismatch messages.
    fn expected(&self) -> &'static str {
        match self {
            Self::String { .. } => "string",
            Self::Number { .. } => "number",
            Self::Boolean => "boolean",
            Self::DateTime { .. } => "date",
            Self::Literal(_) => "literal",
            Self::Array(_) => "array",
            Self::Object(_) | Self::Record(_) => "object",
            Self::Union(_) => "union",
            Self::Optional(inner) | Self::Defaulted { inner, .. } => inner.expected(),
            Self::Stripping { inner, .. } => inner.expected(),
        }
    }

    fn check(&self, value: &Value, path: &[Segment], issues: &mut Vec<Issue>) -> Option<Value> {
        match self {
            Self::String { min_len } => {
                let Value::String(s) = value else {
                    push_type_mismatch(issues, path, "string", value);
                    return None;
                };
                if let Some(min) = min_len {
                    if s.chars().count() < *min {
                        issues.push(Issue::new(
                            path.to_vec(),
                            IssueKind::TooSmall {
                                minimum: Value::from(*min as u64),
                                inclusive: true,
                                origin: "string",
                            },
                            format!("String must contain at least {min} character(s)"),
                        ));
                        return None;
                    }
                }
                Some(value.clone())
            }
            Self::Number { coerce, min } => {
                let parsed = match value {
                    Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
                    Value::String(s) if *coerce => match s.trim().parse::<f64>() {
                        Ok(v) => v,
                        Err(_) => {
                            issues.push(Issue::new(
                                path.to_vec(),
                                IssueKind::InvalidType {
                                    expected: "number",
                                    received: "nan",
                                },
                                "Expected number, received nan",
                            ));
                            return None;
                        }
                    },
                    other => {
                        push_type_mismatch(issues, path, "number", other);
                        return None;
                    }
                };
                if !parsed.is_finite() {
                    issues.push(Issue::new(
                        path.to_vec(),
                        IssueKind::NotFinite,
                        "Number must be finite",
                    ));
                    return None;
                }
                if let Some(min) = min {
                    if parsed < *min {
                        issues.push(Issue::new(
                            path.to_vec(),
                            IssueKind::TooSmall {
                                minimum: number_value(*min),
                                inclusive: true,
                                origin: "number",
                            },
                            format!("Number must be greater than or equal to {min}"),
                        ));
                        return None;
                    }
                }
                match value {
                    Value::Number(_) => Some(value.clone()),
                    _ => Some(number_value(parsed)),
                }
            }
            Self::Boolean => {
                if let Value::Bool(_) = value {
                    Some(value.clone())
                } else {
                    push_type_mismatch(issues, path, "boolean", value);
                    None
                }
            }
            Self::DateTime { coerce } => {
                let instant = match value {
                    Value::String(s) => DateTime::parse_from_rfc3339(s)
                        .ok()
                        .map(|dt| dt.with_timezone(&Utc)),
                    Value::Number(n) if *coerce => {
                        n.as_i64().and_then(|ms| Utc.timestamp_millis_opt(ms).single())
                    }
                    _ => None,
                };
                match instant {
                    Some(dt) => Some(Value::String(
                        dt.to_rfc3339_opts(SecondsFormat::Millis, true),
                    )),
                    None => {
                        issues.push(Issue::new(
                            path.to_vec(),
                            IssueKind::InvalidDate,
                            "Invalid date",
                        ));
                        None
                    }
                }
            }
            Self::Literal(expected) => {
                if value == expected {
                    Some(value.clone())
                } else {
                    issues.push(Issue::new(
                        path.to_vec(),
                        IssueKind::InvalidLiteral {
                            expected: expected.clone(),
                            received: value.clone(),
                        },
                        format!("Invalid literal value, expected {expected}"),
                    ));
                    None
                }
            }
            Self::Optional(inner) | Self::Defaulted { inner, .. } => {
                inner.check(value, path, issues)
            }
            Self::Array(item) => {
                let Value::Array(items) = value else {
                    push_type_mismatch(issues, path, "array", value);
                    return None;
                };
                let before = issues.len();
                let mut out = Vec::with_capacity(items.len());
                for (index, element) in items.iter().enumerate() {
                    let mut child = path.to_vec();
                    child.push(Segment::Index(index));
                    if let Some(accepted) = item.check(element, &child, issues) {
                        out.push(accepted);
                    }
                }
                (issues.len() == before).then_some(Value::Array(out))
            }
            Self::Object(object) => object.check(value, path, issues),
            Self::Record(values) => {
                let Value::Object(map) = value else {
                    push_type_mismatch(issues, path, "object", value);
                    return None;
                };
                let before = issues.len();
                let mut out = Map::new();
                for (key, element) in map {
                    let mut child = path.to_vec();
                    child.push(Segment::key(key));
                    if let Some(accepted) = values.check(element, &child, issues) {
                        out.insert(key.clone(), accepted);
                    }
                }
                (issues.len() == before).then_some(Value::Object(out))
            }
            Self::Union(variants) => {
                let mut branches = Vec::with_capacity(variants.len());
                for variant in variants {
                    let mut branch = Vec::new();
                    if let Some(accepted) = variant.check(value, path, &mut branch) {
                        if branch.is_empty() {
                            return Some(accepted);
                        }
                    }
                    branches.push(branch);
                }
                issues.push(Issue::new(
                    path.to_vec(),
                    IssueKind::InvalidUnion {
                        union_issues: branches,
                    },
                    "Invalid input",
                ));
                None
            }
            Self::Stripping { keys, inner } => {
                if let Value::Object(map) = value {
                    let mut copy = map.clone();
                    for key in keys {
                        copy.remove(key);
                    }
                    inner.check(&Value::Object(copy), path, issues)
                } else {
                    inner.check(value, path, issues)
                }
            }
        }
    }
}

impl ObjectSchema {
    fn check(&self, value: &Value, path: &[Segment], issues: &mut Vec<Issue>) -> Option<Value> {
        let Value::Object(map) = value else {
            push_type_mismatch(issues, path, "object", value);
            return None;
        };
        let before = issues.len();
        let mut out = Map::new();
        for (name, field) in &self.fields {
            let mut child = path.to_vec();
            child.push(Segment::key(name));
            match map.get(name) {
                Some(present) => {
                    if let Some(accepted) = field.check(present, &child, issues) {
                        out.insert(name.clone(), accepted);
                    }
                }
                None => match field {
                    Schema::Optional(_) => {}
                    Schema::Defaulted { default, .. } => {
                        out.insert(name.clone(), default.clone());
                    }
                    required => {
                        issues.push(Issue::new(
                            child,
                            IssueKind::InvalidType {
                                expected: required.expected(),
                                received: "undefined",
                            },
                            "Required",
                        ));
                    }
                },
            }
        }
        let unknown: Vec<String> = map
            .keys()
            .filter(|key| !self.fields.iter().any(|(name, _)| name == *key))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            match self.unknown_keys {
                UnknownKeys::Strict => {
                    let quoted: Vec<String> =
                        unknown.iter().map(|key| format!("'{key}'")).collect();
                    issues.push(Issue::new(
                        path.to_vec(),
                        IssueKind::UnrecognizedKeys { keys: unknown },
                        format!("Unrecognized key(s) in object: {}", quoted.join(", ")),
                    ));
                }
                UnknownKeys::Strip => {}
                UnknownKeys::Passthrough => {
                    for key in unknown {
                        if let Some(extra) = map.get(&key) {
                            out.insert(key, extra.clone());
                        }
                    }
                }
            }
        }
        (issues.len() == before).then_some(Value::Object(out))
    }
}

fn push_type_mismatch(issues: &mut Vec<Issue>, path: &[Segment], expected: &'static str, value: &Value) {
    let received = type_name(value);
    issues.push(Issue::new(
        path.to_vec(),
        IssueKind::InvalidType { expected, received },
        format!("Expected {expected}, received {received}"),
    ));
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Keep integral results as JSON integers instead of `x.0` floats.
fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::from(value as i64)
    } else {
        Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn issues(schema: &Schema, value: Value) -> Vec<Issue> {
        schema.validate(&value).unwrap_err().issues
    }

    #[test]
    fn string_accepts_and_rejects() {
        let schema = Schema::non_empty_string();
        assert_eq!(schema.validate(&json!("name")).unwrap(), json!("name"));

        let found = issues(&schema, json!(42));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind.code(), "invalid_type");

        let found = issues(&schema, json!(""));
        assert!(matches!(
            found[0].kind,
            IssueKind::TooSmall { inclusive: true, origin: "string", .. }
        ));
    }

    #[test]
    fn coerced_number_parses_strings() {
        let schema = Schema::coerced_number();
        assert_eq!(schema.validate(&json!("42")).unwrap(), json!(42));
        assert_eq!(schema.validate(&json!(1.5)).unwrap(), json!(1.5));

        let found = issues(&schema, json!("not a number"));
        assert!(matches!(
            found[0].kind,
            IssueKind::InvalidType { expected: "number", received: "nan" }
        ));
    }

    #[test]
    fn number_minimum_is_enforced() {
        let schema = Schema::coerced_number_min(0.0);
        assert_eq!(schema.validate(&json!(0)).unwrap(), json!(0));
        assert_eq!(schema.validate(&json!("3")).unwrap(), json!(3));

        let found = issues(&schema, json!(-5));
        assert!(matches!(
            found[0].kind,
            IssueKind::TooSmall { inclusive: true, origin: "number", .. }
        ));
        // Coerced strings hit the same floor.
        let found = issues(&schema, json!("-2"));
        assert_eq!(found[0].kind.code(), "too_small");
    }

    #[test]
    fn coerced_date_canonicalizes() {
        let schema = Schema::coerced_date();
        assert_eq!(
            schema.validate(&json!("2022-06-09T19:43:12.326Z")).unwrap(),
            json!("2022-06-09T19:43:12.326Z")
        );
        // Offset form is normalized to UTC.
        assert_eq!(
            schema.validate(&json!("2022-06-09T21:43:12.326+02:00")).unwrap(),
            json!("2022-06-09T19:43:12.326Z")
        );
        // Epoch milliseconds coerce too.
        assert_eq!(
            schema.validate(&json!(1654803792326_i64)).unwrap(),
            json!("2022-06-09T19:43:12.326Z")
        );

        let found = issues(&schema, json!("tomorrow"));
        assert_eq!(found[0].kind, IssueKind::InvalidDate);
    }

    #[test]
    fn strict_object_rejects_unknown_keys() {
        let schema = ObjectSchema::new(vec![("name".into(), Schema::non_empty_string())])
            .strict()
            .into_schema();

        assert_eq!(
            schema.validate(&json!({"name": "a"})).unwrap(),
            json!({"name": "a"})
        );

        let found = issues(&schema, json!({"name": "a", "extra": 1, "more": 2}));
        assert_eq!(found.len(), 1);
        match &found[0].kind {
            IssueKind::UnrecognizedKeys { keys } => {
                assert_eq!(keys, &vec!["extra".to_string(), "more".to_string()]);
            }
            other => panic!("expected unrecognized_keys, got {other:?}"),
        }
    }

    #[test]
    fn object_reports_missing_required_fields_with_path() {
        let schema = ObjectSchema::new(vec![
            ("name".into(), Schema::non_empty_string()),
            ("age".into(), Schema::number().optional()),
        ])
        .into_schema();

        let found = issues(&schema, json!({}));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, vec![Segment::key("name")]);
        assert_eq!(found[0].message, "Required");
    }

    #[test]
    fn defaulted_fields_fill_in() {
        let schema = ObjectSchema::new(vec![
            ("offset".into(), Schema::coerced_number().defaulted(0)),
            ("limit".into(), Schema::coerced_number().defaulted(20)),
        ])
        .into_schema();

        assert_eq!(
            schema.validate(&json!({"offset": "5"})).unwrap(),
            json!({"offset": 5, "limit": 20})
        );
    }

    #[test]
    fn union_failure_carries_branch_trees() {
        let schema = Schema::union(vec![
            Schema::literal("asc"),
            Schema::literal("desc"),
        ]);
        assert_eq!(schema.validate(&json!("asc")).unwrap(), json!("asc"));

        let found = issues(&schema, json!("sideways"));
        assert_eq!(found.len(), 1);
        match &found[0].kind {
            IssueKind::InvalidUnion { union_issues } => {
                assert_eq!(union_issues.len(), 2);
                assert_eq!(union_issues[0][0].kind.code(), "invalid_literal");
            }
            other => panic!("expected invalid_union, got {other:?}"),
        }
    }

    #[test]
    fn nested_paths_thread_through_arrays() {
        let schema = ObjectSchema::new(vec![(
            "items".into(),
            Schema::array(
                ObjectSchema::new(vec![("name".into(), Schema::non_empty_string())]).into_schema(),
            ),
        )])
        .into_schema();

        let found = issues(&schema, json!({"items": [{"name": "ok"}, {"name": 7}]}));
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].path,
            vec![Segment::key("items"), Segment::index(1), Segment::key("name")]
        );
    }

    #[test]
    fn stripping_drops_keys_before_validation() {
        let inner = ObjectSchema::new(vec![("name".into(), Schema::non_empty_string())])
            .strict()
            .into_schema();
        let schema = Schema::stripping(&["id", "createdAt"], inner);

        assert_eq!(
            schema
                .validate(&json!({"id": "x", "createdAt": "y", "name": "a"}))
                .unwrap(),
            json!({"name": "a"})
        );
    }

    #[test]
    fn passthrough_object_keeps_extras() {
        let schema = ObjectSchema::new(vec![("href".into(), Schema::string())])
            .passthrough()
            .into_schema();
        assert_eq!(
            schema.validate(&json!({"href": "/x", "rel": "self"})).unwrap(),
            json!({"href": "/x", "rel": "self"})
        );
    }

    #[test]
    fn record_validates_every_value() {
        let schema = Schema::record(Schema::string());
        let found = issues(&schema, json!({"a": "ok", "b": 1}));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, vec![Segment::key("b")]);
    }
}
