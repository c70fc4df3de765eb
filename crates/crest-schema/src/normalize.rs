//! Validation-failure normalization.
//!
//! Flattens a failure tree into the ordered list of client-presentable
//! [`InvalidParameter`] records: one record per leaf node, nested trees
//! inside union/argument/return-type nodes recursively normalized and
//! embedded in the record's `context` rather than flattened into the
//! outer sequence.

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::issue::{ContextValue, Issue, IssueKind, Segment};

/// Marker substituted for context values that cannot be represented on
/// the wire, so clients still see that extra context existed without the
/// internals leaking.
pub const FILTERED: &str = "**filtered**";

/// One client-presentable invalid-parameter record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvalidParameter {
    pub name: String,
    pub reason: String,
    pub context: Map<String, Value>,
}

/// Normalize a failure tree into invalid-parameter records, preserving
/// input order. Output is deterministic: same tree, same bytes.
pub fn invalid_parameters(issues: &[Issue]) -> Vec<InvalidParameter> {
    issues
        .iter()
        .map(|issue| InvalidParameter {
            name: parameter_name(&issue.path),
            reason: issue.message.clone(),
            context: context_for(&issue.kind),
        })
        .collect()
}

/// Join path segments into a parameter name: the first segment is bare,
/// every following segment is bracketed. Array indices and object keys
/// are rendered identically: `[path, 0, to, field]` → `path[0][to][field]`.
fn parameter_name(path: &[Segment]) -> String {
    let mut name = String::new();
    for (position, segment) in path.iter().enumerate() {
        if position == 0 {
            name.push_str(&segment.render());
        } else {
            name.push('[');
            name.push_str(&segment.render());
            name.push(']');
        }
    }
    name
}

fn context_for(kind: &IssueKind) -> Map<String, Value> {
    let mut context = Map::new();
    context.insert("code".to_owned(), Value::String(kind.code().to_owned()));
    match kind {
        IssueKind::InvalidType { expected, received } => {
            context.insert("expected".to_owned(), Value::String((*expected).to_owned()));
            context.insert("received".to_owned(), Value::String((*received).to_owned()));
        }
        IssueKind::InvalidLiteral { expected, received } => {
            context.insert("expected".to_owned(), expected.clone());
            context.insert("received".to_owned(), received.clone());
        }
        IssueKind::Custom { params } => {
            if !params.is_empty() {
                let mut sanitized = Map::new();
                for (key, value) in params {
                    sanitized.insert(key.clone(), sanitize(value));
                }
                context.insert("params".to_owned(), Value::Object(sanitized));
            }
        }
        IssueKind::InvalidUnion { union_issues } => {
            let branches: Vec<Value> = union_issues.iter().map(|tree| embedded(tree)).collect();
            context.insert("unionErrors".to_owned(), Value::Array(branches));
        }
        IssueKind::InvalidUnionDiscriminator { options } => {
            context.insert("options".to_owned(), Value::Array(options.clone()));
        }
        IssueKind::InvalidEnumValue { options, received } => {
            context.insert("options".to_owned(), Value::Array(options.clone()));
            context.insert("received".to_owned(), received.clone());
        }
        IssueKind::UnrecognizedKeys { keys } => {
            context.insert(
                "keys".to_owned(),
                Value::Array(keys.iter().cloned().map(Value::String).collect()),
            );
        }
        IssueKind::InvalidArguments { argument_issues } => {
            context.insert("argumentsError".to_owned(), embedded(argument_issues));
        }
        IssueKind::InvalidReturnType { return_issues } => {
            context.insert("returnTypeError".to_owned(), embedded(return_issues));
        }
        IssueKind::InvalidDate => {}
        IssueKind::InvalidString { validation } => {
            context.insert(
                "validation".to_owned(),
                Value::String((*validation).to_owned()),
            );
        }
        IssueKind::TooSmall {
            minimum,
            inclusive,
            origin,
        } => {
            context.insert("minimum".to_owned(), minimum.clone());
            context.insert("inclusive".to_owned(), Value::Bool(*inclusive));
            context.insert("type".to_owned(), Value::String((*origin).to_owned()));
        }
        IssueKind::TooBig {
            maximum,
            inclusive,
            origin,
        } => {
            context.insert("maximum".to_owned(), maximum.clone());
            context.insert("inclusive".to_owned(), Value::Bool(*inclusive));
            context.insert("type".to_owned(), Value::String((*origin).to_owned()));
        }
        IssueKind::InvalidIntersectionTypes => {}
        IssueKind::NotMultipleOf { multiple_of } => {
            context.insert("multipleOf".to_owned(), multiple_of.clone());
        }
        IssueKind::NotFinite => {}
    }
    context
}

/// Recursively normalize a nested tree and embed it as a context value.
fn embedded(issues: &[Issue]) -> Value {
    Value::Array(
        invalid_parameters(issues)
            .into_iter()
            .map(|parameter| {
                let mut record = Map::new();
                record.insert("name".to_owned(), Value::String(parameter.name));
                record.insert("reason".to_owned(), Value::String(parameter.reason));
                record.insert("context".to_owned(), Value::Object(parameter.context));
                Value::Object(record)
            })
            .collect(),
    )
}

fn sanitize(value: &ContextValue) -> Value {
    match value {
        ContextValue::Json(json) => json.clone(),
        ContextValue::Timestamp(instant) => {
            Value::String(instant.to_rfc3339_opts(SecondsFormat::Millis, true))
        }
        ContextValue::Opaque => Value::String(FILTERED.to_owned()),
    }
}
