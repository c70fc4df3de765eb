//! Structured validation failures.
//!
//! A failed validation yields an ordered sequence of [`Issue`] nodes.
//! Each node names the offending field through a segment path, carries a
//! kind tag with kind-specific extras, and a human-readable message.
//! Union, argument and return-type kinds hold nested issue trees of the
//! same shape; those are recursively normalized, never flattened.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// One step of a field path: an object key or an array index.
///
/// The two are distinguished only while walking values; the normalizer
/// renders both identically in parameter names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl Segment {
    pub fn key(key: impl Into<String>) -> Self {
        Self::Key(key.into())
    }

    pub fn index(index: usize) -> Self {
        Self::Index(index)
    }

    /// Render the segment without brackets.
    pub fn render(&self) -> String {
        match self {
            Self::Key(key) => key.clone(),
            Self::Index(index) => index.to_string(),
        }
    }
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_owned())
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// A kind-specific extra value attached to a failure node.
///
/// Extras travel into the client-visible `context` object, so anything
/// that is not representable on the wire is tagged [`ContextValue::Opaque`]
/// and replaced by a fixed marker during normalization instead of being
/// leaked or dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    /// Plain wire-representable value, copied verbatim.
    Json(Value),
    /// Instant, serialized to its canonical RFC 3339 form.
    Timestamp(DateTime<Utc>),
    /// Not representable (e.g. a captured error object).
    Opaque,
}

/// Failure-node kind. Wire codes follow the originating engine.
#[derive(Debug, Clone, PartialEq)]
pub enum IssueKind {
    InvalidType {
        expected: &'static str,
        received: &'static str,
    },
    InvalidLiteral {
        expected: Value,
        received: Value,
    },
    Custom {
        /// Ordered extra params; empty means no `params` context entry.
        params: Vec<(String, ContextValue)>,
    },
    /// Every union branch failed; one child tree per branch.
    InvalidUnion {
        union_issues: Vec<Vec<Issue>>,
    },
    InvalidUnionDiscriminator {
        options: Vec<Value>,
    },
    InvalidEnumValue {
        options: Vec<Value>,
        received: Value,
    },
    UnrecognizedKeys {
        keys: Vec<String>,
    },
    InvalidArguments {
        argument_issues: Vec<Issue>,
    },
    InvalidReturnType {
        return_issues: Vec<Issue>,
    },
    InvalidDate,
    InvalidString {
        validation: &'static str,
    },
    TooSmall {
        minimum: Value,
        inclusive: bool,
        origin: &'static str,
    },
    TooBig {
        maximum: Value,
        inclusive: bool,
        origin: &'static str,
    },
    InvalidIntersectionTypes,
    NotMultipleOf {
        multiple_of: Value,
    },
    NotFinite,
}

impl IssueKind {
    /// Stable wire code identifying the failure kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidType { .. } => "invalid_type",
            Self::InvalidLiteral { .. } => "invalid_literal",
            Self::Custom { .. } => "custom",
            Self::InvalidUnion { .. } => "invalid_union",
            Self::InvalidUnionDiscriminator { .. } => "invalid_union_discriminator",
            Self::InvalidEnumValue { .. } => "invalid_enum_value",
            Self::UnrecognizedKeys { .. } => "unrecognized_keys",
            Self::InvalidArguments { .. } => "invalid_arguments",
            Self::InvalidReturnType { .. } => "invalid_return_type",
            Self::InvalidDate => "invalid_date",
            Self::InvalidString { .. } => "invalid_string",
            Self::TooSmall { .. } => "too_small",
            Self::TooBig { .. } => "too_big",
            Self::InvalidIntersectionTypes => "invalid_intersection_types",
            Self::NotMultipleOf { .. } => "not_multiple_of",
            Self::NotFinite => "not_finite",
        }
    }
}

/// One validation failure node.
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub path: Vec<Segment>,
    pub kind: IssueKind,
    pub message: String,
}

impl Issue {
    pub fn new(path: Vec<Segment>, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            path,
            kind,
            message: message.into(),
        }
    }
}
