//! Query-string decoding for list endpoints.
//!
//! The list pipeline treats the query string as its request "body": the
//! raw string is decoded into a JSON mapping here, then validated by the
//! configured query schema (which coerces numeric fields). Bracket
//! syntax nests: `filters[name]=abc&sort[name]=asc` becomes
//! `{"filters": {"name": "abc"}, "sort": {"name": "asc"}}`.

use serde_json::{Map, Value};
use url::form_urlencoded;

/// Decode a raw query string into a JSON object. All scalar values stay
/// strings; schema coercion turns them into numbers/dates later.
/// Repeated keys keep the last occurrence.
pub fn parse_query(query: &str) -> Value {
    let mut root = Map::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        insert_path(&mut root, &key, value.into_owned());
    }
    Value::Object(root)
}

/// Split `filters[name][first]` into `["filters", "name", "first"]`.
/// Keys that do not follow the bracket shape are kept verbatim.
fn key_segments(key: &str) -> Vec<String> {
    let Some(start) = key.find('[') else {
        return vec![key.to_owned()];
    };
    if start == 0 || !key.ends_with(']') {
        return vec![key.to_owned()];
    }
    let mut segments = vec![key[..start].to_owned()];
    let mut rest = &key[start..];
    while !rest.is_empty() {
        if !rest.starts_with('[') {
            return vec![key.to_owned()];
        }
        let Some(end) = rest.find(']') else {
            return vec![key.to_owned()];
        };
        segments.push(rest[1..end].to_owned());
        rest = &rest[end + 1..];
    }
    segments
}

fn insert_path(root: &mut Map<String, Value>, key: &str, value: String) {
    let segments = key_segments(key);
    let Some((last, parents)) = segments.split_last() else {
        return;
    };
    let mut current = root;
    for segment in parents {
        let entry = current
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            // A scalar was assigned earlier under this key; the nested
            // assignment wins.
            *entry = Value::Object(Map::new());
        }
        match entry.as_object_mut() {
            Some(next) => current = next,
            None => return,
        }
    }
    current.insert(last.clone(), Value::String(value));
}
