//! Persistence seam for the resource handlers.
//!
//! Handlers never talk to storage directly: they call a [`Repository`]
//! with JSON values and leave lookup, persistence and list resolution to
//! the implementation. [`InMemoryRepository`] backs the tests and small
//! deployments with a lock-guarded vector.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use thiserror::Error;

/// Storage-layer failure. Surfaces to clients as a redacted 500.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct RepositoryError {
    pub message: String,
}

impl RepositoryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Storage collaborator for one resource collection.
///
/// Models are JSON objects carrying at least an `id` string. The trait
/// is deliberately value-typed so one implementation serves any resource
/// the envelope schemas describe.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Look up a model by its identity. `Ok(None)` means no entry.
    async fn find_one_by_id(&self, id: &str) -> Result<Option<Value>, RepositoryError>;

    /// Insert or replace the model, keyed by its `id` field. Returns the
    /// stored representation.
    async fn persist(&self, model: Value) -> Result<Value, RepositoryError>;

    /// Remove the model from the collection.
    async fn remove(&self, model: Value) -> Result<(), RepositoryError>;

    /// Resolve a validated list query into the list envelope: the query
    /// echoed back plus `count` (total matches before paging) and
    /// `items` (the page).
    async fn resolve_list(&self, query: Value) -> Result<Value, RepositoryError>;
}

/// Vector-backed repository guarded by a read/write lock.
///
/// Insertion order is preserved and doubles as the unsorted list order.
/// Multi-field sorts apply in the sort object's key order, which
/// `serde_json::Map` keeps alphabetical regardless of how the query
/// string ordered the parameters. Concurrent persists of the same id
/// are last-write-wins.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    entries: RwLock<Vec<(String, Value)>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn model_id(model: &Value) -> Result<String, RepositoryError> {
        model
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| RepositoryError::new("model has no string \"id\" field"))
    }

    fn matches_filters(model: &Value, filters: &Map<String, Value>) -> bool {
        filters
            .iter()
            .all(|(field, expected)| model.get(field) == Some(expected))
    }

    fn sort_items(items: &mut [Value], sort: &Map<String, Value>) {
        // Later sort fields are subordinate; applying them first and the
        // primary field last keeps the stable sort's priority right.
        for (field, direction) in sort.iter().rev() {
            let descending = direction.as_str() == Some("desc");
            items.sort_by(|a, b| {
                let ordering = compare_values(a.get(field), b.get(field));
                if descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => a
                .as_f64()
                .partial_cmp(&b.as_f64())
                .unwrap_or(Ordering::Equal),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            _ => Ordering::Equal,
        },
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn find_one_by_id(&self, id: &str) -> Result<Option<Value>, RepositoryError> {
        let entries = self.entries.read();
        Ok(entries
            .iter()
            .find(|(entry_id, _)| entry_id == id)
            .map(|(_, model)| model.clone()))
    }

    async fn persist(&self, model: Value) -> Result<Value, RepositoryError> {
        let id = Self::model_id(&model)?;
        let mut entries = self.entries.write();
        match entries.iter_mut().find(|(entry_id, _)| *entry_id == id) {
            Some((_, existing)) => *existing = model.clone(),
            None => entries.push((id, model.clone())),
        }
        Ok(model)
    }

    async fn remove(&self, model: Value) -> Result<(), RepositoryError> {
        let id = Self::model_id(&model)?;
        let mut entries = self.entries.write();
        entries.retain(|(entry_id, _)| *entry_id != id);
        Ok(())
    }

    async fn resolve_list(&self, query: Value) -> Result<Value, RepositoryError> {
        let empty = Map::new();
        let filters = query
            .get("filters")
            .and_then(Value::as_object)
            .unwrap_or(&empty);
        let sort = query
            .get("sort")
            .and_then(Value::as_object)
            .unwrap_or(&empty);
        let offset = query.get("offset").and_then(Value::as_u64).unwrap_or(0) as usize;
        let limit = query.get("limit").and_then(Value::as_u64).unwrap_or(20) as usize;

        let mut matched: Vec<Value> = {
            let entries = self.entries.read();
            entries
                .iter()
                .filter(|(_, model)| Self::matches_filters(model, filters))
                .map(|(_, model)| model.clone())
                .collect()
        };
        let count = matched.len();
        Self::sort_items(&mut matched, sort);
        let items: Vec<Value> = matched.into_iter().skip(offset).take(limit).collect();

        let mut envelope = match query {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        envelope.insert("count".to_owned(), Value::from(count));
        envelope.insert("items".to_owned(), Value::Array(items));
        Ok(Value::Object(envelope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn model(id: &str, name: &str, rank: i64) -> Value {
        json!({
            "id": id,
            "createdAt": "2024-01-01T00:00:00.000Z",
            "name": name,
            "rank": rank
        })
    }

    #[tokio::test]
    async fn persist_then_find() {
        let repository = InMemoryRepository::new();
        repository.persist(model("a", "first", 1)).await.unwrap();

        let found = repository.find_one_by_id("a").await.unwrap().unwrap();
        assert_eq!(found["name"], json!("first"));
        assert!(repository.find_one_by_id("b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn persist_replaces_in_place() {
        let repository = InMemoryRepository::new();
        repository.persist(model("a", "first", 1)).await.unwrap();
        repository.persist(model("b", "second", 2)).await.unwrap();
        repository.persist(model("a", "renamed", 1)).await.unwrap();

        let list = repository
            .resolve_list(json!({"offset": 0, "limit": 20, "filters": {}, "sort": {}}))
            .await
            .unwrap();
        // Replacement keeps the original position.
        assert_eq!(list["items"][0]["name"], json!("renamed"));
        assert_eq!(list["count"], json!(2));
    }

    #[tokio::test]
    async fn persist_without_id_fails() {
        let repository = InMemoryRepository::new();
        let error = repository.persist(json!({"name": "x"})).await.unwrap_err();
        assert!(error.message.contains("id"));
    }

    #[tokio::test]
    async fn remove_deletes_the_entry() {
        let repository = InMemoryRepository::new();
        repository.persist(model("a", "first", 1)).await.unwrap();
        repository.remove(json!({"id": "a"})).await.unwrap();
        assert!(repository.find_one_by_id("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_filters_sorts_and_pages() {
        let repository = InMemoryRepository::new();
        repository.persist(model("a", "blue", 3)).await.unwrap();
        repository.persist(model("b", "red", 1)).await.unwrap();
        repository.persist(model("c", "blue", 2)).await.unwrap();

        let list = repository
            .resolve_list(json!({
                "offset": 0,
                "limit": 1,
                "filters": {"name": "blue"},
                "sort": {"rank": "asc"}
            }))
            .await
            .unwrap();

        // count reflects all matches, items only the requested page.
        assert_eq!(list["count"], json!(2));
        assert_eq!(list["items"].as_array().unwrap().len(), 1);
        assert_eq!(list["items"][0]["id"], json!("c"));
        // The query is echoed back on the envelope.
        assert_eq!(list["offset"], json!(0));
        assert_eq!(list["limit"], json!(1));
        assert_eq!(list["filters"], json!({"name": "blue"}));
    }

    #[tokio::test]
    async fn list_sorts_descending() {
        let repository = InMemoryRepository::new();
        repository.persist(model("a", "x", 1)).await.unwrap();
        repository.persist(model("b", "y", 3)).await.unwrap();
        repository.persist(model("c", "z", 2)).await.unwrap();

        let list = repository
            .resolve_list(json!({
                "offset": 0,
                "limit": 20,
                "filters": {},
                "sort": {"rank": "desc"}
            }))
            .await
            .unwrap();
        let ids: Vec<_> = list["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["id"].clone())
            .collect();
        assert_eq!(ids, vec![json!("b"), json!("c"), json!("a")]);
    }

    #[tokio::test]
    async fn multi_field_sort_priority_is_alphabetical() {
        let repository = InMemoryRepository::new();
        repository.persist(model("a", "blue", 2)).await.unwrap();
        repository.persist(model("b", "blue", 1)).await.unwrap();
        repository.persist(model("c", "azure", 3)).await.unwrap();

        // "name" sorts before "rank" alphabetically, so it is the
        // primary key no matter how the query string ordered them.
        let list = repository
            .resolve_list(json!({
                "offset": 0,
                "limit": 20,
                "filters": {},
                "sort": {"rank": "asc", "name": "asc"}
            }))
            .await
            .unwrap();
        let ids: Vec<_> = list["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["id"].clone())
            .collect();
        assert_eq!(ids, vec![json!("c"), json!("b"), json!("a")]);
    }

    #[tokio::test]
    async fn offset_beyond_matches_yields_empty_page() {
        let repository = InMemoryRepository::new();
        repository.persist(model("a", "x", 1)).await.unwrap();

        let list = repository
            .resolve_list(json!({"offset": 5, "limit": 20, "filters": {}, "sort": {}}))
            .await
            .unwrap();
        assert_eq!(list["count"], json!(1));
        assert_eq!(list["items"], json!([]));
    }
}
