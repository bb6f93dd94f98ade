//! In-process document engine.
//!
//! Collections are kept in insertion order behind a single `RwLock`, which is
//! what makes `update_one` a single atomic step: the guard is evaluated and the
//! operators applied while the write lock is held.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::predicate::{compare_values, lookup, Predicate};
use crate::query::SortOrder;
use crate::store::{CollectionSpec, Document, DocumentStore, FindOptions, ID_FIELD};
use crate::update::Update;

#[derive(Debug)]
struct Collection {
    spec: CollectionSpec,
    documents: Vec<Document>,
}

impl Collection {
    fn position(&self, id: &str) -> Option<usize> {
        self.documents
            .iter()
            .position(|document| document_id(document) == Some(id))
    }

    /// First unique field whose value in `candidate` collides with another
    /// document (the document at `skip`, if any, is the candidate's old self)
    fn unique_violation(&self, candidate: &Document, skip: Option<usize>) -> Option<String> {
        let mut fields: Vec<&str> = vec![ID_FIELD];
        fields.extend(self.spec.unique.iter().copied());

        for field in fields {
            let Some(value) = candidate.get(field).filter(|value| !value.is_null()) else {
                continue;
            };
            let collides = self
                .documents
                .iter()
                .enumerate()
                .any(|(index, other)| Some(index) != skip && other.get(field) == Some(value));
            if collides {
                return Some(field.to_string());
            }
        }
        None
    }
}

fn document_id(document: &Document) -> Option<&str> {
    document.get(ID_FIELD).and_then(Value::as_str)
}

/// Document store held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn unknown(collection: &str) -> DbError {
    DbError::UnknownCollection(collection.to_string())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn define_collection(&self, spec: CollectionSpec) -> DbResult<()> {
        let mut collections = self.collections.write().await;
        collections
            .entry(spec.name.to_string())
            .or_insert_with(|| {
                tracing::debug!(
                    collection = spec.name,
                    unique = ?spec.unique,
                    "collection created"
                );
                Collection {
                    spec,
                    documents: Vec::new(),
                }
            });
        Ok(())
    }

    async fn insert(&self, collection: &str, mut document: Document) -> DbResult<Document> {
        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| unknown(collection))?;

        if document_id(&document).is_none() {
            document.insert(
                ID_FIELD.to_string(),
                Value::String(Uuid::now_v7().to_string()),
            );
        }

        if let Some(field) = target.unique_violation(&document, None) {
            return Err(DbError::DuplicateKey {
                collection: collection.to_string(),
                field,
            });
        }

        target.documents.push(document.clone());
        Ok(document)
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> DbResult<Option<Document>> {
        let collections = self.collections.read().await;
        let target = collections.get(collection).ok_or_else(|| unknown(collection))?;
        Ok(target
            .position(id)
            .map(|index| target.documents[index].clone()))
    }

    async fn find_by_ids(&self, collection: &str, ids: &[String]) -> DbResult<Vec<Document>> {
        let collections = self.collections.read().await;
        let target = collections.get(collection).ok_or_else(|| unknown(collection))?;
        Ok(ids
            .iter()
            .filter_map(|id| target.position(id))
            .map(|index| target.documents[index].clone())
            .collect())
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Predicate,
        options: &FindOptions,
    ) -> DbResult<Vec<Document>> {
        let collections = self.collections.read().await;
        let target = collections.get(collection).ok_or_else(|| unknown(collection))?;

        let mut matched: Vec<&Document> = target
            .documents
            .iter()
            .filter(|document| filter.evaluate(document))
            .collect();

        if let Some((field, order)) = &options.sort {
            // Stable sort: ties keep insertion order.
            matched.sort_by(|a, b| {
                let ordering = compare_values(lookup(a, field), lookup(b, field));
                match order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            });
        }

        let skip = usize::try_from(options.skip).unwrap_or(usize::MAX);
        let limit = options
            .limit
            .map(|limit| usize::try_from(limit).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        Ok(matched
            .into_iter()
            .skip(skip)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self, collection: &str, filter: &Predicate) -> DbResult<u64> {
        let collections = self.collections.read().await;
        let target = collections.get(collection).ok_or_else(|| unknown(collection))?;
        let total = target
            .documents
            .iter()
            .filter(|document| filter.evaluate(document))
            .count();
        Ok(total as u64)
    }

    async fn update_one(
        &self,
        collection: &str,
        id: &str,
        guard: &Predicate,
        update: &Update,
    ) -> DbResult<Option<Document>> {
        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| unknown(collection))?;

        let Some(index) = target.position(id) else {
            return Ok(None);
        };
        if !guard.evaluate(&target.documents[index]) {
            return Ok(None);
        }

        let mut updated = target.documents[index].clone();
        update.apply(&mut updated)?;

        if document_id(&updated) != Some(id) {
            return Err(DbError::InvalidUpdate {
                field: ID_FIELD.to_string(),
                reason: "document identifier cannot change".to_string(),
            });
        }
        if let Some(field) = target.unique_violation(&updated, Some(index)) {
            return Err(DbError::DuplicateKey {
                collection: collection.to_string(),
                field,
            });
        }

        target.documents[index] = updated.clone();
        Ok(Some(updated))
    }

    async fn delete_one(&self, collection: &str, id: &str) -> DbResult<Option<Document>> {
        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| unknown(collection))?;
        Ok(target
            .position(id)
            .map(|index| target.documents.remove(index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    async fn store_with_users() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .define_collection(CollectionSpec::new("users").unique("email"))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn insert_assigns_missing_ids() {
        let store = store_with_users().await;
        let inserted = store
            .insert("users", doc(json!({"email": "a@example.com"})))
            .await
            .unwrap();
        let id = inserted["id"].as_str().unwrap().to_string();

        let found = store.find_by_id("users", &id).await.unwrap();
        assert_eq!(found, Some(inserted));
    }

    #[tokio::test]
    async fn unique_fields_reject_duplicates() {
        let store = store_with_users().await;
        store
            .insert("users", doc(json!({"id": "u1", "email": "a@example.com"})))
            .await
            .unwrap();

        let err = store
            .insert("users", doc(json!({"id": "u2", "email": "a@example.com"})))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::DuplicateKey { ref field, .. } if field == "email"));

        store
            .insert("users", doc(json!({"id": "u3", "email": "b@example.com"})))
            .await
            .unwrap();
        let err = store
            .update_one(
                "users",
                "u3",
                &Predicate::All,
                &Update::new().set("email", "a@example.com"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::DuplicateKey { .. }));
    }

    #[tokio::test]
    async fn undefined_collections_are_errors() {
        let store = MemoryStore::new();
        let err = store.count("books", &Predicate::All).await.unwrap_err();
        assert!(matches!(err, DbError::UnknownCollection(name) if name == "books"));
    }

    #[tokio::test]
    async fn find_sorts_skips_and_limits() {
        let store = MemoryStore::new();
        store
            .define_collection(CollectionSpec::new("books"))
            .await
            .unwrap();
        for (id, year) in [("a", 1990), ("b", 1965), ("c", 2001), ("d", 1965)] {
            store
                .insert("books", doc(json!({"id": id, "year": year})))
                .await
                .unwrap();
        }

        let options = FindOptions {
            sort: Some(("year".to_string(), SortOrder::Asc)),
            skip: 1,
            limit: Some(2),
        };
        let found = store.find("books", &Predicate::All, &options).await.unwrap();
        let ids: Vec<&str> = found.iter().map(|d| d["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["d", "a"]);

        let options = FindOptions {
            sort: Some(("year".to_string(), SortOrder::Desc)),
            skip: 0,
            limit: None,
        };
        let found = store.find("books", &Predicate::All, &options).await.unwrap();
        let ids: Vec<&str> = found.iter().map(|d| d["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["c", "a", "b", "d"]);
    }

    #[tokio::test]
    async fn find_by_ids_preserves_requested_order() {
        let store = MemoryStore::new();
        store
            .define_collection(CollectionSpec::new("books"))
            .await
            .unwrap();
        for id in ["a", "b", "c"] {
            store.insert("books", doc(json!({"id": id}))).await.unwrap();
        }

        let ids = vec!["c".to_string(), "missing".to_string(), "a".to_string()];
        let found = store.find_by_ids("books", &ids).await.unwrap();
        let found: Vec<&str> = found.iter().map(|d| d["id"].as_str().unwrap()).collect();
        assert_eq!(found, vec!["c", "a"]);
    }

    #[tokio::test]
    async fn guarded_update_skips_when_guard_fails() {
        let store = store_with_users().await;
        store
            .insert("users", doc(json!({"id": "u1", "wishlist": ["b1"]})))
            .await
            .unwrap();

        let guard = Predicate::not(Predicate::contains("wishlist", "b1"));
        let result = store
            .update_one("users", "u1", &guard, &Update::new().push("wishlist", "b1"))
            .await
            .unwrap();
        assert!(result.is_none());

        let missing = store
            .update_one("users", "nobody", &Predicate::All, &Update::new())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn concurrent_guarded_pushes_apply_once() {
        let store = Arc::new(store_with_users().await);
        store
            .insert("users", doc(json!({"id": "u1", "wishlist": []})))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let guard = Predicate::not(Predicate::contains("wishlist", "b1"));
                store
                    .update_one("users", "u1", &guard, &Update::new().push("wishlist", "b1"))
                    .await
                    .unwrap()
                    .is_some()
            }));
        }

        let mut applied = 0;
        for handle in handles {
            if handle.await.unwrap() {
                applied += 1;
            }
        }
        assert_eq!(applied, 1);

        let user = store.find_by_id("users", "u1").await.unwrap().unwrap();
        assert_eq!(user["wishlist"], json!(["b1"]));
    }

    #[tokio::test]
    async fn identifiers_are_immutable() {
        let store = store_with_users().await;
        store
            .insert("users", doc(json!({"id": "u1"})))
            .await
            .unwrap();
        let err = store
            .update_one("users", "u1", &Predicate::All, &Update::new().set("id", "u2"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidUpdate { .. }));
    }

    #[tokio::test]
    async fn delete_returns_removed_document() {
        let store = store_with_users().await;
        store
            .insert("users", doc(json!({"id": "u1"})))
            .await
            .unwrap();
        assert!(store.delete_one("users", "u1").await.unwrap().is_some());
        assert!(store.delete_one("users", "u1").await.unwrap().is_none());
        assert_eq!(store.count("users", &Predicate::All).await.unwrap(), 0);
    }
}
