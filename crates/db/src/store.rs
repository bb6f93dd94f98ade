//! Storage seam shared by every engine.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::error::{DbError, DbResult};
use crate::predicate::Predicate;
use crate::query::SortOrder;
use crate::update::Update;

/// A stored record. Every document carries its identifier under `id`.
pub type Document = Map<String, Value>;

/// Field holding the document identifier
pub const ID_FIELD: &str = "id";

/// Collection definition contributed by a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSpec {
    pub name: &'static str,
    pub unique: Vec<&'static str>,
}

impl CollectionSpec {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            unique: Vec::new(),
        }
    }

    /// Declare a field whose values must be unique across the collection
    pub fn unique(mut self, field: &'static str) -> Self {
        self.unique.push(field);
        self
    }
}

/// Sort, skip and limit applied to a `find`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub sort: Option<(String, SortOrder)>,
    pub skip: u64,
    pub limit: Option<u64>,
}

/// Async access to named document collections.
///
/// `update_one` is the only write that inspects existing state: the guard
/// predicate and every operator of the update are applied as one step, so a
/// guarded update never observes a concurrent write half way.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Register a collection and its unique indexes. Defining an existing
    /// collection again is a no-op.
    async fn define_collection(&self, spec: CollectionSpec) -> DbResult<()>;

    /// Insert a document, assigning an `id` when the document has none
    async fn insert(&self, collection: &str, document: Document) -> DbResult<Document>;

    async fn find_by_id(&self, collection: &str, id: &str) -> DbResult<Option<Document>>;

    /// Fetch documents by id in the order the ids are given, skipping
    /// identifiers that do not resolve
    async fn find_by_ids(&self, collection: &str, ids: &[String]) -> DbResult<Vec<Document>>;

    async fn find(
        &self,
        collection: &str,
        filter: &Predicate,
        options: &FindOptions,
    ) -> DbResult<Vec<Document>>;

    async fn count(&self, collection: &str, filter: &Predicate) -> DbResult<u64>;

    /// Apply `update` to the document `id` if it exists and satisfies
    /// `guard`. Returns the updated document, or `None` when nothing matched.
    async fn update_one(
        &self,
        collection: &str,
        id: &str,
        guard: &Predicate,
        update: &Update,
    ) -> DbResult<Option<Document>>;

    /// Remove a document, returning it if it existed
    async fn delete_one(&self, collection: &str, id: &str) -> DbResult<Option<Document>>;
}

/// Serialize a model into a storable document
pub fn to_document<T: Serialize>(value: &T) -> DbResult<Document> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(DbError::NotAnObject),
    }
}

/// Deserialize a stored document into a model
pub fn from_document<T: DeserializeOwned>(document: Document) -> DbResult<T> {
    Ok(serde_json::from_value(Value::Object(document))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Shelf {
        id: String,
        label: String,
    }

    #[test]
    fn models_convert_to_documents_and_back() {
        let shelf = Shelf {
            id: "s1".to_string(),
            label: "Sci-fi".to_string(),
        };
        let document = to_document(&shelf).unwrap();
        assert_eq!(document.get("label"), Some(&Value::from("Sci-fi")));

        let back: Shelf = from_document(document).unwrap();
        assert_eq!(back, shelf);
    }

    #[test]
    fn scalars_are_not_documents() {
        assert!(matches!(to_document(&42), Err(DbError::NotAnObject)));
    }

    #[test]
    fn collection_spec_collects_unique_fields() {
        let spec = CollectionSpec::new("users").unique("email");
        assert_eq!(spec.unique, vec!["email"]);
    }
}
