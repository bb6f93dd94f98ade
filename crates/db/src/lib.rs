//! Document store for shelf: collection trait, bundled in-memory engine,
//! predicates, update operators and list-query building.

pub mod error;
pub mod memory;
pub mod predicate;
pub mod query;
pub mod store;
pub mod update;

pub use error::{DbError, DbResult};
pub use memory::MemoryStore;
pub use predicate::Predicate;
pub use store::{from_document, to_document, CollectionSpec, Document, DocumentStore, FindOptions};
pub use update::{Update, UpdateOp};
