use crate::errors::DbError;
use crate::query::{Cursor, DeleteReport, FindOptions, IndexOptions, UpdateOptions, UpdateReport};
use bson::{Bson, Document as BsonDocument};

use super::index_admin::IndexSpec;

/// A collection handle: the operations a model delegates to.
///
/// Implemented by the in-memory [`Collection`](super::Collection); any other
/// backend (or a test double) can stand in for it.
pub trait Store: Send + Sync {
    /// Physical collection name.
    fn name(&self) -> String;

    /// # Errors
    /// Returns an error if the selector cannot be evaluated.
    fn find(&self, selector: &BsonDocument, options: &FindOptions) -> Result<Cursor, DbError>;

    /// # Errors
    /// Returns an error if the selector cannot be evaluated.
    fn find_one(
        &self,
        selector: &BsonDocument,
        options: &FindOptions,
    ) -> Result<Option<BsonDocument>, DbError>;

    /// Inserts `record`, generating `_id` when absent. Returns the `_id`.
    ///
    /// # Errors
    /// Returns `DuplicateKey` when the id or a unique index key is taken.
    fn insert(&self, record: BsonDocument) -> Result<Bson, DbError>;

    /// # Errors
    /// Returns an error for malformed selectors/updates or unique violations.
    fn update(
        &self,
        selector: &BsonDocument,
        update: &BsonDocument,
        options: &UpdateOptions,
    ) -> Result<UpdateReport, DbError>;

    /// # Errors
    /// Returns an error if the selector cannot be evaluated.
    fn remove(&self, selector: &BsonDocument) -> Result<DeleteReport, DbError>;

    /// Creates the index if it does not exist yet. Returns the index name.
    ///
    /// # Errors
    /// Returns `IndexError` for malformed keys or a conflicting definition.
    fn ensure_index(&self, keys: &BsonDocument, options: &IndexOptions) -> Result<String, DbError>;

    /// # Errors
    /// Returns `IndexError` if no index has that name.
    fn drop_index(&self, name: &str) -> Result<(), DbError>;

    fn index_specs(&self) -> Vec<IndexSpec> {
        Vec::new()
    }
}
