use super::core::BaseDb;
use crate::errors::DbError;
use crate::query::IndexOptions;
use bson::Document as BsonDocument;

impl BaseDb {
    /// # Errors
    /// Whatever the collection returns.
    pub fn ensure_index(&self, keys: &BsonDocument, options: &IndexOptions) -> Result<String, DbError> {
        self.model.ensure_index(keys, options)
    }

    /// # Errors
    /// Whatever the collection returns.
    pub fn drop_index(&self, name: &str) -> Result<(), DbError> {
        self.model.drop_index(name)
    }

    /// [`ensure_index`](Self::ensure_index) with default options; failures
    /// are logged, not returned.
    pub fn try_ensure_index(&self, keys: &BsonDocument) -> bool {
        match self.model.ensure_index(keys, &IndexOptions::default()) {
            Ok(_) => true,
            Err(e) => {
                log::error!("ensure index {keys} on {} failed: {e}", self.collection_name);
                false
            }
        }
    }

    /// Failures are logged, not returned.
    pub fn try_drop_index(&self, name: &str) -> bool {
        match self.model.drop_index(name) {
            Ok(()) => true,
            Err(e) => {
                log::error!("drop index {name} on {} failed: {e}", self.collection_name);
                false
            }
        }
    }
}
