use super::core::BaseDb;
use crate::collection::Store;
use crate::errors::DbError;
use crate::query::{Cursor, FindOptions, UpdateOptions};
use crate::types::ID_FIELD;
use bson::{Bson, Document as BsonDocument, doc};
use chrono::{DateTime, Utc};

/// Trash field holding the time of removal.
pub const DELETED_AT_FIELD: &str = "_deletedAt";

/// Trash field holding the logical name of the model the record came from.
pub const COLLECTION_FIELD: &str = "__collection__";

impl BaseDb {
    pub(super) fn move_to_trash(&self, trash: &dyn Store, record: &BsonDocument) -> Result<(), DbError> {
        let Some(id) = record.get(ID_FIELD) else { return Ok(()) };
        let mut copy = record.clone();
        copy.remove(ID_FIELD);
        copy.insert(DELETED_AT_FIELD, Bson::DateTime(bson::DateTime::now()));
        copy.insert(COLLECTION_FIELD, self.name.as_str());
        trash.update(&doc! { "_id": id.clone() }, &copy, &UpdateOptions { multi: false, upsert: true })?;
        Ok(())
    }

    /// Drops this model's trash entries for `records`. Failures are logged.
    pub(super) fn discard_from_trash(&self, trash: &dyn Store, records: &[BsonDocument]) {
        let ids: Vec<Bson> = records.iter().filter_map(|r| r.get(ID_FIELD).cloned()).collect();
        if ids.is_empty() {
            return;
        }
        if let Err(e) = trash.remove(&self.trash_selector(&doc! { "_id": { "$in": ids } })) {
            log::error!("model {}: could not roll back trash copies: {e}", self.name);
        }
    }

    fn trash_selector(&self, selector: &BsonDocument) -> BsonDocument {
        let mut sel = selector.clone();
        sel.insert(COLLECTION_FIELD, self.name.as_str());
        sel
    }

    /// Removed records of this model matching `selector`. Empty without a trash.
    ///
    /// # Errors
    /// Whatever the trash collection returns.
    pub fn trash_find(&self, selector: &BsonDocument, options: &FindOptions) -> Result<Cursor, DbError> {
        match &self.trash {
            Some(trash) => trash.find(&self.trash_selector(selector), options),
            None => Ok(Cursor::empty()),
        }
    }

    /// # Errors
    /// Whatever the trash collection returns.
    pub fn trash_find_one_by_id(
        &self,
        id: impl Into<Bson>,
        options: &FindOptions,
    ) -> Result<Option<BsonDocument>, DbError> {
        match &self.trash {
            Some(trash) => trash.find_one(&self.trash_selector(&doc! { "_id": id.into() }), options),
            None => Ok(None),
        }
    }

    /// Removed records of this model deleted strictly after `deleted_at`.
    ///
    /// # Errors
    /// Whatever the trash collection returns.
    pub fn trash_find_deleted_after(
        &self,
        deleted_at: DateTime<Utc>,
        selector: &BsonDocument,
        options: &FindOptions,
    ) -> Result<Cursor, DbError> {
        let mut sel = selector.clone();
        let after = bson::DateTime::from_millis(deleted_at.timestamp_millis());
        sel.insert(DELETED_AT_FIELD, doc! { "$gt": after });
        self.trash_find(&sel, options)
    }
}
