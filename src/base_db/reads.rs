use super::core::BaseDb;
use crate::errors::DbError;
use crate::query::{Cursor, FindOptions};
use bson::{Bson, Document as BsonDocument, doc};

pub(super) fn by_ids_selector<I, T>(ids: I) -> BsonDocument
where
    I: IntoIterator<Item = T>,
    T: Into<Bson>,
{
    let ids: Vec<Bson> = ids.into_iter().map(Into::into).collect();
    doc! { "_id": { "$in": ids } }
}

impl BaseDb {
    /// Forwarded unchanged to the collection.
    ///
    /// # Errors
    /// Whatever the collection returns.
    pub fn find(&self, selector: &BsonDocument, options: &FindOptions) -> Result<Cursor, DbError> {
        self.model.find(selector, options)
    }

    /// Forwarded unchanged to the collection.
    ///
    /// # Errors
    /// Whatever the collection returns.
    pub fn find_one(&self, selector: &BsonDocument, options: &FindOptions) -> Result<Option<BsonDocument>, DbError> {
        self.model.find_one(selector, options)
    }

    /// `find_one({_id: id}, options)`.
    ///
    /// # Errors
    /// Whatever the collection returns.
    pub fn find_one_by_id(
        &self,
        id: impl Into<Bson>,
        options: &FindOptions,
    ) -> Result<Option<BsonDocument>, DbError> {
        self.find_one(&doc! { "_id": id.into() }, options)
    }

    /// `find_one({_id: {$in: ids}}, options)`: any one record whose id is listed.
    ///
    /// # Errors
    /// Whatever the collection returns.
    pub fn find_one_by_ids<I, T>(&self, ids: I, options: &FindOptions) -> Result<Option<BsonDocument>, DbError>
    where
        I: IntoIterator<Item = T>,
        T: Into<Bson>,
    {
        self.find_one(&by_ids_selector(ids), options)
    }

    /// `find({_id: {$in: ids}}, options)`.
    ///
    /// # Errors
    /// Whatever the collection returns.
    pub fn find_by_ids<I, T>(&self, ids: I, options: &FindOptions) -> Result<Cursor, DbError>
    where
        I: IntoIterator<Item = T>,
        T: Into<Bson>,
    {
        self.find(&by_ids_selector(ids), options)
    }
}
