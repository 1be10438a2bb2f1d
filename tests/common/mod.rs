#![allow(dead_code)]

use bson::{Bson, Document as BsonDocument};
use chatmodels::errors::DbError;
use chatmodels::query::{Cursor, DeleteReport, FindOptions, IndexOptions, UpdateOptions, UpdateReport};
use chatmodels::{Collection, Store};
use parking_lot::Mutex;
use std::sync::Arc;

/// One recorded call on a [`SpyStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Find(BsonDocument, FindOptions),
    FindOne(BsonDocument, FindOptions),
    Insert(BsonDocument),
    Update(BsonDocument, BsonDocument, UpdateOptions),
    Remove(BsonDocument),
    EnsureIndex(BsonDocument, IndexOptions),
    DropIndex(String),
}

/// Store double that records every call and returns empty results.
pub struct SpyStore {
    name: String,
    calls: Mutex<Vec<Call>>,
    fail_index: bool,
}

impl SpyStore {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self { name: name.to_string(), calls: Mutex::new(Vec::new()), fail_index: false })
    }

    /// A spy whose index operations fail.
    pub fn failing_index(name: &str) -> Arc<Self> {
        Arc::new(Self { name: name.to_string(), calls: Mutex::new(Vec::new()), fail_index: true })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    pub fn index_calls(&self) -> Vec<Call> {
        self.calls().into_iter().filter(|c| matches!(c, Call::EnsureIndex(..))).collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

impl Store for SpyStore {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn find(&self, selector: &BsonDocument, options: &FindOptions) -> Result<Cursor, DbError> {
        self.record(Call::Find(selector.clone(), options.clone()));
        Ok(Cursor::empty())
    }

    fn find_one(&self, selector: &BsonDocument, options: &FindOptions) -> Result<Option<BsonDocument>, DbError> {
        self.record(Call::FindOne(selector.clone(), options.clone()));
        Ok(None)
    }

    fn insert(&self, record: BsonDocument) -> Result<Bson, DbError> {
        let id = record.get("_id").cloned().unwrap_or(Bson::String("spy-id".into()));
        self.record(Call::Insert(record));
        Ok(id)
    }

    fn update(
        &self,
        selector: &BsonDocument,
        update: &BsonDocument,
        options: &UpdateOptions,
    ) -> Result<UpdateReport, DbError> {
        self.record(Call::Update(selector.clone(), update.clone(), *options));
        Ok(UpdateReport::default())
    }

    fn remove(&self, selector: &BsonDocument) -> Result<DeleteReport, DbError> {
        self.record(Call::Remove(selector.clone()));
        Ok(DeleteReport::default())
    }

    fn ensure_index(&self, keys: &BsonDocument, options: &IndexOptions) -> Result<String, DbError> {
        self.record(Call::EnsureIndex(keys.clone(), options.clone()));
        if self.fail_index {
            return Err(DbError::IndexError("spy refuses indexes".into()));
        }
        Ok("spy_index".into())
    }

    fn drop_index(&self, name: &str) -> Result<(), DbError> {
        self.record(Call::DropIndex(name.to_string()));
        if self.fail_index {
            return Err(DbError::IndexError("spy refuses indexes".into()));
        }
        Ok(())
    }
}

/// A real collection whose `remove` always fails.
pub struct RemoveFails(pub Arc<Collection>);

impl Store for RemoveFails {
    fn name(&self) -> String {
        self.0.name()
    }

    fn find(&self, selector: &BsonDocument, options: &FindOptions) -> Result<Cursor, DbError> {
        self.0.find(selector, options)
    }

    fn find_one(&self, selector: &BsonDocument, options: &FindOptions) -> Result<Option<BsonDocument>, DbError> {
        self.0.find_one(selector, options)
    }

    fn insert(&self, record: BsonDocument) -> Result<Bson, DbError> {
        self.0.insert(record)
    }

    fn update(
        &self,
        selector: &BsonDocument,
        update: &BsonDocument,
        options: &UpdateOptions,
    ) -> Result<UpdateReport, DbError> {
        self.0.update(selector, update, options)
    }

    fn remove(&self, _selector: &BsonDocument) -> Result<DeleteReport, DbError> {
        Err(DbError::Io("storage went away".into()))
    }

    fn ensure_index(&self, keys: &BsonDocument, options: &IndexOptions) -> Result<String, DbError> {
        self.0.ensure_index(keys, options)
    }

    fn drop_index(&self, name: &str) -> Result<(), DbError> {
        self.0.drop_index(name)
    }
}

pub fn is_datetime(v: Option<&Bson>) -> bool {
    matches!(v, Some(Bson::DateTime(_)))
}
