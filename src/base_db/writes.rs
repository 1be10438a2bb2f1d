use super::core::BaseDb;
use crate::errors::DbError;
use crate::events::{ChangeAction, ChangeEvent};
use crate::query::{DeleteReport, FindOptions, UpdateOptions, UpdateReport};
use crate::types::ID_FIELD;
use bson::{Bson, Document as BsonDocument, doc};

impl BaseDb {
    fn emit(&self, action: ChangeAction, id: Bson, data: Option<BsonDocument>) {
        self.events.emit(&ChangeEvent { action, collection: self.name.clone(), id, data });
    }

    fn has_listeners(&self) -> bool {
        !self.events.is_empty()
    }

    /// Stamps `_updatedAt`, inserts and emits `Inserted`. Returns the `_id`.
    ///
    /// # Errors
    /// Whatever the collection returns; nothing is emitted on failure.
    pub fn insert(&self, mut record: BsonDocument) -> Result<Bson, DbError> {
        self.set_updated_at(&mut record);
        let id = self.model.insert(record.clone())?;
        if self.has_listeners() {
            record.remove(ID_FIELD);
            let mut data = doc! { "_id": id.clone() };
            data.extend(record);
            self.emit(ChangeAction::Insert, id.clone(), Some(data));
        }
        Ok(id)
    }

    /// Stamps `_updatedAt` on `update` and forwards it. Emits `Updated` for
    /// every record the selector matched beforehand, and `Inserted` for an
    /// upserted record.
    ///
    /// # Errors
    /// Whatever the collection returns; nothing is emitted on failure.
    pub fn update(
        &self,
        selector: &BsonDocument,
        update: &BsonDocument,
        options: &UpdateOptions,
    ) -> Result<UpdateReport, DbError> {
        let mut update = update.clone();
        self.set_updated_at(&mut update);

        let affected: Vec<Bson> = if self.has_listeners() {
            let opts = FindOptions { limit: (!options.multi).then_some(1), ..FindOptions::ids_only() };
            self.model.find(selector, &opts)?.filter_map(|d| d.get(ID_FIELD).cloned()).collect()
        } else {
            Vec::new()
        };

        let report = self.model.update(selector, &update, options)?;

        for id in affected {
            let data = self.find_one_by_id(id.clone(), &FindOptions::default())?;
            self.emit(ChangeAction::Update, id, data);
        }
        if let Some(id) = &report.upserted_id
            && self.has_listeners()
        {
            let data = self.find_one_by_id(id.clone(), &FindOptions::default())?;
            self.emit(ChangeAction::Insert, id.clone(), data);
        }
        Ok(report)
    }

    /// `update` with `upsert` set.
    ///
    /// # Errors
    /// Whatever the collection returns.
    pub fn upsert(&self, selector: &BsonDocument, update: &BsonDocument) -> Result<UpdateReport, DbError> {
        self.update(selector, update, &UpdateOptions { multi: false, upsert: true })
    }

    /// Copies every matching record into the trash (when attached), removes
    /// them, and emits `Removed` per record.
    ///
    /// # Errors
    /// Whatever the collection or the trash returns. A trash failure aborts
    /// before anything is removed; a failed removal takes the fresh trash
    /// copies back out.
    pub fn remove(&self, selector: &BsonDocument) -> Result<DeleteReport, DbError> {
        let doomed: Vec<BsonDocument> = if self.trash.is_some() || self.has_listeners() {
            self.model.find(selector, &FindOptions::default())?.to_vec()
        } else {
            Vec::new()
        };

        if let Some(trash) = &self.trash {
            for (done, record) in doomed.iter().enumerate() {
                if let Err(e) = self.move_to_trash(trash.as_ref(), record) {
                    self.discard_from_trash(trash.as_ref(), &doomed[..done]);
                    return Err(e);
                }
            }
        }

        let report = match self.model.remove(selector) {
            Ok(report) => report,
            Err(e) => {
                if let Some(trash) = &self.trash {
                    self.discard_from_trash(trash.as_ref(), &doomed);
                }
                return Err(e);
            }
        };

        for record in doomed {
            if let Some(id) = record.get(ID_FIELD).cloned() {
                self.emit(ChangeAction::Remove, id, Some(record));
            }
        }
        Ok(report)
    }
}
