use crate::types::IdKey;
use bson::Document as BsonDocument;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

use super::index_admin::IndexSpec;

/// Records in insertion (natural) order with an `_id` lookup table.
#[derive(Debug, Default)]
pub(crate) struct Records {
    next_seq: u64,
    pub(crate) by_seq: BTreeMap<u64, BsonDocument>,
    pub(crate) by_id: HashMap<IdKey, u64>,
}

impl Records {
    pub(crate) fn push(&mut self, key: IdKey, doc: BsonDocument) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.by_seq.insert(seq, doc);
        self.by_id.insert(key, seq);
    }

    pub(crate) fn remove(&mut self, seq: u64) -> Option<BsonDocument> {
        let doc = self.by_seq.remove(&seq)?;
        if let Some(id) = doc.get(crate::types::ID_FIELD) {
            self.by_id.remove(&IdKey::from_bson(id));
        }
        Some(doc)
    }
}

/// In-memory document collection.
pub struct Collection {
    name: String,
    pub(crate) records: RwLock<Records>,
    pub(crate) indexes: RwLock<BTreeMap<String, IndexSpec>>,
}

impl Collection {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: RwLock::new(Records::default()),
            indexes: RwLock::new(BTreeMap::new()),
        }
    }

    #[must_use]
    pub fn name_str(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().by_seq.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection").field("name", &self.name).field("len", &self.len()).finish()
    }
}
