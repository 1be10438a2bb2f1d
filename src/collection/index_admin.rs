use super::core::{Collection, Records};
use crate::errors::DbError;
use crate::query::IndexOptions;
use crate::types::{ID_FIELD, IdKey};
use bson::{Bson, Document as BsonDocument};
use serde::{Deserialize, Serialize};

/// Name of the implicit primary-key index.
pub const ID_INDEX: &str = "_id_";

/// A secondary index definition. Only `unique` indexes constrain writes; the
/// rest are kept so callers can inspect what was declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub name: String,
    pub keys: Vec<(String, i32)>,
    pub unique: bool,
    pub sparse: bool,
}

impl IndexSpec {
    /// # Errors
    /// Returns `IndexError` for an empty key document or non-`1`/`-1` directions.
    pub fn from_keys(keys: &BsonDocument, options: &IndexOptions) -> Result<Self, DbError> {
        if keys.is_empty() {
            return Err(DbError::IndexError("index keys must not be empty".into()));
        }
        let mut parsed = Vec::with_capacity(keys.len());
        for (field, dir) in keys {
            let d = match dir {
                Bson::Int32(i) => i64::from(*i),
                Bson::Int64(i) => *i,
                #[allow(clippy::cast_possible_truncation)]
                Bson::Double(f) if f.fract() == 0.0 => *f as i64,
                other => {
                    return Err(DbError::IndexError(format!("unsupported direction for {field}: {other}")));
                }
            };
            let d = match d {
                1 => 1,
                -1 => -1,
                _ => return Err(DbError::IndexError(format!("direction for {field} must be 1 or -1"))),
            };
            parsed.push((field.clone(), d));
        }
        let name = options.name.clone().unwrap_or_else(|| default_index_name(&parsed));
        Ok(Self { name, keys: parsed, unique: options.unique, sparse: options.sparse })
    }

    /// Key tuple for uniqueness checks; `None` when a sparse index skips the record.
    pub(crate) fn key_of(&self, doc: &BsonDocument) -> Option<IdKey> {
        let values: Vec<Option<&Bson>> =
            self.keys.iter().map(|(f, _)| crate::query::get_path(doc, f)).collect();
        if self.sparse && values.iter().all(Option::is_none) {
            return None;
        }
        let tuple = values.into_iter().map(|v| v.cloned().unwrap_or(Bson::Null)).collect();
        Some(IdKey::from_bson(&Bson::Array(tuple)))
    }
}

/// Mongo-style default name: `field_1`, `a_1_b_-1`.
#[must_use]
pub fn default_index_name(keys: &[(String, i32)]) -> String {
    keys.iter().map(|(f, d)| format!("{f}_{d}")).collect::<Vec<_>>().join("_")
}

impl Collection {
    pub(crate) fn create_index(&self, spec: IndexSpec) -> Result<String, DbError> {
        if spec.name == ID_INDEX {
            return Ok(spec.name);
        }
        let records = self.records.read();
        let mut indexes = self.indexes.write();
        if let Some(existing) = indexes.get(&spec.name) {
            if *existing == spec {
                return Ok(spec.name);
            }
            return Err(DbError::IndexError(format!(
                "index {} already exists with a different definition",
                spec.name
            )));
        }
        if spec.unique {
            let mut seen = std::collections::HashSet::new();
            for doc in records.by_seq.values() {
                if let Some(k) = spec.key_of(doc)
                    && !seen.insert(k.clone())
                {
                    return Err(self.duplicate(&spec.name, &k));
                }
            }
        }
        let name = spec.name.clone();
        log::info!("collection {}: created index {name}", self.name_str());
        indexes.insert(name.clone(), spec);
        Ok(name)
    }

    pub(crate) fn remove_index(&self, name: &str) -> Result<(), DbError> {
        if name == ID_INDEX {
            return Err(DbError::IndexError("cannot drop the _id index".into()));
        }
        self.indexes
            .write()
            .remove(name)
            .map(|_| log::info!("collection {}: dropped index {name}", self.name_str()))
            .ok_or_else(|| DbError::IndexError(format!("index not found: {name}")))
    }

    /// Rejects `candidate` if its `_id` or any unique key is held by a
    /// record other than `self_seq`.
    pub(crate) fn check_unique(
        &self,
        records: &Records,
        candidate: &BsonDocument,
        self_seq: Option<u64>,
    ) -> Result<(), DbError> {
        if let Some(id) = candidate.get(ID_FIELD) {
            let key = IdKey::from_bson(id);
            if let Some(seq) = records.by_id.get(&key)
                && Some(*seq) != self_seq
            {
                return Err(self.duplicate(ID_INDEX, &key));
            }
        }
        for spec in self.indexes.read().values().filter(|s| s.unique) {
            let Some(key) = spec.key_of(candidate) else { continue };
            let clash = records
                .by_seq
                .iter()
                .any(|(seq, doc)| Some(*seq) != self_seq && spec.key_of(doc).as_ref() == Some(&key));
            if clash {
                return Err(self.duplicate(&spec.name, &key));
            }
        }
        Ok(())
    }

    fn duplicate(&self, index: &str, key: &IdKey) -> DbError {
        DbError::DuplicateKey {
            collection: self.name_str().to_string(),
            index: index.to_string(),
            key: key.as_str().to_string(),
        }
    }

    /// Declared indexes including the implicit `_id_`.
    #[must_use]
    pub fn list_indexes(&self) -> Vec<IndexSpec> {
        let mut out = vec![IndexSpec {
            name: ID_INDEX.to_string(),
            keys: vec![(ID_FIELD.to_string(), 1)],
            unique: true,
            sparse: false,
        }];
        out.extend(self.indexes.read().values().cloned());
        out
    }
}
