use bson::Bson;
use uuid::Uuid;

pub type CollectionName = String;

/// Name of the primary key field of every record.
pub const ID_FIELD: &str = "_id";

/// Field stamped with the last write time.
pub const UPDATED_AT_FIELD: &str = "_updatedAt";

/// Hashable, totally ordered form of an `_id` value.
///
/// `Bson` is neither `Hash` nor `Ord`, so records are keyed by the canonical
/// extended-JSON rendering of their id. Two ids are the same key only when
/// they have the same BSON type and value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdKey(String);

impl IdKey {
    #[must_use]
    pub fn from_bson(id: &Bson) -> Self {
        Self(id.clone().into_canonical_extjson().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Generates a fresh string id for records inserted without `_id`.
#[must_use]
pub fn generate_id() -> Bson {
    Bson::String(Uuid::new_v4().simple().to_string())
}
