//! The base model: a thin wrapper over a [`Store`](crate::collection::Store)
//! that names collections, stamps `_updatedAt`, keeps a trash copy of removed
//! records and notifies listeners about changes.

mod core;
mod index_admin;
mod reads;
mod trash;
mod writes;

pub use self::core::{BaseDb, BaseModel};
pub use trash::{COLLECTION_FIELD, DELETED_AT_FIELD};
