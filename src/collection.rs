mod core;
mod index_admin;
mod ops;
mod store;

pub use self::core::Collection;
pub use index_admin::{ID_INDEX, IndexSpec, default_index_name};
pub use store::Store;
