pub mod base_db;
pub mod collection;
pub mod config;
pub mod engine;
pub mod errors;
pub mod events;
pub mod query;
pub mod types;
pub mod utils;

pub use base_db::{BaseDb, BaseModel};
pub use collection::{Collection, Store};
pub use config::ModelsConfig;
pub use engine::Engine;
pub use errors::DbError;
pub use events::{ChangeAction, ChangeEvent, EventKind, ListenerId};
pub use utils::logger;

/// Initializes logging from the `CHATMODELS_LOG_*` environment variables.
///
/// Call once at startup, before opening any model.
///
/// # Errors
/// Returns an error if the log directory cannot be created or a logger is
/// already installed.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    logger::configure_from_env()
}
