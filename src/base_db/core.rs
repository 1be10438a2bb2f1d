use crate::collection::Store;
use crate::config::ModelsConfig;
use crate::engine::Engine;
use crate::events::{ChangeEvent, EventBus, EventKind, ListenerId};
use crate::types::UPDATED_AT_FIELD;
use bson::{Bson, Document as BsonDocument, doc};
use std::any::Any;
use std::sync::Arc;

/// Opaque value attached to a model at construction and handed back as-is.
pub type BaseModel = Arc<dyn Any + Send + Sync>;

pub struct BaseDb {
    pub(super) name: String,
    pub(super) collection_name: String,
    pub(super) model: Arc<dyn Store>,
    pub(super) base_model: Option<BaseModel>,
    pub(super) trash: Option<Arc<dyn Store>>,
    pub(super) events: EventBus,
}

impl std::fmt::Debug for BaseDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseDb")
            .field("name", &self.name)
            .field("collection_name", &self.collection_name)
            .field("trash", &self.trash.as_ref().map(|t| t.name()))
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl BaseDb {
    /// Opens the model `name` on `engine` with the default configuration.
    #[must_use]
    pub fn open_by_name(engine: &Engine, name: &str, base_model: Option<BaseModel>) -> Self {
        Self::open_by_name_with(engine, name, base_model, &ModelsConfig::default())
    }

    /// Opens (creating if needed) the collection `config.collection_prefix + name`.
    #[must_use]
    pub fn open_by_name_with(
        engine: &Engine,
        name: &str,
        base_model: Option<BaseModel>,
        config: &ModelsConfig,
    ) -> Self {
        let collection_name = config.collection_name(name);
        let model: Arc<dyn Store> = engine.create_collection(collection_name.as_str());
        let trash = config
            .track_trash
            .then(|| engine.create_collection(config.trash_collection.as_str()) as Arc<dyn Store>);
        let db = Self {
            name: name.to_string(),
            collection_name,
            model,
            base_model,
            trash,
            events: EventBus::new(),
        };
        db.try_ensure_index(&doc! { "_updatedAt": 1 });
        log::debug!("model {} opened on {}", db.name, db.collection_name);
        db
    }

    /// Wraps an existing collection handle with the default configuration.
    #[must_use]
    pub fn wrap_existing(model: Arc<dyn Store>) -> Self {
        Self::wrap_existing_with(model, &ModelsConfig::default())
    }

    /// Wraps `model` as-is. The collection name is the handle's own name; the
    /// logical name is that name without the configured prefix. No trash is
    /// attached; see [`with_trash`](Self::with_trash).
    #[must_use]
    pub fn wrap_existing_with(model: Arc<dyn Store>, config: &ModelsConfig) -> Self {
        let collection_name = model.name();
        let name = collection_name
            .strip_prefix(config.collection_prefix.as_str())
            .unwrap_or(&collection_name)
            .to_string();
        let db = Self { name, collection_name, model, base_model: None, trash: None, events: EventBus::new() };
        db.try_ensure_index(&doc! { "_updatedAt": 1 });
        log::debug!("model {} wraps {}", db.name, db.collection_name);
        db
    }

    #[must_use]
    pub fn with_base_model(mut self, base_model: BaseModel) -> Self {
        self.base_model = Some(base_model);
        self
    }

    #[must_use]
    pub fn with_trash(mut self, trash: Arc<dyn Store>) -> Self {
        self.trash = Some(trash);
        self
    }

    /// Logical model name, e.g. `user`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Physical collection name, e.g. `rocketchat_user`.
    #[must_use]
    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// The unwrapped collection handle. Writes made through it skip
    /// timestamping, trash and events.
    #[must_use]
    pub fn model(&self) -> &Arc<dyn Store> {
        &self.model
    }

    #[must_use]
    pub fn trash(&self) -> Option<&Arc<dyn Store>> {
        self.trash.as_ref()
    }

    #[must_use]
    pub fn base_model(&self) -> Option<&BaseModel> {
        self.base_model.as_ref()
    }

    #[must_use]
    pub fn base_model_as<T: Any>(&self) -> Option<&T> {
        self.base_model.as_deref().and_then(|m| m.downcast_ref::<T>())
    }

    /// Stamps the current time as `_updatedAt`: on the record itself for a
    /// plain record, inside `$set` for an operator update. Returns `record`.
    pub fn set_updated_at<'a>(&self, record: &'a mut BsonDocument) -> &'a mut BsonDocument {
        let now = Bson::DateTime(bson::DateTime::now());
        if !record.keys().any(|k| k.starts_with('$')) {
            record.insert(UPDATED_AT_FIELD, now);
            return record;
        }
        if !matches!(record.get("$set"), Some(Bson::Document(_))) {
            record.insert("$set", BsonDocument::new());
        }
        if let Ok(set) = record.get_document_mut("$set") {
            set.insert(UPDATED_AT_FIELD, now);
        }
        record
    }

    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn on<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.events.on(kind, listener)
    }

    pub fn once<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.events.once(kind, listener)
    }

    pub fn off(&self, id: ListenerId) -> bool {
        self.events.off(id)
    }
}
