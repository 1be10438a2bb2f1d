mod common;

use bson::{Bson, doc};
use chatmodels::query::{FindOptions, IndexOptions};
use chatmodels::{BaseDb, BaseModel, Engine, ModelsConfig, Store};
use common::{Call, SpyStore, is_datetime};
use std::sync::Arc;

#[derive(Debug, PartialEq)]
struct UserHooks {
    tag: &'static str,
}

#[test]
fn open_by_name_sets_names() {
    let engine = Engine::new();
    let db = BaseDb::open_by_name(&engine, "user", None);
    assert_eq!(db.name(), "user");
    assert_eq!(db.collection_name(), "rocketchat_user");
}

#[test]
fn open_by_name_creates_collection_in_engine() {
    let engine = Engine::new();
    let db = BaseDb::open_by_name(&engine, "user", None);
    let col = engine.get_collection("rocketchat_user").expect("collection registered");
    assert_eq!(Arc::as_ptr(db.model()).cast::<()>(), Arc::as_ptr(&col).cast::<()>());
    assert_eq!(db.model().name(), "rocketchat_user");
}

#[test]
fn open_by_name_reuses_existing_collection() {
    let engine = Engine::new();
    let a = BaseDb::open_by_name(&engine, "room", None);
    let b = BaseDb::open_by_name(&engine, "room", None);
    assert_eq!(Arc::as_ptr(a.model()).cast::<()>(), Arc::as_ptr(b.model()).cast::<()>());
}

#[test]
fn open_by_name_indexes_updated_at() {
    let engine = Engine::new();
    let db = BaseDb::open_by_name(&engine, "user", None);
    let specs = db.model().index_specs();
    assert!(specs.iter().any(|s| s.name == "_updatedAt_1" && s.keys == vec![("_updatedAt".to_string(), 1)]));
}

#[test]
fn base_model_is_stored_verbatim() {
    let engine = Engine::new();
    let hooks: BaseModel = Arc::new(UserHooks { tag: "users" });
    let db = BaseDb::open_by_name(&engine, "user", Some(hooks.clone()));
    assert!(Arc::ptr_eq(db.base_model().unwrap(), &hooks));
    assert_eq!(db.base_model_as::<UserHooks>(), Some(&UserHooks { tag: "users" }));
    assert!(db.base_model_as::<String>().is_none());
}

#[test]
fn base_model_defaults_to_none() {
    let engine = Engine::new();
    let db = BaseDb::open_by_name(&engine, "message", None);
    assert!(db.base_model().is_none());
}

#[test]
fn custom_prefix_is_applied() {
    let engine = Engine::new();
    let cfg = ModelsConfig { collection_prefix: "chat_".into(), ..ModelsConfig::default() };
    let db = BaseDb::open_by_name_with(&engine, "user", None, &cfg);
    assert_eq!(db.collection_name(), "chat_user");
    assert!(engine.get_collection("chat_user").is_some());
}

#[test]
fn raw_model_bypasses_timestamping() {
    let engine = Engine::new();
    let db = BaseDb::open_by_name(&engine, "user", None);
    db.model().insert(doc! {"_id": "raw", "n": 1}).unwrap();
    let rec = db.find_one_by_id("raw", &FindOptions::default()).unwrap().unwrap();
    assert!(rec.get("_updatedAt").is_none());
}

#[test]
fn wrap_existing_ensures_updated_at_index_once() {
    let spy = SpyStore::new("rocketchat_user");
    let _db = BaseDb::wrap_existing(spy.clone());
    assert_eq!(spy.index_calls(), vec![Call::EnsureIndex(doc! {"_updatedAt": 1}, IndexOptions::default())]);
}

#[test]
fn wrap_existing_derives_names_from_handle() {
    let spy = SpyStore::new("rocketchat_user");
    let db = BaseDb::wrap_existing(spy.clone());
    assert_eq!(db.name(), "user");
    assert_eq!(db.collection_name(), "rocketchat_user");

    let foreign = SpyStore::new("legacy_things");
    let db = BaseDb::wrap_existing(foreign);
    assert_eq!(db.name(), "legacy_things");
    assert_eq!(db.collection_name(), "legacy_things");
}

#[test]
fn wrap_existing_survives_index_failure() {
    let spy = SpyStore::failing_index("rocketchat_user");
    let db = BaseDb::wrap_existing(spy.clone());
    assert_eq!(spy.index_calls().len(), 1);
    assert!(!db.try_drop_index("_updatedAt_1"));
}

#[test]
fn set_updated_at_on_plain_record() {
    let db = BaseDb::open_by_name(&Engine::new(), "message", None);
    let mut record = doc! {};
    let returned: *const _ = db.set_updated_at(&mut record);
    assert!(is_datetime(record.get("_updatedAt")));
    assert!(std::ptr::eq(returned, &record));
}

#[test]
fn set_updated_at_on_operator_update() {
    let db = BaseDb::open_by_name(&Engine::new(), "message", None);
    let mut record = doc! {"$key": "foo", "key": "bar"};
    db.set_updated_at(&mut record);
    let set = record.get_document("$set").expect("$set added");
    assert!(is_datetime(set.get("_updatedAt")));
    assert_eq!(record.get_str("$key").unwrap(), "foo");
    assert_eq!(record.get_str("key").unwrap(), "bar");
    assert!(record.get("_updatedAt").is_none());
}

#[test]
fn set_updated_at_keeps_existing_set_fields() {
    let db = BaseDb::open_by_name(&Engine::new(), "message", None);
    let mut record = doc! {"$set": {"msg": "hi"}, "$inc": {"n": 1}};
    db.set_updated_at(&mut record);
    let set = record.get_document("$set").unwrap();
    assert_eq!(set.get_str("msg").unwrap(), "hi");
    assert!(is_datetime(set.get("_updatedAt")));
}

#[test]
fn set_updated_at_replaces_non_document_set() {
    let db = BaseDb::open_by_name(&Engine::new(), "message", None);
    let mut record = doc! {"$set": 5};
    db.set_updated_at(&mut record);
    assert!(is_datetime(record.get_document("$set").unwrap().get("_updatedAt")));
}

#[test]
fn find_forwards_arguments() {
    let spy = SpyStore::new("rocketchat_user");
    let db = BaseDb::wrap_existing(spy.clone());
    spy.clear();
    let opts = FindOptions::limit(2);
    db.find(&doc! {"foo": "bar"}, &opts).unwrap();
    assert_eq!(spy.calls(), vec![Call::Find(doc! {"foo": "bar"}, opts)]);
}

#[test]
fn find_one_forwards_arguments() {
    let spy = SpyStore::new("rocketchat_user");
    let db = BaseDb::wrap_existing(spy.clone());
    spy.clear();
    let opts = FindOptions::limit(2);
    db.find_one(&doc! {"foo": "bar"}, &opts).unwrap();
    assert_eq!(spy.calls(), vec![Call::FindOne(doc! {"foo": "bar"}, opts)]);
}

#[test]
fn find_one_by_id_builds_id_selector() {
    let spy = SpyStore::new("rocketchat_user");
    let db = BaseDb::wrap_existing(spy.clone());
    spy.clear();
    db.find_one_by_id(1, &FindOptions::default()).unwrap();
    assert_eq!(spy.calls(), vec![Call::FindOne(doc! {"_id": 1}, FindOptions::default())]);
}

#[test]
fn find_one_by_ids_builds_in_selector() {
    let spy = SpyStore::new("rocketchat_user");
    let db = BaseDb::wrap_existing(spy.clone());
    spy.clear();
    db.find_one_by_ids([1, 2, 3], &FindOptions::default()).unwrap();
    assert_eq!(spy.calls(), vec![Call::FindOne(doc! {"_id": {"$in": [1, 2, 3]}}, FindOptions::default())]);
}

#[test]
fn find_by_ids_builds_in_selector() {
    let spy = SpyStore::new("rocketchat_user");
    let db = BaseDb::wrap_existing(spy.clone());
    spy.clear();
    db.find_by_ids(vec!["a", "b"], &FindOptions::default()).unwrap();
    assert_eq!(spy.calls(), vec![Call::Find(doc! {"_id": {"$in": ["a", "b"]}}, FindOptions::default())]);
}

#[test]
fn by_id_lookups_against_real_collection() {
    let engine = Engine::new();
    let db = BaseDb::open_by_name(&engine, "user", None);
    for (id, name) in [(1, "ann"), (2, "bob"), (3, "cy")] {
        db.insert(doc! {"_id": id, "name": name}).unwrap();
    }
    let one = db.find_one_by_id(2, &FindOptions::default()).unwrap().unwrap();
    assert_eq!(one.get_str("name").unwrap(), "bob");
    assert!(db.find_one_by_id(9, &FindOptions::default()).unwrap().is_none());

    let any = db.find_one_by_ids([9, 3], &FindOptions::default()).unwrap().unwrap();
    assert_eq!(any.get("_id"), Some(&Bson::Int32(3)));
    assert_eq!(db.find_by_ids([1, 3, 7], &FindOptions::default()).unwrap().total(), 2);
}

#[test]
fn index_admin_forwards() {
    let spy = SpyStore::new("rocketchat_user");
    let db = BaseDb::wrap_existing(spy.clone());
    spy.clear();
    let opts = IndexOptions { unique: true, ..IndexOptions::default() };
    db.ensure_index(&doc! {"username": 1}, &opts).unwrap();
    assert!(db.try_drop_index("username_1"));
    assert_eq!(
        spy.calls(),
        vec![Call::EnsureIndex(doc! {"username": 1}, opts), Call::DropIndex("username_1".into())]
    );
}

#[test]
fn by_ids_lookups_see_the_whole_id_set() {
    let engine = Engine::new();
    let db = BaseDb::open_by_name(&engine, "user", None);
    for i in 0..1200 {
        db.insert(doc! {"_id": i}).unwrap();
    }
    assert_eq!(db.find_by_ids(0..1200, &FindOptions::default()).unwrap().total(), 1200);
    let last = db.find_one_by_ids([5000, 1199], &FindOptions::default()).unwrap().unwrap();
    assert_eq!(last.get_i32("_id").unwrap(), 1199);

    let names: Vec<String> = (0..1500).map(|i| format!("u{i}")).collect();
    for n in &names[..1300] {
        db.insert(doc! {"_id": n.as_str()}).unwrap();
    }
    assert_eq!(db.find_by_ids(names.clone(), &FindOptions::default()).unwrap().total(), 1300);
}

#[test]
fn large_integer_ids_stay_distinct() {
    let engine = Engine::new();
    let db = BaseDb::open_by_name(&engine, "user", None);
    let a = 1_i64 << 53;
    let b = a + 1;
    db.insert(doc! {"_id": a, "who": "a"}).unwrap();
    db.insert(doc! {"_id": b, "who": "b"}).unwrap();

    let found = db.find_one_by_id(b, &FindOptions::default()).unwrap().unwrap();
    assert_eq!(found.get_str("who").unwrap(), "b");
    assert_eq!(db.find_by_ids([a], &FindOptions::default()).unwrap().total(), 1);

    assert_eq!(db.remove(&doc! {"_id": b}).unwrap().deleted, 1);
    assert_eq!(db.find_one_by_id(a, &FindOptions::default()).unwrap().unwrap().get_str("who").unwrap(), "a");
}
