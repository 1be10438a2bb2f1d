use bson::{Bson, Document, doc};
use chatmodels::query::{FindOptions, Order, SortSpec, eval_filter, parse_selector};
use chatmodels::{Collection, Store};

fn matches(record: &Document, selector: &Document) -> bool {
    eval_filter(record, &parse_selector(selector).unwrap())
}

fn sample() -> Collection {
    let c = Collection::new("rocketchat_message");
    c.insert(doc! {"_id": "a", "rid": "GENERAL", "ts": 3, "u": {"username": "ann"}, "tags": ["x", "y"]}).unwrap();
    c.insert(doc! {"_id": "b", "rid": "GENERAL", "ts": 1, "u": {"username": "bob"}}).unwrap();
    c.insert(doc! {"_id": "c", "rid": "random", "ts": 2, "u": {"username": "ann"}, "t": "uj"}).unwrap();
    c
}

fn ids(c: &Collection, selector: Document, opts: &FindOptions) -> Vec<String> {
    c.find(&selector, opts)
        .unwrap()
        .map(|d| d.get_str("_id").unwrap().to_string())
        .collect()
}

#[test]
fn comparison_operators() {
    let r = doc! {"n": 5, "s": "m"};
    assert!(matches(&r, &doc! {"n": {"$gt": 4, "$lte": 5}}));
    assert!(!matches(&r, &doc! {"n": {"$lt": 5}}));
    assert!(matches(&r, &doc! {"n": 5.0}));
    assert!(matches(&r, &doc! {"s": {"$gte": "a"}}));
    // values of different types never compare by range
    assert!(!matches(&r, &doc! {"s": {"$gt": 1}}));
    assert!(matches(&r, &doc! {"n": {"$ne": 4}}));
    assert!(!matches(&r, &doc! {"n": {"$not": {"$gt": 1}}}));
}

#[test]
fn null_and_exists() {
    let r = doc! {"a": 1, "b": Bson::Null};
    assert!(matches(&r, &doc! {"missing": Bson::Null}));
    assert!(matches(&r, &doc! {"b": Bson::Null}));
    assert!(matches(&r, &doc! {"b": {"$exists": true}}));
    assert!(matches(&r, &doc! {"missing": {"$exists": false}}));
    assert!(!matches(&r, &doc! {"a": {"$exists": 0}}));
    assert!(!matches(&r, &doc! {"missing": {"$ne": Bson::Null}}));
}

#[test]
fn arrays_fan_out() {
    let r = doc! {"tags": ["x", "y"]};
    assert!(matches(&r, &doc! {"tags": "y"}));
    assert!(matches(&r, &doc! {"tags": {"$in": ["q", "x"]}}));
    assert!(matches(&r, &doc! {"tags": {"$nin": ["q"]}}));
    assert!(!matches(&r, &doc! {"tags": {"$nin": ["x"]}}));
    assert!(matches(&r, &doc! {"tags": ["x", "y"]}));
    assert!(!matches(&r, &doc! {"tags": ["y", "x"]}));
}

#[test]
fn logical_operators() {
    let r = doc! {"a": 1, "b": 2};
    assert!(matches(&r, &doc! {"$or": [{"a": 9}, {"b": 2}]}));
    assert!(matches(&r, &doc! {"$and": [{"a": 1}, {"b": 2}]}));
    assert!(!matches(&r, &doc! {"$nor": [{"a": 1}]}));
    assert!(parse_selector(&doc! {"$or": {"a": 1}}).is_err());
    assert!(parse_selector(&doc! {"$and": [1]}).is_err());
}

#[test]
fn dotted_paths() {
    let c = sample();
    assert_eq!(ids(&c, doc! {"u.username": "ann"}, &FindOptions::default()), vec!["a", "c"]);
    assert!(ids(&c, doc! {"u.username.first": "ann"}, &FindOptions::default()).is_empty());
}

#[test]
fn natural_order_then_sort_skip_limit() {
    let c = sample();
    assert_eq!(ids(&c, doc! {}, &FindOptions::default()), vec!["a", "b", "c"]);
    let by_ts = FindOptions { sort: Some(vec![SortSpec { field: "ts".into(), order: Order::Desc }]), ..FindOptions::default() };
    assert_eq!(ids(&c, doc! {}, &by_ts), vec!["a", "c", "b"]);
    let page = FindOptions { skip: Some(1), limit: Some(1), ..by_ts };
    assert_eq!(ids(&c, doc! {}, &page), vec!["c"]);
}

#[test]
fn sort_puts_missing_fields_first() {
    let c = sample();
    let opts = FindOptions { sort: Some(vec![SortSpec { field: "t".into(), order: Order::Asc }]), ..FindOptions::default() };
    assert_eq!(ids(&c, doc! {}, &opts), vec!["a", "b", "c"]);
}

#[test]
fn projection_from_options_document() {
    let c = sample();
    let opts = FindOptions::from_document(&doc! {"fields": {"rid": 1}, "sort": {"ts": 1}}).unwrap();
    let docs = c.find(&doc! {"rid": "GENERAL"}, &opts).unwrap().to_vec();
    assert_eq!(docs, vec![doc! {"_id": "b", "rid": "GENERAL"}, doc! {"_id": "a", "rid": "GENERAL"}]);

    let no_id = FindOptions::from_document(&doc! {"fields": {"_id": 0}}).unwrap();
    let first = c.find_one(&doc! {"_id": "c"}, &no_id).unwrap().unwrap();
    assert!(first.get("_id").is_none());
    assert_eq!(first.get_str("t").unwrap(), "uj");

    assert!(FindOptions::from_document(&doc! {"hint": 1}).is_err());
    assert!(FindOptions::from_document(&doc! {"limit": -1}).is_err());
}

#[test]
fn cursor_tracks_position() {
    let c = sample();
    let mut cur = c.find(&doc! {}, &FindOptions::default()).unwrap();
    assert_eq!(cur.total(), 3);
    cur.next();
    assert_eq!(cur.total(), 3);
    assert_eq!(cur.to_vec().len(), 2);
}

#[test]
fn bad_selectors_surface_as_errors() {
    let c = sample();
    assert!(c.find(&doc! {"ts": {"$near": 1}}, &FindOptions::default()).is_err());
    assert!(c.remove(&doc! {"$where": "1"}).is_err());
    assert_eq!(c.len(), 3);
}

#[cfg(feature = "regex")]
#[test]
fn regex_operator() {
    let r = doc! {"username": "Rocket.Cat"};
    assert!(matches(&r, &doc! {"username": {"$regex": "^rocket", "$options": "i"}}));
    assert!(!matches(&r, &doc! {"username": {"$regex": "^rocket"}}));
}

#[test]
fn integers_compare_exactly() {
    let big = 1_i64 << 53;
    let r = doc! {"n": big + 1};
    assert!(!matches(&r, &doc! {"n": big}));
    assert!(matches(&r, &doc! {"n": {"$gt": big}}));
    assert!(matches(&r, &doc! {"n": {"$in": [big, big + 1]}}));
    assert!(matches(&doc! {"n": 7}, &doc! {"n": 7_i64}));
    assert!(matches(&doc! {"n": 7}, &doc! {"n": 7.0}));
}
