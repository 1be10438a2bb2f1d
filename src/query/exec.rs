use bson::{Bson, Document as BsonDocument};

use super::eval::{compare_docs, project_fields};
use super::types::{FindOptions, MAX_LIMIT, MAX_PROJECTION_FIELDS, MAX_SORT_FIELDS, UpdateDoc};
use crate::types::ID_FIELD;

/// Applies sort, skip, limit and projection to an already-filtered set.
#[must_use]
pub fn shape_results(mut docs: Vec<BsonDocument>, opts: &FindOptions) -> Vec<BsonDocument> {
    if let Some(sort) = &opts.sort {
        if sort.len() > MAX_SORT_FIELDS {
            log::warn!("sort spec too long: {}", sort.len());
        }
        docs.sort_by(|a, b| compare_docs(a, b, sort));
    }

    let skip = opts.skip.unwrap_or(0);
    // An explicit limit is capped; no limit means every match.
    let limit = opts.limit.map_or(usize::MAX, |n| n.min(MAX_LIMIT));
    let mut docs: Vec<BsonDocument> = docs.into_iter().skip(skip).take(limit).collect();

    if let Some(fields) = &opts.projection {
        let fields: Vec<String> = fields.iter().take(MAX_PROJECTION_FIELDS).cloned().collect();
        for d in &mut docs {
            *d = project_fields(d, &fields, opts.exclude_id);
        }
    } else if opts.exclude_id {
        for d in &mut docs {
            d.remove(ID_FIELD);
        }
    }
    docs
}

/// Applies `upd` to `doc` in place. Returns whether the record changed.
/// Replacement keeps the record's `_id`.
pub fn apply_update(doc: &mut BsonDocument, upd: &UpdateDoc) -> bool {
    fn ensure_subdoc<'a>(root: &'a mut BsonDocument, key: &str) -> &'a mut BsonDocument {
        if !matches!(root.get(key), Some(Bson::Document(_))) {
            root.insert(key.to_string(), Bson::Document(BsonDocument::new()));
        }
        match root.get_mut(key) {
            Some(Bson::Document(d)) => d,
            _ => unreachable!("sub-document inserted above"),
        }
    }
    fn traverse_to_parent<'a>(root: &'a mut BsonDocument, path: &str) -> (&'a mut BsonDocument, String) {
        let mut cur = root;
        let mut iter = path.split('.').peekable();
        let mut last = String::new();
        while let Some(seg) = iter.next() {
            if iter.peek().is_none() {
                last = seg.to_string();
                break;
            }
            cur = ensure_subdoc(cur, seg);
        }
        (cur, last)
    }
    fn set_path(root: &mut BsonDocument, path: &str, value: Bson) -> bool {
        let (parent, last) = traverse_to_parent(root, path);
        let old = parent.insert(last, value.clone());
        old.as_ref() != Some(&value)
    }
    fn unset_path(root: &mut BsonDocument, path: &str) -> bool {
        let (parent, last) = traverse_to_parent(root, path);
        parent.remove(&last).is_some()
    }
    #[allow(clippy::cast_precision_loss)]
    fn inc_path(root: &mut BsonDocument, path: &str, by: f64) -> bool {
        let next = match super::eval::get_path(root, path) {
            Some(Bson::Int32(i)) if by.fract() == 0.0 => i64::from(*i)
                .checked_add(by as i64)
                .and_then(|n| i32::try_from(n).ok())
                .map_or(Bson::Double(f64::from(*i) + by), Bson::Int32),
            Some(Bson::Int64(i)) if by.fract() == 0.0 => {
                i.checked_add(by as i64).map_or(Bson::Double(*i as f64 + by), Bson::Int64)
            }
            Some(Bson::Int32(i)) => Bson::Double(f64::from(*i) + by),
            Some(Bson::Int64(i)) => Bson::Double(*i as f64 + by),
            Some(Bson::Double(f)) => Bson::Double(f + by),
            #[allow(clippy::cast_possible_truncation)]
            None if by.fract() == 0.0 => Bson::Int64(by as i64),
            _ => Bson::Double(by),
        };
        set_path(root, path, next)
    }

    match upd {
        UpdateDoc::Replace(replacement) => {
            let id = doc.get(ID_FIELD).cloned();
            let mut next = replacement.clone();
            next.remove(ID_FIELD);
            let mut out = BsonDocument::new();
            if let Some(id) = id {
                out.insert(ID_FIELD, id);
            }
            out.extend(next);
            let changed = out != *doc;
            *doc = out;
            changed
        }
        UpdateDoc::Ops { set, inc, unset } => {
            let mut changed = false;
            for (k, v) in set {
                changed |= set_path(doc, k, v.clone());
            }
            for (k, by) in inc {
                changed |= inc_path(doc, k, *by);
            }
            for k in unset {
                changed |= unset_path(doc, k);
            }
            changed
        }
    }
}

/// Seed record for an upsert: the plain equality fields of the selector.
#[must_use]
pub fn upsert_seed(selector: &BsonDocument) -> BsonDocument {
    selector
        .iter()
        .filter(|(k, v)| {
            !k.starts_with('$')
                && !k.contains('.')
                && !matches!(v, Bson::Document(d) if d.keys().next().is_some_and(|f| f.starts_with('$')))
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
