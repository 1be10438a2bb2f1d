use super::core::{Collection, Records};
use super::index_admin::IndexSpec;
use super::store::Store;
use crate::errors::DbError;
use crate::query::{
    CmpOp, Cursor, DeleteReport, Filter, FindOptions, IndexOptions, UpdateDoc, UpdateOptions, UpdateReport,
    apply_update, eval_filter, parse_selector, parse_update, shape_results, upsert_seed,
};
use crate::types::{ID_FIELD, IdKey, generate_id};
use crate::utils::logger::log_audit;
use bson::{Bson, Document as BsonDocument};
use std::collections::BTreeSet;

/// `_id` values pinned by an `{_id: v}` or `{_id: {$in: [..]}}` clause, when
/// every value is keyed exactly (strings and object ids). Numbers match across
/// BSON types, so they always take the scan.
fn pinned_ids(filter: &Filter) -> Option<Vec<&Bson>> {
    fn exact(vals: Vec<&Bson>) -> Option<Vec<&Bson>> {
        vals.iter().all(|v| matches!(v, Bson::String(_) | Bson::ObjectId(_))).then_some(vals)
    }
    match filter {
        Filter::Cmp { path, op: CmpOp::Eq, value } if path == ID_FIELD => exact(vec![value]),
        Filter::In { path, values } if path == ID_FIELD => exact(values.iter().collect()),
        Filter::And(clauses) => clauses.iter().find_map(pinned_ids),
        _ => None,
    }
}

impl Collection {
    /// Sequence numbers of matching records, in natural order.
    fn matching_seqs(&self, records: &Records, filter: &Filter, first_only: bool) -> Vec<u64> {
        let limit = if first_only { 1 } else { usize::MAX };
        match pinned_ids(filter) {
            Some(ids) => {
                let seqs: BTreeSet<u64> =
                    ids.into_iter().filter_map(|id| records.by_id.get(&IdKey::from_bson(id)).copied()).collect();
                seqs.into_iter()
                    .filter(|s| records.by_seq.get(s).is_some_and(|d| eval_filter(d, filter)))
                    .take(limit)
                    .collect()
            }
            None => records
                .by_seq
                .iter()
                .filter(|(_, d)| eval_filter(d, filter))
                .map(|(s, _)| *s)
                .take(limit)
                .collect(),
        }
    }

    /// Puts `_id` first, generating one when missing.
    fn with_id(mut record: BsonDocument) -> Result<(Bson, BsonDocument), DbError> {
        let id = record.remove(ID_FIELD).unwrap_or_else(generate_id);
        if matches!(id, Bson::Array(_)) {
            return Err(DbError::QueryError("_id cannot be an array".into()));
        }
        let mut out = BsonDocument::new();
        out.insert(ID_FIELD, id.clone());
        out.extend(record);
        Ok((id, out))
    }
}

impl Store for Collection {
    fn name(&self) -> String {
        self.name_str().to_string()
    }

    fn find(&self, selector: &BsonDocument, options: &FindOptions) -> Result<Cursor, DbError> {
        let filter = parse_selector(selector)?;
        let bench_start = std::time::Instant::now();
        let matched: Vec<BsonDocument> = {
            let records = self.records.read();
            self.matching_seqs(&records, &filter, false)
                .into_iter()
                .filter_map(|s| records.by_seq.get(&s).cloned())
                .collect()
        };
        let docs = shape_results(matched, options);
        crate::model_trace!(
            "{{\"bench\":\"query\",\"op\":\"find\",\"collection\":\"{}\",\"duration_us\":{},\"result_count\":{},\"limit\":{},\"skip\":{}}}",
            self.name_str(),
            bench_start.elapsed().as_micros(),
            docs.len(),
            options.limit.unwrap_or(0),
            options.skip.unwrap_or(0)
        );
        Ok(Cursor::new(docs))
    }

    fn find_one(&self, selector: &BsonDocument, options: &FindOptions) -> Result<Option<BsonDocument>, DbError> {
        let opts = FindOptions { limit: Some(1), ..options.clone() };
        Ok(self.find(selector, &opts)?.next())
    }

    fn insert(&self, record: BsonDocument) -> Result<Bson, DbError> {
        let (id, record) = Self::with_id(record)?;
        {
            let mut records = self.records.write();
            self.check_unique(&records, &record, None)?;
            records.push(IdKey::from_bson(&id), record);
        }
        log_audit("insert", self.name_str(), &id);
        Ok(id)
    }

    fn update(
        &self,
        selector: &BsonDocument,
        update: &BsonDocument,
        options: &UpdateOptions,
    ) -> Result<UpdateReport, DbError> {
        let filter = parse_selector(selector)?;
        let upd = parse_update(update)?;
        if matches!(upd, UpdateDoc::Replace(_)) && options.multi {
            return Err(DbError::QueryError("multi update requires update operators".into()));
        }
        let mut report = UpdateReport::default();
        let mut touched = Vec::new();
        {
            let mut records = self.records.write();
            for seq in self.matching_seqs(&records, &filter, !options.multi) {
                report.matched += 1;
                let Some(mut next) = records.by_seq.get(&seq).cloned() else { continue };
                let before_id = next.get(ID_FIELD).cloned();
                if !apply_update(&mut next, &upd) {
                    continue;
                }
                if next.get(ID_FIELD) != before_id.as_ref() {
                    return Err(DbError::QueryError("the _id field is immutable".into()));
                }
                self.check_unique(&records, &next, Some(seq))?;
                records.by_seq.insert(seq, next);
                report.modified += 1;
                touched.extend(before_id);
            }

            if report.matched == 0 && options.upsert {
                let mut seed = upsert_seed(selector);
                apply_update(&mut seed, &upd);
                let (id, record) = Self::with_id(seed)?;
                self.check_unique(&records, &record, None)?;
                records.push(IdKey::from_bson(&id), record);
                report.upserted_id = Some(id);
            }
        }
        for id in &touched {
            log_audit("update", self.name_str(), id);
        }
        if let Some(id) = &report.upserted_id {
            log_audit("upsert", self.name_str(), id);
        }
        Ok(report)
    }

    fn remove(&self, selector: &BsonDocument) -> Result<DeleteReport, DbError> {
        let filter = parse_selector(selector)?;
        let removed: Vec<BsonDocument> = {
            let mut records = self.records.write();
            self.matching_seqs(&records, &filter, false).into_iter().filter_map(|seq| records.remove(seq)).collect()
        };
        for doc in &removed {
            if let Some(id) = doc.get(ID_FIELD) {
                log_audit("delete", self.name_str(), id);
            }
        }
        Ok(DeleteReport { deleted: removed.len() as u64 })
    }

    fn ensure_index(&self, keys: &BsonDocument, options: &IndexOptions) -> Result<String, DbError> {
        self.create_index(IndexSpec::from_keys(keys, options)?)
    }

    fn drop_index(&self, name: &str) -> Result<(), DbError> {
        self.remove_index(name)
    }

    fn index_specs(&self) -> Vec<IndexSpec> {
        self.list_indexes()
    }
}
