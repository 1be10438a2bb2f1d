use crate::errors::DbError;
use bson::{Bson, Document as BsonDocument};

use super::types::{CmpOp, Filter, FindOptions, Order, SortSpec, UpdateDoc};

/// Parses a Mongo-style selector (`{field: value}`, `{field: {$op: v}}`,
/// `{$and: [...]}`) into a [`Filter`]. An empty selector matches everything.
///
/// # Errors
/// Returns `QueryError` for unknown operators or malformed operands.
pub fn parse_selector(selector: &BsonDocument) -> Result<Filter, DbError> {
    let mut clauses = Vec::with_capacity(selector.len());
    for (key, value) in selector {
        clauses.push(parse_clause(key, value)?);
    }
    Ok(match clauses.len() {
        0 => Filter::True,
        1 => clauses.remove(0),
        _ => Filter::And(clauses),
    })
}

fn parse_clause(key: &str, value: &Bson) -> Result<Filter, DbError> {
    match key {
        "$and" => Ok(Filter::And(parse_selector_list(key, value)?)),
        "$or" => Ok(Filter::Or(parse_selector_list(key, value)?)),
        "$nor" => Ok(Filter::Not(Box::new(Filter::Or(parse_selector_list(key, value)?)))),
        k if k.starts_with('$') => Err(DbError::QueryError(format!("unknown top-level operator {k}"))),
        path => match value {
            Bson::Document(d) if is_operator_doc(d) => parse_field_ops(path, d),
            v => Ok(Filter::Cmp { path: path.to_string(), op: CmpOp::Eq, value: v.clone() }),
        },
    }
}

fn parse_selector_list(op: &str, value: &Bson) -> Result<Vec<Filter>, DbError> {
    let Bson::Array(items) = value else {
        return Err(DbError::QueryError(format!("{op} requires an array")));
    };
    items
        .iter()
        .map(|item| match item {
            Bson::Document(d) => parse_selector(d),
            _ => Err(DbError::QueryError(format!("{op} entries must be documents"))),
        })
        .collect()
}

fn is_operator_doc(d: &BsonDocument) -> bool {
    d.keys().next().is_some_and(|k| k.starts_with('$'))
}

fn parse_field_ops(path: &str, ops: &BsonDocument) -> Result<Filter, DbError> {
    let mut clauses = Vec::with_capacity(ops.len());
    #[cfg(feature = "regex")]
    let case_insensitive = matches!(ops.get("$options"), Some(Bson::String(o)) if o.contains('i'));
    for (op, operand) in ops {
        let p = path.to_string();
        let clause = match op.as_str() {
            "$eq" => Filter::Cmp { path: p, op: CmpOp::Eq, value: operand.clone() },
            "$ne" => Filter::Cmp { path: p, op: CmpOp::Ne, value: operand.clone() },
            "$gt" => Filter::Cmp { path: p, op: CmpOp::Gt, value: operand.clone() },
            "$gte" => Filter::Cmp { path: p, op: CmpOp::Gte, value: operand.clone() },
            "$lt" => Filter::Cmp { path: p, op: CmpOp::Lt, value: operand.clone() },
            "$lte" => Filter::Cmp { path: p, op: CmpOp::Lte, value: operand.clone() },
            "$in" => Filter::In { path: p, values: value_set(op, operand)? },
            "$nin" => Filter::Nin { path: p, values: value_set(op, operand)? },
            "$exists" => Filter::Exists { path: p, exists: truthy(operand) },
            "$not" => match operand {
                Bson::Document(d) => Filter::Not(Box::new(parse_field_ops(path, d)?)),
                _ => return Err(DbError::QueryError("$not requires a document".into())),
            },
            #[cfg(feature = "regex")]
            "$regex" => match operand {
                Bson::String(pattern) => Filter::Regex { path: p, pattern: pattern.clone(), case_insensitive },
                Bson::RegularExpression(re) => Filter::Regex {
                    path: p,
                    pattern: re.pattern.as_str().to_string(),
                    case_insensitive: case_insensitive || re.options.as_str().contains('i'),
                },
                _ => return Err(DbError::QueryError("$regex requires a string".into())),
            },
            #[cfg(feature = "regex")]
            "$options" => continue,
            other => return Err(DbError::QueryError(format!("unsupported operator {other}"))),
        };
        clauses.push(clause);
    }
    Ok(if clauses.len() == 1 { clauses.remove(0) } else { Filter::And(clauses) })
}

fn value_set(op: &str, operand: &Bson) -> Result<Vec<Bson>, DbError> {
    match operand {
        Bson::Array(values) => Ok(values.clone()),
        _ => Err(DbError::QueryError(format!("{op} requires an array"))),
    }
}

fn truthy(v: &Bson) -> bool {
    match v {
        Bson::Boolean(b) => *b,
        Bson::Int32(i) => *i != 0,
        Bson::Int64(i) => *i != 0,
        Bson::Double(f) => *f != 0.0,
        Bson::Null | Bson::Undefined => false,
        _ => true,
    }
}

/// Parses an update document. A document without `$`-prefixed keys is a
/// whole-record replacement.
///
/// # Errors
/// Returns `QueryError` when operators and plain fields are mixed, an
/// operator is unknown, or `$inc` receives a non-numeric value.
pub fn parse_update(update: &BsonDocument) -> Result<UpdateDoc, DbError> {
    let operator_keys = update.keys().filter(|k| k.starts_with('$')).count();
    if operator_keys == 0 {
        return Ok(UpdateDoc::Replace(update.clone()));
    }
    if operator_keys != update.len() {
        return Err(DbError::QueryError("update mixes operators and plain fields".into()));
    }
    let (mut set, mut inc, mut unset) = (Vec::new(), Vec::new(), Vec::new());
    for (op, operand) in update {
        let Bson::Document(fields) = operand else {
            return Err(DbError::QueryError(format!("{op} requires a document")));
        };
        match op.as_str() {
            "$set" => set.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone()))),
            "$unset" => unset.extend(fields.keys().cloned()),
            "$inc" => {
                for (k, v) in fields {
                    #[allow(clippy::cast_precision_loss)]
                    let by = match v {
                        Bson::Int32(i) => f64::from(*i),
                        Bson::Int64(i) => *i as f64,
                        Bson::Double(d) => *d,
                        _ => return Err(DbError::QueryError("$inc requires numeric".into())),
                    };
                    inc.push((k.clone(), by));
                }
            }
            other => return Err(DbError::QueryError(format!("unsupported update operator {other}"))),
        }
    }
    Ok(UpdateDoc::Ops { set, inc, unset })
}

impl FindOptions {
    /// Builds options from a Mongo-style options document:
    /// `{fields: {a: 1}, sort: {ts: -1}, skip: 10, limit: 5}`.
    ///
    /// # Errors
    /// Returns `QueryError` for unknown keys or non-numeric sizes.
    pub fn from_document(opts: &BsonDocument) -> Result<Self, DbError> {
        let mut out = Self::default();
        for (key, value) in opts {
            match key.as_str() {
                "fields" | "projection" => {
                    let Bson::Document(fields) = value else {
                        return Err(DbError::QueryError(format!("{key} requires a document")));
                    };
                    let mut keep = Vec::new();
                    for (f, flag) in fields {
                        if f == crate::types::ID_FIELD && !truthy(flag) {
                            out.exclude_id = true;
                        } else if truthy(flag) {
                            keep.push(f.clone());
                        }
                    }
                    if !keep.is_empty() {
                        out.projection = Some(keep);
                    }
                }
                "sort" => {
                    let Bson::Document(spec) = value else {
                        return Err(DbError::QueryError("sort requires a document".into()));
                    };
                    let sort = spec
                        .iter()
                        .map(|(f, dir)| SortSpec {
                            field: f.clone(),
                            order: if as_i64(dir).is_some_and(|d| d < 0) { Order::Desc } else { Order::Asc },
                        })
                        .collect();
                    out.sort = Some(sort);
                }
                "skip" => out.skip = Some(as_size(key, value)?),
                "limit" => out.limit = Some(as_size(key, value)?),
                other => return Err(DbError::QueryError(format!("unsupported find option {other}"))),
            }
        }
        Ok(out)
    }
}

fn as_i64(v: &Bson) -> Option<i64> {
    match v {
        Bson::Int32(i) => Some(i64::from(*i)),
        Bson::Int64(i) => Some(*i),
        #[allow(clippy::cast_possible_truncation)]
        Bson::Double(f) => Some(*f as i64),
        _ => None,
    }
}

fn as_size(key: &str, v: &Bson) -> Result<usize, DbError> {
    as_i64(v)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| DbError::QueryError(format!("{key} requires a non-negative number")))
}
