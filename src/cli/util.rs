use crate::collection::Collection;
use crate::document::Document;
use crate::errors::DbError;
use crate::query::{Order, SortSpec};
use bson::Bson;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// Renders a stored document as plain JSON, the shell's `.pretty()`
/// analogue. The id is surfaced as `_id`; projected documents (which never
/// carry an id inside `data`) print only their remaining fields.
#[must_use]
pub fn doc_to_json(doc: &Document, include_id: bool) -> Value {
    let mut map = serde_json::Map::new();
    if include_id {
        map.insert("_id".to_string(), Value::String(doc.id.to_string()));
    }
    for (k, v) in &doc.data {
        map.insert(k.to_string(), bson_to_json(v));
    }
    Value::Object(map)
}

#[must_use]
pub fn bson_doc_to_json(doc: &bson::Document) -> Value {
    let mut map = serde_json::Map::new();
    for (k, v) in doc {
        map.insert(k.to_string(), bson_to_json(v));
    }
    Value::Object(map)
}

fn bson_to_json(v: &Bson) -> Value {
    match v {
        Bson::Null => Value::Null,
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::Int32(i) => Value::from(*i),
        Bson::Int64(i) => Value::from(*i),
        Bson::Double(f) => serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number),
        Bson::String(s) => Value::String(s.clone()),
        Bson::Array(a) => Value::Array(a.iter().map(bson_to_json).collect()),
        Bson::Document(d) => bson_doc_to_json(d),
        other => Value::String(format!("{other:?}")),
    }
}

/// Loads newline-delimited JSON into the collection, one document per line.
/// Blank lines are skipped.
///
/// # Errors
/// `Io` if the file cannot be read, `Json`/`QueryError` for malformed lines.
pub fn load_ndjson(col: &Arc<Collection>, path: &Path) -> Result<usize, DbError> {
    let content = std::fs::read_to_string(path).map_err(|e| DbError::Io(e.to_string()))?;
    let mut n = 0usize;
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line)?;
        let bson = Bson::try_from(value)
            .map_err(|e| DbError::QueryError(format!("invalid document: {e}")))?;
        let Bson::Document(data) = bson else {
            return Err(DbError::QueryError("each line must be a JSON object".into()));
        };
        col.insert_document(Document::new(data));
        n += 1;
    }
    log::info!(target: "bookdb::audit", "load collection={} docs={}", col.name_str(), n);
    Ok(n)
}

/// Parses a comma-separated field list ("title,author,price").
#[must_use]
pub fn parse_fields(spec: &str) -> Vec<String> {
    spec.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect()
}

/// Parses a sort spec of the form "price:1" or "author:1,published_year:-1".
/// Accepts `asc`/`desc` as aliases for `1`/`-1`.
///
/// # Errors
/// `QueryError` on malformed entries.
pub fn parse_sort(spec: &str) -> Result<Vec<SortSpec>, DbError> {
    parse_field_orders(spec)?
        .into_iter()
        .map(|(field, order)| Ok(SortSpec { field, order }))
        .collect()
}

/// Parses index field specs, same grammar as sorts.
///
/// # Errors
/// `QueryError` on malformed entries.
pub fn parse_field_orders(spec: &str) -> Result<Vec<(String, Order)>, DbError> {
    let mut out = Vec::new();
    for part in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (field, dir) = part
            .split_once(':')
            .ok_or_else(|| DbError::QueryError(format!("expected field:direction, got {part}")))?;
        let order = match dir.trim() {
            "1" | "asc" => Order::Asc,
            "-1" | "desc" => Order::Desc,
            other => {
                return Err(DbError::QueryError(format!("invalid direction: {other}")));
            }
        };
        out.push((field.trim().to_string(), order));
    }
    if out.is_empty() {
        return Err(DbError::QueryError("empty field spec".into()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn sort_spec_grammar() {
        let s = parse_sort("author:1,published_year:-1").unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s[0].field, "author");
        assert_eq!(s[0].order, Order::Asc);
        assert_eq!(s[1].order, Order::Desc);
        assert!(parse_sort("price").is_err());
        assert!(parse_sort("price:2").is_err());
    }

    #[test]
    fn doc_json_shape() {
        let d = Document::new(doc! {"title": "Dune", "price": 21.0, "in_stock": true});
        let v = doc_to_json(&d, true);
        assert_eq!(v["title"], "Dune");
        assert_eq!(v["in_stock"], true);
        assert!(v["_id"].is_string());
        let v = doc_to_json(&d, false);
        assert!(v.get("_id").is_none());
    }
}
