use crate::query::Order;
use crate::types::DocumentId;
use bson::{Bson, Document as BsonDocument};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, Default)]
pub struct IndexStats {
    pub keys: usize,
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub build_time_ms: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum IndexKeyKind {
    Bool(bool),
    I64(i64),
    F64(OrderedFloat<f64>),
    Str(String),
}

#[must_use]
pub fn key_from_bson(v: &Bson) -> Option<IndexKeyKind> {
    match v {
        Bson::String(s) => Some(IndexKeyKind::Str(s.clone())),
        Bson::Int32(i) => Some(IndexKeyKind::I64(i64::from(*i))),
        Bson::Int64(i) => Some(IndexKeyKind::I64(*i)),
        Bson::Double(f) => Some(IndexKeyKind::F64(OrderedFloat(*f))),
        Bson::Boolean(b) => Some(IndexKeyKind::Bool(*b)),
        _ => None,
    }
}

fn get_path<'a>(doc: &'a BsonDocument, path: &str) -> Option<&'a Bson> {
    let mut parts = path.split('.');
    let first = parts.next()?;
    let mut cur = doc.get(first)?;
    for p in parts {
        match cur {
            Bson::Document(d) => cur = d.get(p)?,
            _ => return None,
        }
    }
    Some(cur)
}

/// Ordered single-field index.
#[derive(Debug, Clone)]
pub struct BTreeIndex {
    pub field: String,
    pub order: Order,
    pub map: BTreeMap<IndexKeyKind, BTreeSet<DocumentId>>,
    pub stats: IndexStats,
}

impl BTreeIndex {
    #[must_use]
    pub fn new(field: String, order: Order) -> Self {
        Self { field, order, map: BTreeMap::new(), stats: IndexStats::default() }
    }

    pub fn insert(&mut self, doc: &BsonDocument, id: &DocumentId) {
        if let Some(v) = get_path(doc, &self.field)
            && let Some(k) = key_from_bson(v)
        {
            let set = self.map.entry(k).or_default();
            if set.insert(id.clone()) {
                self.stats.entries += 1;
            }
            self.stats.keys = self.map.len();
        }
    }

    pub fn remove(&mut self, doc: &BsonDocument, id: &DocumentId) {
        if let Some(v) = get_path(doc, &self.field)
            && let Some(k) = key_from_bson(v)
            && let Some(set) = self.map.get_mut(&k)
        {
            if set.remove(id) {
                self.stats.entries = self.stats.entries.saturating_sub(1);
            }
            if set.is_empty() {
                self.map.remove(&k);
            }
            self.stats.keys = self.map.len();
        }
    }

    pub fn lookup_eq(&mut self, v: &Bson) -> Option<Vec<DocumentId>> {
        if let Some(k) = key_from_bson(v)
            && let Some(set) = self.map.get(&k)
        {
            self.stats.hits += 1;
            return Some(set.iter().cloned().collect());
        }
        self.stats.misses += 1;
        None
    }

    pub fn lookup_range(
        &mut self,
        min: Option<&Bson>,
        max: Option<&Bson>,
        inclusive_min: bool,
        inclusive_max: bool,
    ) -> Option<Vec<DocumentId>> {
        use std::ops::Bound;
        let start = match min.and_then(key_from_bson) {
            Some(k) if inclusive_min => Bound::Included(k),
            Some(k) => Bound::Excluded(k),
            None => Bound::Unbounded,
        };
        let end = match max.and_then(key_from_bson) {
            Some(k) if inclusive_max => Bound::Included(k),
            Some(k) => Bound::Excluded(k),
            None => Bound::Unbounded,
        };
        let mut out: Vec<DocumentId> = Vec::new();
        for (_k, set) in self.map.range((start, end)) {
            out.extend(set.iter().cloned());
        }
        if out.is_empty() {
            self.stats.misses += 1;
            None
        } else {
            self.stats.hits += 1;
            Some(out)
        }
    }
}

/// Key of a compound index: one optional component per declared field, each
/// compared in that field's declared direction. Missing values sort first in
/// ascending fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundKey(pub Vec<(Order, Option<IndexKeyKind>)>);

impl Ord for CompoundKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        for ((ord_a, a), (_, b)) in self.0.iter().zip(other.0.iter()) {
            let c = a.cmp(b);
            if c != std::cmp::Ordering::Equal {
                return if *ord_a == Order::Asc { c } else { c.reverse() };
            }
        }
        self.0.len().cmp(&other.0.len())
    }
}

impl PartialOrd for CompoundKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Ordered index over several fields with per-field sort direction.
#[derive(Debug, Clone)]
pub struct CompoundIndex {
    pub fields: Vec<(String, Order)>,
    pub map: BTreeMap<CompoundKey, BTreeSet<DocumentId>>,
    pub stats: IndexStats,
}

impl CompoundIndex {
    #[must_use]
    pub fn new(fields: Vec<(String, Order)>) -> Self {
        Self { fields, map: BTreeMap::new(), stats: IndexStats::default() }
    }

    fn key_for(&self, doc: &BsonDocument) -> CompoundKey {
        CompoundKey(
            self.fields
                .iter()
                .map(|(f, o)| (*o, get_path(doc, f).and_then(key_from_bson)))
                .collect(),
        )
    }

    pub fn insert(&mut self, doc: &BsonDocument, id: &DocumentId) {
        let key = self.key_for(doc);
        let set = self.map.entry(key).or_default();
        if set.insert(id.clone()) {
            self.stats.entries += 1;
        }
        self.stats.keys = self.map.len();
    }

    pub fn remove(&mut self, doc: &BsonDocument, id: &DocumentId) {
        let key = self.key_for(doc);
        if let Some(set) = self.map.get_mut(&key) {
            if set.remove(id) {
                self.stats.entries = self.stats.entries.saturating_sub(1);
            }
            if set.is_empty() {
                self.map.remove(&key);
            }
            self.stats.keys = self.map.len();
        }
    }

    /// Equality lookup on the leading field only. Entries with an equal
    /// leading component are contiguous under the key order, but a plain scan
    /// is enough at catalog scale.
    pub fn lookup_leading_eq(&mut self, v: &Bson) -> Option<Vec<DocumentId>> {
        let Some(target) = key_from_bson(v) else {
            self.stats.misses += 1;
            return None;
        };
        let mut out: Vec<DocumentId> = Vec::new();
        for (k, set) in &self.map {
            if k.0.first().and_then(|(_, c)| c.as_ref()) == Some(&target) {
                out.extend(set.iter().cloned());
            }
        }
        if out.is_empty() {
            self.stats.misses += 1;
            None
        } else {
            self.stats.hits += 1;
            Some(out)
        }
    }

    #[must_use]
    pub fn leading_field(&self) -> &str {
        &self.fields[0].0
    }
}

#[derive(Debug, Clone)]
pub enum IndexImpl {
    Single(BTreeIndex),
    Compound(CompoundIndex),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexDescriptor {
    pub name: String,
    pub fields: Vec<(String, Order)>,
}

/// Builds the Mongo-style index name, e.g. `author_1_published_year_-1`.
#[must_use]
pub fn index_name(fields: &[(String, Order)]) -> String {
    fields
        .iter()
        .map(|(f, o)| format!("{f}_{}", if *o == Order::Asc { "1" } else { "-1" }))
        .collect::<Vec<_>>()
        .join("_")
}

#[derive(Debug, Default)]
pub struct IndexManager {
    pub indexes: HashMap<String, IndexImpl>, // key: index name
}

impl IndexManager {
    #[must_use]
    pub fn new() -> Self {
        Self { indexes: HashMap::new() }
    }

    pub fn create_index(&mut self, field: &str, order: Order) -> Result<String, crate::errors::DbError> {
        let name = index_name(&[(field.to_string(), order)]);
        if self.indexes.contains_key(&name) {
            return Err(crate::errors::DbError::IndexExists(name));
        }
        self.indexes.insert(name.clone(), IndexImpl::Single(BTreeIndex::new(field.to_string(), order)));
        Ok(name)
    }

    pub fn create_compound_index(
        &mut self,
        fields: Vec<(String, Order)>,
    ) -> Result<String, crate::errors::DbError> {
        if fields.len() < 2 {
            return Err(crate::errors::DbError::QueryError(
                "compound index requires at least two fields".into(),
            ));
        }
        let name = index_name(&fields);
        if self.indexes.contains_key(&name) {
            return Err(crate::errors::DbError::IndexExists(name));
        }
        self.indexes.insert(name.clone(), IndexImpl::Compound(CompoundIndex::new(fields)));
        Ok(name)
    }

    pub fn drop_index(&mut self, name: &str) -> Result<(), crate::errors::DbError> {
        self.indexes
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| crate::errors::DbError::NoSuchIndex(name.to_string()))
    }

    #[must_use]
    pub fn descriptors(&self) -> Vec<IndexDescriptor> {
        let mut out: Vec<IndexDescriptor> = self
            .indexes
            .iter()
            .map(|(name, i)| IndexDescriptor {
                name: name.clone(),
                fields: match i {
                    IndexImpl::Single(b) => vec![(b.field.clone(), b.order)],
                    IndexImpl::Compound(c) => c.fields.clone(),
                },
            })
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    #[must_use]
    pub fn stats(&self, name: &str) -> Option<IndexStats> {
        self.indexes.get(name).map(|i| match i {
            IndexImpl::Single(b) => b.stats.clone(),
            IndexImpl::Compound(c) => c.stats.clone(),
        })
    }

    /// Name of an index usable for an equality probe on `field`: a
    /// single-field index on it, or a compound index whose leading field
    /// matches.
    #[must_use]
    pub fn eq_index_for(&self, field: &str) -> Option<String> {
        let mut compound: Option<String> = None;
        for (name, idx) in &self.indexes {
            match idx {
                IndexImpl::Single(b) if b.field == field => return Some(name.clone()),
                IndexImpl::Compound(c) if c.leading_field() == field => {
                    compound.get_or_insert_with(|| name.clone());
                }
                _ => {}
            }
        }
        compound
    }

    /// Name of a single-field ordered index on `field`, for range probes.
    #[must_use]
    pub fn range_index_for(&self, field: &str) -> Option<String> {
        self.indexes.iter().find_map(|(name, idx)| match idx {
            IndexImpl::Single(b) if b.field == field => Some(name.clone()),
            _ => None,
        })
    }
}

pub fn index_insert_all(mgr: &mut IndexManager, doc: &BsonDocument, id: &DocumentId) {
    for idx in mgr.indexes.values_mut() {
        match idx {
            IndexImpl::Single(b) => b.insert(doc, id),
            IndexImpl::Compound(c) => c.insert(doc, id),
        }
    }
}

pub fn index_remove_all(mgr: &mut IndexManager, doc: &BsonDocument, id: &DocumentId) {
    for idx in mgr.indexes.values_mut() {
        match idx {
            IndexImpl::Single(b) => b.remove(doc, id),
            IndexImpl::Compound(c) => c.remove(doc, id),
        }
    }
}

pub fn lookup_eq(mgr: &mut IndexManager, name: &str, v: &Bson) -> Option<Vec<DocumentId>> {
    match mgr.indexes.get_mut(name) {
        Some(IndexImpl::Single(b)) => b.lookup_eq(v),
        Some(IndexImpl::Compound(c)) => c.lookup_leading_eq(v),
        None => None,
    }
}

pub fn lookup_range(
    mgr: &mut IndexManager,
    name: &str,
    min: Option<&Bson>,
    max: Option<&Bson>,
    incl_min: bool,
    incl_max: bool,
) -> Option<Vec<DocumentId>> {
    match mgr.indexes.get_mut(name) {
        Some(IndexImpl::Single(b)) => b.lookup_range(min, max, incl_min, incl_max),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn compound_key_orders_mixed_directions() {
        let idx = CompoundIndex::new(vec![
            ("author".into(), Order::Asc),
            ("published_year".into(), Order::Desc),
        ]);
        let a = idx.key_for(&doc! {"author": "Orwell", "published_year": 1945});
        let b = idx.key_for(&doc! {"author": "Orwell", "published_year": 1949});
        let c = idx.key_for(&doc! {"author": "Tolkien", "published_year": 1937});
        // Same author: later year first (descending second component).
        assert!(b < a);
        // Author ascending dominates.
        assert!(a < c);
        assert!(b < c);
    }

    #[test]
    fn manager_rejects_duplicate_and_missing() {
        let mut mgr = IndexManager::new();
        let name = mgr.create_index("title", Order::Asc).unwrap();
        assert_eq!(name, "title_1");
        assert!(matches!(
            mgr.create_index("title", Order::Asc),
            Err(crate::errors::DbError::IndexExists(_))
        ));
        assert!(matches!(
            mgr.drop_index("nope_1"),
            Err(crate::errors::DbError::NoSuchIndex(_))
        ));
        mgr.drop_index("title_1").unwrap();
    }

    #[test]
    fn eq_index_prefers_single_field() {
        let mut mgr = IndexManager::new();
        mgr.create_compound_index(vec![
            ("author".into(), Order::Asc),
            ("published_year".into(), Order::Desc),
        ])
        .unwrap();
        assert_eq!(mgr.eq_index_for("author").as_deref(), Some("author_1_published_year_-1"));
        mgr.create_index("author", Order::Asc).unwrap();
        assert_eq!(mgr.eq_index_for("author").as_deref(), Some("author_1"));
        assert!(mgr.eq_index_for("published_year").is_none());
    }
}
