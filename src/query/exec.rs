use crate::collection::Collection;
use crate::document::Document;
use crate::index;
use crate::types::DocumentId;
use std::sync::Arc;

use super::cursor::Cursor;
use super::eval::{compare_docs, eval_filter, project_fields};
use super::types::{
    CmpOp, DeleteReport, Filter, FindOptions, MAX_LIMIT, MAX_PROJECTION_FIELDS, MAX_SORT_FIELDS,
    UpdateDoc, UpdateReport,
};

pub(crate) struct IndexPlan {
    pub index: String,
    pub ids: Vec<DocumentId>,
}

pub fn find_docs(col: &Arc<Collection>, filter: &Filter, opts: &FindOptions) -> Cursor {
    let bench_start = std::time::Instant::now();
    let mut used_index = false;

    if opts.projection.is_none() && opts.sort.is_none() {
        let mut ids: Vec<DocumentId> = match plan_index_candidates(col, filter) {
            Some(plan) => {
                used_index = true;
                plan.ids
            }
            None => col.list_ids(),
        };
        ids.retain(|id| col.find_document(id).is_some_and(|d| eval_filter(&d.data, filter)));
        let skip = opts.skip.unwrap_or(0);
        let limit = opts.limit.unwrap_or(usize::MAX).min(MAX_LIMIT);
        let end = (skip + limit).min(ids.len());
        let ids = if skip >= ids.len() { Vec::new() } else { ids[skip..end].to_vec() };
        log::debug!(
            target: "bookdb::query",
            "find collection={} duration_ms={} used_index={} result_count={}",
            col.name_str(),
            bench_start.elapsed().as_millis(),
            used_index,
            ids.len()
        );
        return Cursor { collection: col.clone(), ids, pos: 0, docs: None };
    }

    let mut docs: Vec<Document> = col
        .list_ids()
        .into_iter()
        .filter_map(|id| col.find_document(&id))
        .filter(|d| eval_filter(&d.data, filter))
        .collect();

    if let Some(sort) = &opts.sort {
        if sort.len() > MAX_SORT_FIELDS {
            log::warn!("sort spec too long: {}", sort.len());
        }
        docs.sort_by(|a, b| compare_docs(&a.data, &b.data, sort));
    }

    if let Some(fields) = &opts.projection {
        let fields: Vec<String> = fields.iter().take(MAX_PROJECTION_FIELDS).cloned().collect();
        for d in &mut docs {
            d.data = project_fields(&d.data, &fields);
        }
    }

    let skip = opts.skip.unwrap_or(0);
    let limit = opts.limit.unwrap_or(usize::MAX).min(MAX_LIMIT);
    let end = (skip + limit).min(docs.len());
    let docs = if skip >= docs.len() { Vec::new() } else { docs[skip..end].to_vec() };
    log::debug!(
        target: "bookdb::query",
        "find collection={} duration_ms={} used_index={} result_count={}",
        col.name_str(),
        bench_start.elapsed().as_millis(),
        used_index,
        docs.len()
    );
    Cursor { collection: col.clone(), ids: Vec::new(), pos: 0, docs: Some(docs) }
}

#[must_use]
pub fn count_docs(col: &Arc<Collection>, filter: &Filter) -> usize {
    col.list_ids()
        .into_iter()
        .filter(|id| col.find_document(id).is_some_and(|d| eval_filter(&d.data, filter)))
        .count()
}

pub fn update_many(col: &Arc<Collection>, filter: &Filter, update: &UpdateDoc) -> UpdateReport {
    let mut matched = 0u64;
    let mut modified = 0u64;
    let ids: Vec<DocumentId> = col
        .list_ids()
        .into_iter()
        .filter(|id| col.find_document(id).is_some_and(|d| eval_filter(&d.data, filter)))
        .collect();
    for id in ids {
        if let Some(mut doc) = col.find_document(&id) {
            matched += 1;
            if apply_update(&mut doc, update) {
                modified += 1;
            }
            col.update_document(&id, doc);
        }
    }
    UpdateReport { matched, modified }
}

pub fn update_one(col: &Arc<Collection>, filter: &Filter, update: &UpdateDoc) -> UpdateReport {
    if let Some(id) = col
        .list_ids()
        .into_iter()
        .find(|id| col.find_document(id).is_some_and(|d| eval_filter(&d.data, filter)))
        && let Some(mut doc) = col.find_document(&id)
    {
        let changed = apply_update(&mut doc, update);
        col.update_document(&id, doc);
        return UpdateReport { matched: 1, modified: u64::from(changed) };
    }
    UpdateReport { matched: 0, modified: 0 }
}

pub fn delete_many(col: &Arc<Collection>, filter: &Filter) -> DeleteReport {
    let mut deleted = 0u64;
    let ids: Vec<DocumentId> = col
        .list_ids()
        .into_iter()
        .filter(|id| col.find_document(id).is_some_and(|d| eval_filter(&d.data, filter)))
        .collect();
    for id in ids {
        if col.delete_document(&id) {
            deleted += 1;
        }
    }
    DeleteReport { deleted }
}

pub fn delete_one(col: &Arc<Collection>, filter: &Filter) -> DeleteReport {
    if let Some(id) = col
        .list_ids()
        .into_iter()
        .find(|id| col.find_document(id).is_some_and(|d| eval_filter(&d.data, filter)))
    {
        return DeleteReport { deleted: u64::from(col.delete_document(&id)) };
    }
    DeleteReport { deleted: 0 }
}

pub fn apply_update(doc: &mut Document, upd: &UpdateDoc) -> bool {
    fn ensure_subdoc<'a>(root: &'a mut bson::Document, key: &str) -> &'a mut bson::Document {
        let needs_new = !matches!(root.get_mut(key), Some(bson::Bson::Document(_)));
        if needs_new {
            root.insert(key.to_string(), bson::Bson::Document(bson::Document::new()));
        }
        match root.get_mut(key) {
            Some(bson::Bson::Document(d)) => d,
            _ => unreachable!(),
        }
    }
    fn traverse_to_parent<'a>(
        root: &'a mut bson::Document,
        path: &str,
    ) -> (&'a mut bson::Document, String) {
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
    fn set_path(root: &mut bson::Document, path: &str, value: bson::Bson) -> bool {
        let (parent, last) = traverse_to_parent(root, path);
        let old = parent.insert(last, value.clone());
        old.as_ref() != Some(&value)
    }
    fn get_path_owned(root: &bson::Document, path: &str) -> Option<bson::Bson> {
        super::eval::get_path(root, path).cloned()
    }
    fn unset_path(root: &mut bson::Document, path: &str) -> bool {
        let (parent, last) = traverse_to_parent(root, path);
        parent.remove(&last).is_some()
    }
    fn as_f64(v: &bson::Bson) -> f64 {
        match v {
            bson::Bson::Double(f) => *f,
            bson::Bson::Int32(i) => f64::from(*i),
            bson::Bson::Int64(i) => *i as f64,
            _ => 0.0,
        }
    }
    fn inc_path(root: &mut bson::Document, path: &str, by: f64) -> bool {
        let cur = get_path_owned(root, path).unwrap_or(bson::Bson::Double(0.0));
        set_path(root, path, bson::Bson::Double(as_f64(&cur) + by))
    }

    let mut changed = false;
    for (k, v) in &upd.set {
        if set_path(&mut doc.data, k, v.clone()) {
            changed = true;
        }
    }
    for (k, by) in &upd.inc {
        if inc_path(&mut doc.data, k, *by) {
            changed = true;
        }
    }
    for k in &upd.unset {
        if unset_path(&mut doc.data, k) {
            changed = true;
        }
    }
    if changed {
        doc.metadata.updated_at = chrono::Utc::now();
    }
    changed
}

/// Pick an index-assisted candidate set for the filter, if any index covers
/// it. Equality probes may use a single-field index or the leading field of a
/// compound one; range probes need a single-field ordered index.
pub(crate) fn plan_index_candidates(col: &Arc<Collection>, filter: &Filter) -> Option<IndexPlan> {
    match filter {
        Filter::Cmp { path, op: CmpOp::Eq, value } => {
            let mut mgr = col.indexes.write();
            let name = mgr.eq_index_for(path)?;
            index::lookup_eq(&mut mgr, &name, value).map(|ids| IndexPlan { index: name, ids })
        }
        Filter::Cmp { path, op, value } => {
            let mut mgr = col.indexes.write();
            let name = mgr.range_index_for(path)?;
            let (min, max, incl_min, incl_max) = match op {
                CmpOp::Gt => (Some(value), None, false, false),
                CmpOp::Gte => (Some(value), None, true, false),
                CmpOp::Lt => (None, Some(value), false, false),
                CmpOp::Lte => (None, Some(value), false, true),
                CmpOp::Eq => unreachable!(),
            };
            index::lookup_range(&mut mgr, &name, min, max, incl_min, incl_max)
                .map(|ids| IndexPlan { index: name, ids })
        }
        Filter::And(fs) => fs.iter().find_map(|f| plan_index_candidates(col, f)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Order;
    use bson::doc;

    fn books() -> Arc<Collection> {
        let col = Arc::new(Collection::new("books".to_string()));
        col.insert_document(Document::new(
            doc! {"title": "1984", "author": "George Orwell", "published_year": 1949, "price": 12.5},
        ));
        col.insert_document(Document::new(
            doc! {"title": "Dune", "author": "Frank Herbert", "published_year": 1965, "price": 21.0},
        ));
        col.insert_document(Document::new(
            doc! {"title": "The Martian", "author": "Andy Weir", "published_year": 2011, "price": 19.5},
        ));
        col
    }

    #[test]
    fn update_one_touches_a_single_document() {
        let col = books();
        let rep = update_one(&col, &Filter::eq("author", "George Orwell"), &UpdateDoc::set("price", 14.0));
        assert_eq!(rep, UpdateReport { matched: 1, modified: 1 });
        // Second identical update matches but does not modify.
        let rep = update_one(&col, &Filter::eq("author", "George Orwell"), &UpdateDoc::set("price", 14.0));
        assert_eq!(rep, UpdateReport { matched: 1, modified: 0 });
    }

    #[test]
    fn delete_one_leaves_the_rest() {
        let col = books();
        let rep = delete_one(&col, &Filter::eq("title", "Dune"));
        assert_eq!(rep.deleted, 1);
        assert_eq!(col.len(), 2);
        let rep = delete_one(&col, &Filter::eq("title", "Dune"));
        assert_eq!(rep.deleted, 0);
    }

    #[test]
    fn index_assisted_find_matches_scan() {
        let col = books();
        let filter = Filter::eq("author", "Andy Weir");
        let scanned = find_docs(&col, &filter, &FindOptions::default()).to_vec();
        col.create_index("author", Order::Asc).unwrap();
        assert!(plan_index_candidates(&col, &filter).is_some());
        let indexed = find_docs(&col, &filter, &FindOptions::default()).to_vec();
        assert_eq!(scanned.len(), 1);
        assert_eq!(scanned[0].id, indexed[0].id);
    }

    #[test]
    fn range_plan_uses_btree_index() {
        let col = books();
        col.create_index("published_year", Order::Asc).unwrap();
        let filter = Filter::gt("published_year", 1950);
        let plan = plan_index_candidates(&col, &filter).unwrap();
        assert_eq!(plan.index, "published_year_1");
        assert_eq!(plan.ids.len(), 2);
    }
}
