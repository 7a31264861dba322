use super::core::Collection;
use crate::document::Document;
use crate::index::{index_insert_all, index_remove_all};
use crate::types::DocumentId;

impl Collection {
    pub fn insert_document(&self, document: Document) -> DocumentId {
        let _guard = self.build_lock.read();
        let doc_id = document.id.clone();
        index_insert_all(&mut self.indexes.write(), &document.data, &doc_id);
        {
            let mut store = self.store.write();
            store.order.push(doc_id.clone());
            store.docs.insert(doc_id.clone(), document);
        }
        log::info!(target: "bookdb::audit", "insert collection={} doc_id={}", self.name_str(), doc_id);
        doc_id
    }

    pub fn find_document(&self, id: &DocumentId) -> Option<Document> {
        self.store.read().docs.get(id).cloned()
    }

    /// Replaces the stored document, keeping its id and position. Indexes are
    /// kept in sync with the old and new field values.
    pub fn update_document(&self, id: &DocumentId, new_document: Document) -> bool {
        let _guard = self.build_lock.read();
        let mut store = self.store.write();
        let Some(old) = store.docs.get(id).cloned() else {
            return false;
        };
        let mut new_doc_same_id = new_document;
        new_doc_same_id.id = id.clone();
        {
            let mut mgr = self.indexes.write();
            index_remove_all(&mut mgr, &old.data, id);
            index_insert_all(&mut mgr, &new_doc_same_id.data, id);
        }
        store.docs.insert(id.clone(), new_doc_same_id);
        drop(store);
        log::info!(target: "bookdb::audit", "update collection={} doc_id={}", self.name_str(), id);
        true
    }

    pub fn delete_document(&self, id: &DocumentId) -> bool {
        let _guard = self.build_lock.read();
        let mut store = self.store.write();
        let Some(old) = store.docs.remove(id) else {
            return false;
        };
        store.order.retain(|x| x != id);
        index_remove_all(&mut self.indexes.write(), &old.data, id);
        drop(store);
        log::info!(target: "bookdb::audit", "delete collection={} doc_id={}", self.name_str(), id);
        true
    }

    /// All documents in insertion order.
    pub fn get_all_documents(&self) -> Vec<Document> {
        let store = self.store.read();
        store.order.iter().filter_map(|id| store.docs.get(id).cloned()).collect()
    }

    /// Return only the IDs of all documents without cloning each document.
    pub fn list_ids(&self) -> Vec<DocumentId> {
        self.store.read().order.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.store.read().docs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
