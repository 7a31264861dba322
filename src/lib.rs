pub mod aggregate;
pub mod catalog;
pub mod cli;
pub mod collection;
pub mod document;
pub mod errors;
pub mod fixtures;
pub mod index;
pub mod logger;
pub mod query;
pub mod types;

use crate::collection::Collection;
use crate::document::Document;
use crate::errors::DbError;
use crate::types::DocumentId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// The main database struct: an in-memory registry of named collections and
/// a façade over the query, aggregation, index and explain layers.
#[derive(Default)]
pub struct Database {
    collections: RwLock<HashMap<String, Arc<Collection>>>,
}

impl Database {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the named collection, creating it if missing.
    pub fn create_collection(&self, name: &str) -> Arc<Collection> {
        let mut cols = self.collections.write();
        cols.entry(name.to_string())
            .or_insert_with(|| {
                log::info!(target: "bookdb::audit", "create collection={name}");
                Arc::new(Collection::new(name.to_string()))
            })
            .clone()
    }

    pub fn get_collection(&self, name: &str) -> Option<Arc<Collection>> {
        self.collections.read().get(name).cloned()
    }

    pub fn delete_collection(&self, name: &str) -> bool {
        self.collections.write().remove(name).is_some()
    }

    pub fn list_collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Rename a collection.
    ///
    /// # Errors
    /// `NoSuchCollection` if `old` is missing, `CollectionAlreadyExists` if
    /// `new` is taken.
    pub fn rename_collection(&self, old: &str, new: &str) -> Result<(), DbError> {
        let mut cols = self.collections.write();
        if cols.contains_key(new) {
            return Err(DbError::CollectionAlreadyExists(new.to_string()));
        }
        let col = cols
            .remove(old)
            .ok_or_else(|| DbError::NoSuchCollection(old.to_string()))?;
        col.set_name(new.to_string());
        cols.insert(new.to_string(), col);
        Ok(())
    }

    /// Inserts a document into the specified collection.
    ///
    /// # Errors
    /// `NoSuchCollection` if the collection does not exist.
    pub fn insert_document(
        &self,
        collection_name: &str,
        document: Document,
    ) -> Result<DocumentId, DbError> {
        Ok(self.collection(collection_name)?.insert_document(document))
    }

    fn collection(&self, name: &str) -> Result<Arc<Collection>, DbError> {
        self.get_collection(name).ok_or_else(|| DbError::NoSuchCollection(name.to_string()))
    }

    // --- Query API (façade over query module) ---

    pub fn find(
        &self,
        collection_name: &str,
        filter: &query::Filter,
        opts: &query::FindOptions,
    ) -> Result<query::Cursor, DbError> {
        Ok(query::find_docs(&self.collection(collection_name)?, filter, opts))
    }

    pub fn count(&self, collection_name: &str, filter: &query::Filter) -> Result<usize, DbError> {
        Ok(query::count_docs(&self.collection(collection_name)?, filter))
    }

    pub fn update_one(
        &self,
        collection_name: &str,
        filter: &query::Filter,
        update: &query::UpdateDoc,
    ) -> Result<query::UpdateReport, DbError> {
        Ok(query::update_one(&self.collection(collection_name)?, filter, update))
    }

    pub fn update_many(
        &self,
        collection_name: &str,
        filter: &query::Filter,
        update: &query::UpdateDoc,
    ) -> Result<query::UpdateReport, DbError> {
        Ok(query::update_many(&self.collection(collection_name)?, filter, update))
    }

    pub fn delete_one(
        &self,
        collection_name: &str,
        filter: &query::Filter,
    ) -> Result<query::DeleteReport, DbError> {
        Ok(query::delete_one(&self.collection(collection_name)?, filter))
    }

    pub fn delete_many(
        &self,
        collection_name: &str,
        filter: &query::Filter,
    ) -> Result<query::DeleteReport, DbError> {
        Ok(query::delete_many(&self.collection(collection_name)?, filter))
    }

    pub fn aggregate(
        &self,
        collection_name: &str,
        stages: &[aggregate::Stage],
    ) -> Result<Vec<bson::Document>, DbError> {
        aggregate::run_pipeline(&self.collection(collection_name)?, stages)
    }

    pub fn explain(
        &self,
        collection_name: &str,
        filter: &query::Filter,
        opts: &query::FindOptions,
    ) -> Result<query::ExplainReport, DbError> {
        Ok(query::explain_find(&self.collection(collection_name)?, filter, opts))
    }

    // --- Index admin ---

    pub fn create_index(
        &self,
        collection_name: &str,
        field: &str,
        order: query::Order,
    ) -> Result<String, DbError> {
        self.collection(collection_name)?.create_index(field, order)
    }

    pub fn create_compound_index(
        &self,
        collection_name: &str,
        fields: Vec<(String, query::Order)>,
    ) -> Result<String, DbError> {
        self.collection(collection_name)?.create_compound_index(fields)
    }

    pub fn drop_index(&self, collection_name: &str, name: &str) -> Result<(), DbError> {
        self.collection(collection_name)?.drop_index(name)
    }

    pub fn list_indexes(
        &self,
        collection_name: &str,
    ) -> Result<Vec<index::IndexDescriptor>, DbError> {
        Ok(self.collection(collection_name)?.index_descriptors())
    }
}

/// Initializes the logging system.
///
/// This function should be called before any other database operations.
///
/// # Errors
/// Returns an error if the logger cannot be initialized.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    logger::init()?;
    Ok(())
}
