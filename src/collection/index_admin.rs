use super::core::Collection;
use crate::errors::DbError;
use crate::index::{IndexDescriptor, IndexImpl, IndexStats, index_insert_all};
use crate::query::Order;

impl Collection {
    /// Creates a single-field index and builds it offline from the current
    /// contents, recording the build time in the index stats.
    pub fn create_index(&self, field: &str, order: Order) -> Result<String, DbError> {
        let _wguard = self.build_lock.write();
        let name = self.indexes.write().create_index(field, order)?;
        self.rebuild(&name);
        Ok(name)
    }

    pub fn create_compound_index(
        &self,
        fields: Vec<(String, Order)>,
    ) -> Result<String, DbError> {
        let _wguard = self.build_lock.write();
        let name = self.indexes.write().create_compound_index(fields)?;
        self.rebuild(&name);
        Ok(name)
    }

    pub fn drop_index(&self, name: &str) -> Result<(), DbError> {
        let _wguard = self.build_lock.write();
        self.indexes.write().drop_index(name)
    }

    #[must_use]
    pub fn index_descriptors(&self) -> Vec<IndexDescriptor> {
        self.indexes.read().descriptors()
    }

    #[must_use]
    pub fn index_stats(&self, name: &str) -> Option<IndexStats> {
        self.indexes.read().stats(name)
    }

    fn rebuild(&self, name: &str) {
        let start = std::time::Instant::now();
        let docs = self.get_all_documents();
        let mut mgr = self.indexes.write();
        for doc in &docs {
            index_insert_all(&mut mgr, &doc.data, &doc.id);
        }
        if let Some(idx) = mgr.indexes.get_mut(name) {
            let elapsed = start.elapsed().as_millis();
            match idx {
                IndexImpl::Single(b) => b.stats.build_time_ms = elapsed,
                IndexImpl::Compound(c) => c.stats.build_time_ms = elapsed,
            }
        }
        log::info!(
            target: "bookdb::audit",
            "index build collection={} index={} docs={}",
            self.name_str(),
            name,
            docs.len()
        );
    }
}
