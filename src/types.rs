use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier assigned to every stored document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    // Ids are index posting-list members, so they must be usable as ordered
    // set keys.
    #[test]
    fn ids_work_as_ordered_set_keys() {
        let ids: Vec<DocumentId> = (0..8).map(|_| DocumentId::new()).collect();
        let mut set: BTreeSet<DocumentId> = ids.iter().cloned().collect();
        assert_eq!(set.len(), 8);
        assert!(set.remove(&ids[3]));
        assert!(!set.contains(&ids[3]));
        let sorted: Vec<&DocumentId> = set.iter().collect();
        for w in sorted.windows(2) {
            assert!(w[0] < w[1]);
        }
    }
}
