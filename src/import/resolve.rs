use std::collections::HashMap;

use crate::model::reference::ReferenceTable;
use crate::store::{Store, StoreError};

/// Business code -> internal id lookup for one reference table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeIndex {
    ids: HashMap<String, u64>,
}

impl CodeIndex {
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        Self {
            ids: pairs.into_iter().map(|(code, id)| (code.into(), id)).collect(),
        }
    }

    /// Absent or unknown codes resolve to `None`; a missing reference is never an error.
    pub fn resolve(&self, code: Option<&str>) -> Option<u64> {
        code.map(str::trim)
            .filter(|c| !c.is_empty())
            .and_then(|c| self.ids.get(c).copied())
    }

    /// Registers a code that is about to exist but has no stored id yet.
    fn stage(&mut self, code: &str) {
        let code = code.trim();
        if code.is_empty() || self.ids.contains_key(code) {
            return;
        }
        let placeholder = u64::MAX - self.ids.len() as u64;
        self.ids.insert(code.to_string(), placeholder);
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Per-import cache of code indexes, each loaded at most once per pass.
///
/// Sections run in dependency order, so an index is first requested after its table has
/// been written. A table written again later in the same pass is invalidated.
pub struct References<'a> {
    store: &'a dyn Store,
    loaded: HashMap<ReferenceTable, CodeIndex>,
}

impl<'a> References<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self {
            store,
            loaded: HashMap::new(),
        }
    }

    pub async fn index(&mut self, table: ReferenceTable) -> Result<CodeIndex, StoreError> {
        if let Some(index) = self.loaded.get(&table) {
            return Ok(index.clone());
        }
        let index = self.store.code_index(table).await?;
        tracing::debug!(table = %table, codes = index.len(), "Loaded code index");
        self.loaded.insert(table, index.clone());
        Ok(index)
    }

    pub fn invalidate(&mut self, table: ReferenceTable) {
        self.loaded.remove(&table);
    }

    /// Dry runs write nothing, so codes a section would create are added to its index
    /// with placeholder ids. Later sections then resolve them as a real run would.
    pub async fn stage<'c, I>(&mut self, table: ReferenceTable, codes: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = &'c str>,
    {
        let mut index = self.index(table).await?;
        for code in codes {
            index.stage(code);
        }
        self.loaded.insert(table, index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_and_blank_codes_resolve_to_none() {
        let sites = CodeIndex::from_pairs([("TOR", 1_u64), ("VAN", 2)]);
        assert_eq!(sites.resolve(Some("VAN")), Some(2));
        assert_eq!(sites.resolve(Some(" TOR ")), Some(1));
        assert_eq!(sites.resolve(Some("MTL")), None);
        assert_eq!(sites.resolve(Some("")), None);
        assert_eq!(sites.resolve(None), None);
    }

    #[actix_web::test]
    async fn staged_codes_resolve_alongside_stored_ones() {
        use crate::model::reference::{ReferenceBatch, SystemRoleRecord};
        use crate::store::MemoryStore;

        let store = MemoryStore::new();
        store
            .write_batch(ReferenceBatch::SystemRoles(vec![SystemRoleRecord {
                role_code: "ADMIN".into(),
                role_name: "Administrator".into(),
                role_description: String::new(),
                data_scope_default: "all".into(),
                can_view_paystubs_self_only: false,
                is_active: true,
            }]))
            .await
            .unwrap();

        let mut refs = References::new(&store);
        refs.stage(ReferenceTable::SystemRoles, ["MGR", " ", "ADMIN"])
            .await
            .unwrap();

        let roles = refs.index(ReferenceTable::SystemRoles).await.unwrap();
        let stored = store.code_index(ReferenceTable::SystemRoles).await.unwrap();
        assert_eq!(roles.len(), 2);
        assert_eq!(
            roles.resolve(Some("ADMIN")),
            stored.resolve(Some("ADMIN"))
        );
        assert!(roles.resolve(Some("MGR")).is_some());
        assert_eq!(roles.resolve(Some("CEO")), None);
    }
}
