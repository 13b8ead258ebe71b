//! Relation metadata announced on the replication stream.
//!
//! The server sends a Relation message before the first change on each
//! table, and again whenever its definition changes. Row messages only
//! carry the relation OID.

use std::collections::HashMap;

use deltaflood_core::TableRef;

use super::pgoutput::{RelationColumn, RelationMessage};

/// Cached definition of one relation.
#[derive(Debug, Clone)]
pub struct RelationInfo {
    pub relation_id: u32,
    pub namespace: String,
    pub name: String,
    pub columns: Vec<RelationColumn>,
}

impl RelationInfo {
    /// The table identity used by encoded events.
    pub fn table_ref(&self) -> TableRef {
        TableRef::new(&self.namespace, &self.name).with_object_id(self.relation_id)
    }
}

impl From<&RelationMessage> for RelationInfo {
    fn from(msg: &RelationMessage) -> Self {
        // pgoutput sends an empty namespace for pg_catalog
        let namespace = if msg.namespace.is_empty() {
            "pg_catalog".to_string()
        } else {
            msg.namespace.clone()
        };

        Self {
            relation_id: msg.relation_id,
            namespace,
            name: msg.name.clone(),
            columns: msg.columns.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct RelationCache {
    relations: HashMap<u32, RelationInfo>,
}

impl RelationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a relation definition.
    pub fn update(&mut self, msg: &RelationMessage) {
        self.relations.insert(msg.relation_id, msg.into());
    }

    pub fn get(&self, relation_id: u32) -> Option<&RelationInfo> {
        self.relations.get(&relation_id)
    }

    pub fn clear(&mut self) {
        self.relations.clear();
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relation(id: u32, namespace: &str, name: &str, columns: &[&str]) -> RelationMessage {
        RelationMessage {
            relation_id: id,
            namespace: namespace.to_string(),
            name: name.to_string(),
            replica_identity: b'd',
            columns: columns
                .iter()
                .map(|c| RelationColumn {
                    flags: 0,
                    name: c.to_string(),
                    type_oid: 25,
                    type_modifier: -1,
                })
                .collect(),
        }
    }

    #[test]
    fn test_cache_update_and_get() {
        let mut cache = RelationCache::new();
        assert!(cache.is_empty());

        cache.update(&relation(16384, "public", "users", &["id", "name"]));
        assert_eq!(cache.len(), 1);

        let info = cache.get(16384).unwrap();
        assert_eq!(info.name, "users");
        assert_eq!(info.columns.len(), 2);
        assert!(cache.get(1).is_none());
    }

    #[test]
    fn test_cache_replaces_definition() {
        let mut cache = RelationCache::new();
        cache.update(&relation(1, "public", "t", &["a"]));
        cache.update(&relation(1, "public", "t", &["a", "b"]));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(1).unwrap().columns.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_table_ref_carries_oid() {
        let mut cache = RelationCache::new();
        cache.update(&relation(16390, "sales", "orders", &["id"]));

        let table = cache.get(16390).unwrap().table_ref();
        assert_eq!(table.schema, "sales");
        assert_eq!(table.name, "orders");
        assert_eq!(table.object_id, Some(16390));
    }

    #[test]
    fn test_empty_namespace_is_pg_catalog() {
        let mut cache = RelationCache::new();
        cache.update(&relation(1259, "", "pg_class", &["oid"]));
        assert_eq!(cache.get(1259).unwrap().namespace, "pg_catalog");
    }
}
