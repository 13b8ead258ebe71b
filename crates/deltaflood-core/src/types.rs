use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The type of row-level change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// The node a change originated on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// The change was made on this node.
    #[default]
    Local,
    /// The change arrived through replication from the named origin.
    Replicated(String),
}

impl Origin {
    pub fn is_local(&self) -> bool {
        matches!(self, Origin::Local)
    }
}

/// Identity of the table a change belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    /// The schema name (e.g., "public").
    pub schema: String,
    /// The unqualified table name.
    pub name: String,
    /// Object id, when the source provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<u32>,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            object_id: None,
        }
    }

    pub fn with_object_id(mut self, object_id: u32) -> Self {
        self.object_id = Some(object_id);
        self
    }
}

/// A column value as delivered by the change-stream source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnValue {
    Null,
    /// Stored out-of-line and not materialized by the source.
    Unresolved,
    /// Value already in its textual wire form.
    Text(String),
    /// Value in its binary wire form.
    Binary(Vec<u8>),
}

/// Borrowed view of a resolved, non-null value handed to a [`TypeOutput`](crate::TypeOutput).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Datum<'a> {
    Text(&'a str),
    Binary(&'a [u8]),
}

impl ColumnValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ColumnValue::Null)
    }

    pub fn datum(&self) -> Option<Datum<'_>> {
        match self {
            ColumnValue::Text(s) => Some(Datum::Text(s)),
            ColumnValue::Binary(b) => Some(Datum::Binary(b)),
            ColumnValue::Null | ColumnValue::Unresolved => None,
        }
    }
}

/// One column of a row image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Declared type of the column (Postgres type OID, 0 when unknown).
    #[serde(default)]
    pub type_oid: u32,
    #[serde(default)]
    pub is_system: bool,
    #[serde(default)]
    pub is_dropped: bool,
    pub value: ColumnValue,
}

impl Column {
    pub fn new(name: impl Into<String>, type_oid: u32, value: ColumnValue) -> Self {
        Self {
            name: name.into(),
            type_oid,
            is_system: false,
            is_dropped: false,
            value,
        }
    }

    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, 0, ColumnValue::Text(value.into()))
    }

    pub fn null(name: impl Into<String>) -> Self {
        Self::new(name, 0, ColumnValue::Null)
    }
}

/// An ordered row image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tuple {
    pub columns: Vec<Column>,
}

impl Tuple {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl FromIterator<Column> for Tuple {
    fn from_iter<I: IntoIterator<Item = Column>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A committed row-level change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub transaction_id: u32,
    /// Commit position of the enclosing transaction.
    #[serde(default)]
    pub commit_lsn: u64,
    #[serde(default)]
    pub origin: Origin,
    pub table: TableRef,
    /// Row before the change (update/delete with replica identity).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<Tuple>,
    /// Row after the change (insert/update).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<Tuple>,
}

impl ChangeEvent {
    pub fn insert(table: TableRef, transaction_id: u32, after: Tuple) -> Self {
        Self {
            kind: ChangeKind::Insert,
            transaction_id,
            commit_lsn: 0,
            origin: Origin::Local,
            table,
            before: None,
            after: Some(after),
        }
    }

    pub fn update(
        table: TableRef,
        transaction_id: u32,
        before: Option<Tuple>,
        after: Option<Tuple>,
    ) -> Self {
        Self {
            kind: ChangeKind::Update,
            transaction_id,
            commit_lsn: 0,
            origin: Origin::Local,
            table,
            before,
            after,
        }
    }

    pub fn delete(table: TableRef, transaction_id: u32, before: Tuple) -> Self {
        Self {
            kind: ChangeKind::Delete,
            transaction_id,
            commit_lsn: 0,
            origin: Origin::Local,
            table,
            before: Some(before),
            after: None,
        }
    }

    pub fn with_commit_lsn(mut self, lsn: u64) -> Self {
        self.commit_lsn = lsn;
        self
    }

    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// Parse an event from its JSON form.
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_value_datum() {
        assert_eq!(
            ColumnValue::Text("7".into()).datum(),
            Some(Datum::Text("7"))
        );
        assert_eq!(
            ColumnValue::Binary(vec![1, 2]).datum(),
            Some(Datum::Binary(&[1, 2]))
        );
        assert_eq!(ColumnValue::Null.datum(), None);
        assert_eq!(ColumnValue::Unresolved.datum(), None);
        assert!(ColumnValue::Null.is_null());
        assert!(!ColumnValue::Unresolved.is_null());
    }

    #[test]
    fn test_origin_default_is_local() {
        assert!(Origin::default().is_local());
        assert!(!Origin::Replicated("node_b".into()).is_local());
    }

    #[test]
    fn test_event_from_json() {
        let json = r#"{
            "kind": "insert",
            "transaction_id": 42,
            "table": {"schema": "public", "name": "orders"},
            "after": [
                {"name": "id", "type_oid": 23, "value": {"text": "7"}},
                {"name": "note", "value": "null"},
                {"name": "body", "value": "unresolved"}
            ]
        }"#;

        let event = ChangeEvent::from_json(json).unwrap();
        assert_eq!(event.kind, ChangeKind::Insert);
        assert_eq!(event.transaction_id, 42);
        assert_eq!(event.commit_lsn, 0);
        assert!(event.origin.is_local());
        assert_eq!(event.table.object_id, None);
        assert!(event.before.is_none());

        let after = event.after.unwrap();
        assert_eq!(after.len(), 3);
        assert_eq!(after.columns[0].type_oid, 23);
        assert_eq!(after.columns[0].value, ColumnValue::Text("7".into()));
        assert_eq!(after.columns[1].value, ColumnValue::Null);
        assert_eq!(after.columns[2].value, ColumnValue::Unresolved);
    }

    #[test]
    fn test_event_from_json_replicated_origin() {
        let json = r#"{
            "kind": "delete",
            "transaction_id": 7,
            "origin": {"replicated": "node_b"},
            "table": {"schema": "public", "name": "orders", "object_id": 16384},
            "before": [{"name": "id", "value": {"text": "1"}}]
        }"#;

        let event = ChangeEvent::from_json(json).unwrap();
        assert_eq!(event.origin, Origin::Replicated("node_b".into()));
        assert_eq!(event.table.object_id, Some(16384));
    }

    #[test]
    fn test_event_from_json_rejects_unknown_kind() {
        let json = r#"{"kind": "truncate", "transaction_id": 1, "table": {"schema": "s", "name": "t"}}"#;
        assert!(ChangeEvent::from_json(json).is_err());
    }
}
