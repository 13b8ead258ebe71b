//! Assembles decoded pgoutput messages into committed transactions of
//! [`ChangeEvent`]s.

use deltaflood_core::{ChangeEvent, Column, ColumnValue, DisplayLsn, Origin, Tuple};
use tracing::{debug, trace, warn};

use super::pgoutput::{PgOutputMessage, RelationColumn, TupleValue};
use super::relation_cache::{RelationCache, RelationInfo};
use crate::error::{PgError, PgResult};

/// A committed transaction and its changes, in stream order.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub xid: u32,
    /// LSN of the commit record; every event carries it.
    pub commit_lsn: u64,
    /// End of the commit record, the position to acknowledge.
    pub end_lsn: u64,
    pub origin: Origin,
    pub events: Vec<ChangeEvent>,
}

#[derive(Debug)]
struct OpenTransaction {
    xid: u32,
    final_lsn: Option<u64>,
    origin: Origin,
    events: Vec<ChangeEvent>,
}

/// Stateful assembler fed one message at a time.
#[derive(Debug, Default)]
pub struct ChangeAssembler {
    relations: RelationCache,
    current: Option<OpenTransaction>,
}

impl ChangeAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn relations(&self) -> &RelationCache {
        &self.relations
    }

    pub fn in_transaction(&self) -> bool {
        self.current.is_some()
    }

    /// Drop the open transaction and all relation definitions.
    pub fn reset(&mut self) {
        self.current = None;
        self.relations.clear();
    }

    /// Feed one message. Returns the transaction when `msg` commits it.
    pub fn apply(&mut self, msg: &PgOutputMessage) -> PgResult<Option<Transaction>> {
        match msg {
            PgOutputMessage::Begin(begin) => {
                self.begin(begin.xid, Some(begin.final_lsn));
                Ok(None)
            }
            PgOutputMessage::Commit(commit) => Ok(self.commit(Some(commit.commit_lsn), commit.end_lsn)),
            PgOutputMessage::Origin(origin) => {
                match self.current.as_mut() {
                    Some(txn) => {
                        debug!(xid = txn.xid, origin = %origin.origin_name, "Transaction replicated from origin");
                        txn.origin = Origin::Replicated(origin.origin_name.clone());
                    }
                    None => warn!(origin = %origin.origin_name, "Origin message outside a transaction"),
                }
                Ok(None)
            }
            PgOutputMessage::Relation(rel) => {
                debug!(relation_id = rel.relation_id, schema = %rel.namespace, table = %rel.name, "Relation metadata");
                self.relations.update(rel);
                Ok(None)
            }
            PgOutputMessage::Insert(insert) => {
                self.push_change(insert.relation_id, |relation, xid| {
                    Ok(ChangeEvent::insert(
                        relation.table_ref(),
                        xid,
                        tuple(relation, &insert.new_tuple)?,
                    ))
                })?;
                Ok(None)
            }
            PgOutputMessage::Update(update) => {
                self.push_change(update.relation_id, |relation, xid| {
                    let before = update
                        .old_tuple
                        .as_ref()
                        .map(|old| tuple(relation, old))
                        .transpose()?;
                    Ok(ChangeEvent::update(
                        relation.table_ref(),
                        xid,
                        before,
                        Some(tuple(relation, &update.new_tuple)?),
                    ))
                })?;
                Ok(None)
            }
            PgOutputMessage::Delete(delete) => {
                self.push_change(delete.relation_id, |relation, xid| {
                    Ok(ChangeEvent::delete(
                        relation.table_ref(),
                        xid,
                        tuple(relation, &delete.old_tuple)?,
                    ))
                })?;
                Ok(None)
            }
            PgOutputMessage::Truncate(_) | PgOutputMessage::Type(_) | PgOutputMessage::Message(_) => {
                trace!("Ignoring non-row message");
                Ok(None)
            }
        }
    }

    /// Open a transaction. `final_lsn` is unknown when the begin came from
    /// the protocol layer rather than a pgoutput Begin message.
    pub fn begin(&mut self, xid: u32, final_lsn: Option<u64>) {
        if let Some(open) = self.current.as_mut() {
            if open.xid == xid {
                // Same transaction announced twice (protocol event and XLogData).
                open.final_lsn = open.final_lsn.or(final_lsn);
                return;
            }
            warn!(
                xid = open.xid,
                pending = open.events.len(),
                "Discarding transaction that never committed"
            );
        }

        trace!(xid, "Transaction begin");
        self.current = Some(OpenTransaction {
            xid,
            final_lsn,
            origin: Origin::Local,
            events: Vec::new(),
        });
    }

    /// Close the open transaction, stamping its events with the commit
    /// position and origin. Returns `None` when no transaction is open.
    pub fn commit(&mut self, commit_lsn: Option<u64>, end_lsn: u64) -> Option<Transaction> {
        let open = self.current.take()?;
        let commit_lsn = open.final_lsn.or(commit_lsn).unwrap_or(end_lsn);

        let events = open
            .events
            .into_iter()
            .map(|event| event.with_commit_lsn(commit_lsn).with_origin(open.origin.clone()))
            .collect::<Vec<_>>();

        debug!(
            xid = open.xid,
            commit_lsn = %DisplayLsn(commit_lsn),
            events = events.len(),
            "Transaction commit"
        );

        Some(Transaction {
            xid: open.xid,
            commit_lsn,
            end_lsn,
            origin: open.origin,
            events,
        })
    }

    fn push_change<F>(&mut self, relation_id: u32, build: F) -> PgResult<()>
    where
        F: FnOnce(&RelationInfo, u32) -> PgResult<ChangeEvent>,
    {
        let Some(txn) = self.current.as_mut() else {
            warn!(relation_id, "Row change outside a transaction, ignoring");
            return Ok(());
        };

        let relation = self
            .relations
            .get(relation_id)
            .ok_or(PgError::RelationNotFound(relation_id))?;

        let event = build(relation, txn.xid)?;
        trace!(kind = ?event.kind, table = %relation.name, "Row change");
        txn.events.push(event);
        Ok(())
    }
}

fn tuple(relation: &RelationInfo, values: &[TupleValue]) -> PgResult<Tuple> {
    if values.len() != relation.columns.len() {
        return Err(PgError::PgOutput(format!(
            "tuple for {}.{} has {} values, relation has {} columns",
            relation.namespace,
            relation.name,
            values.len(),
            relation.columns.len()
        )));
    }

    relation
        .columns
        .iter()
        .zip(values)
        .map(|(column, value)| column_of(relation, column, value))
        .collect()
}

fn column_of(
    relation: &RelationInfo,
    column: &RelationColumn,
    value: &TupleValue,
) -> PgResult<Column> {
    let value = match value {
        TupleValue::Null => ColumnValue::Null,
        TupleValue::UnchangedToast => ColumnValue::Unresolved,
        TupleValue::Text(raw) => {
            let text = String::from_utf8(raw.clone()).map_err(|_| {
                PgError::PgOutput(format!(
                    "text value for {}.{}.{} is not valid UTF-8 (server encoding must be UTF8)",
                    relation.namespace, relation.name, column.name
                ))
            })?;
            ColumnValue::Text(text)
        }
        TupleValue::Binary(b) => ColumnValue::Binary(b.clone()),
    };
    Ok(Column::new(&column.name, column.type_oid, value))
}
