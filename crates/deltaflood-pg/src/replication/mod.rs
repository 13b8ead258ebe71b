//! Logical replication over the streaming protocol with pgoutput.

pub mod assembler;
pub mod client;
pub mod pgoutput;
pub mod publication;
pub mod relation_cache;
pub mod slot;

pub use assembler::{ChangeAssembler, Transaction};
pub use client::{ReplicationStream, ReplicationStreamConfig};
pub use pgoutput::{decode_message, PgOutputMessage, TupleValue};
pub use publication::{ensure_publication, parse_table_ref};
pub use relation_cache::{RelationCache, RelationInfo};
pub use slot::{ensure_slot, find_slot, SlotInfo};
