mod connect;
mod error;
pub mod replication;
pub mod type_output;

pub use connect::{connect_postgres, ConnectionParams};
pub use deltaflood_core::{format_lsn, parse_lsn};
pub use error::{PgError, PgResult};
pub use replication::{
    ChangeAssembler, ReplicationStream, ReplicationStreamConfig, SlotInfo, Transaction,
};
pub use type_output::PgTypeOutput;
