use thiserror::Error;

#[derive(Debug, Error)]
pub enum PgError {
    #[error("postgres error: {0}")]
    Postgres(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("replication slot '{0}' does not exist")]
    SlotNotFound(String),

    #[error("failed to create replication slot: {0}")]
    SlotCreationFailed(String),

    #[error("publication '{0}' does not exist")]
    PublicationNotFound(String),

    #[error("replication error: {0}")]
    Replication(String),

    #[error("pgoutput decode error: {0}")]
    PgOutput(String),

    #[error("truncated pgoutput message: {0}")]
    Truncated(#[from] std::io::Error),

    #[error("relation {0} not found in relation cache")]
    RelationNotFound(u32),

    #[error("invalid LSN format: {0}")]
    InvalidLsn(String),
}

impl From<tokio_postgres::Error> for PgError {
    fn from(e: tokio_postgres::Error) -> Self {
        // Extract database error details if available
        if let Some(db_err) = e.as_db_error() {
            let msg = format!(
                "{}: {} (code: {})",
                db_err.severity(),
                db_err.message(),
                db_err.code().code()
            );
            PgError::Postgres(msg)
        } else {
            PgError::Postgres(e.to_string())
        }
    }
}

impl From<deltaflood_core::Error> for PgError {
    fn from(e: deltaflood_core::Error) -> Self {
        match e {
            deltaflood_core::Error::InvalidLsn(lsn) => PgError::InvalidLsn(lsn),
            other => PgError::Replication(other.to_string()),
        }
    }
}

pub type PgResult<T> = Result<T, PgError>;
