//! Streaming replication client built on pgwire-replication.

use std::time::Duration;

use pgwire_replication::{
    Lsn, ReplicationClient, ReplicationConfig as PgwireConfig, ReplicationEvent, TlsConfig,
};
use tokio_postgres::Client;
use tracing::{debug, info, trace, warn};

use deltaflood_core::DisplayLsn;

use super::assembler::{ChangeAssembler, Transaction};
use super::pgoutput::decode_message;
use super::publication::ensure_publication;
use super::slot::ensure_slot;
use crate::connect::ConnectionParams;
use crate::error::{PgError, PgResult};

#[derive(Debug, Clone)]
pub struct ReplicationStreamConfig {
    pub connection_string: String,
    pub slot_name: String,
    pub publication_name: String,
    /// Create the slot when it does not exist.
    pub create_slot: bool,
    /// Create the publication when it does not exist.
    pub create_publication: bool,
    /// `schema.table` (or bare `table`) entries; empty means all tables.
    pub publication_tables: Vec<String>,
    /// Resume position; defaults to the slot's confirmed flush LSN.
    pub start_lsn: Option<u64>,
    pub status_interval: Duration,
}

impl Default for ReplicationStreamConfig {
    fn default() -> Self {
        Self {
            connection_string: String::new(),
            slot_name: "deltaflood".to_string(),
            publication_name: "deltaflood_pub".to_string(),
            create_slot: false,
            create_publication: true,
            publication_tables: Vec::new(),
            start_lsn: None,
            status_interval: Duration::from_secs(10),
        }
    }
}

/// Push-based change stream yielding one [`Transaction`] per commit.
pub struct ReplicationStream {
    client: ReplicationClient,
    assembler: ChangeAssembler,
    ack_lsn: u64,
}

impl ReplicationStream {
    /// Prepare slot and publication over `control_client`, then open the
    /// replication connection.
    pub async fn connect(config: ReplicationStreamConfig, control_client: &Client) -> PgResult<Self> {
        info!(
            slot = %config.slot_name,
            publication = %config.publication_name,
            "Connecting for streaming replication"
        );

        let slot = ensure_slot(control_client, &config.slot_name, config.create_slot).await?;
        ensure_publication(
            control_client,
            &config.publication_name,
            &config.publication_tables,
            config.create_publication,
        )
        .await?;

        let start_lsn = config
            .start_lsn
            .or(slot.confirmed_flush_lsn)
            .unwrap_or(0);

        let params = ConnectionParams::parse(&config.connection_string)?;
        let tls = tls_config(params.sslmode.as_deref());

        debug!(
            host = %params.host,
            port = params.port,
            user = %params.user,
            database = %params.database,
            sslmode = ?params.sslmode,
            "Opening replication connection"
        );

        let pgwire_config = PgwireConfig {
            host: params.host,
            port: params.port,
            user: params.user,
            password: params.password,
            database: params.database,
            slot: config.slot_name,
            publication: config.publication_name,
            start_lsn: Lsn::from(start_lsn),
            stop_at_lsn: None,
            status_interval: config.status_interval,
            idle_wakeup_interval: Duration::from_secs(10),
            buffer_events: 8192,
            tls,
        };

        let client = ReplicationClient::connect(pgwire_config).await.map_err(|e| {
            warn!(error = %e, "Replication connection failed");
            PgError::Replication(e.to_string())
        })?;

        info!(start_lsn = %DisplayLsn(start_lsn), "Replication stream started");

        Ok(Self {
            client,
            assembler: ChangeAssembler::new(),
            ack_lsn: start_lsn,
        })
    }

    /// Wait for the next committed transaction. `None` once the stream ends.
    pub async fn recv_transaction(&mut self) -> PgResult<Option<Transaction>> {
        loop {
            let event = self
                .client
                .recv()
                .await
                .map_err(|e| PgError::Replication(e.to_string()))?;

            let Some(event) = event else {
                info!("Replication stream ended");
                return Ok(None);
            };

            match event {
                ReplicationEvent::XLogData { wal_end, data, .. } => {
                    let msg = decode_message(&data)?;
                    trace!(wal_end = %DisplayLsn(wal_end.into()), msg = ?msg, "XLogData");
                    if let Some(txn) = self.assembler.apply(&msg)? {
                        return Ok(Some(txn));
                    }
                }
                ReplicationEvent::KeepAlive {
                    wal_end,
                    reply_requested,
                    ..
                } => {
                    trace!(wal_end = %DisplayLsn(wal_end.into()), reply_requested, "Keepalive");
                }
                ReplicationEvent::StoppedAt { reached } => {
                    info!(lsn = %DisplayLsn(reached.into()), "Stream stopped");
                    return Ok(None);
                }
                // Depending on version, pgwire-replication may surface
                // transaction boundaries as protocol events as well.
                ReplicationEvent::Begin { xid, .. } => {
                    self.assembler.begin(xid, None);
                }
                ReplicationEvent::Commit { end_lsn, .. } => {
                    if let Some(txn) = self.assembler.commit(None, end_lsn.into()) {
                        return Ok(Some(txn));
                    }
                }
            }
        }
    }

    /// Report everything up to `lsn` as durably handled. Positions at or
    /// behind the last acknowledgement are ignored.
    pub fn acknowledge(&mut self, lsn: u64) {
        if lsn <= self.ack_lsn {
            return;
        }
        debug!(
            lsn = %DisplayLsn(lsn),
            prev = %DisplayLsn(self.ack_lsn),
            "Acknowledging LSN"
        );
        self.client.update_applied_lsn(Lsn::from(lsn));
        self.ack_lsn = lsn;
    }

    pub fn ack_lsn(&self) -> u64 {
        self.ack_lsn
    }
}

fn tls_config(sslmode: Option<&str>) -> TlsConfig {
    match sslmode {
        Some("require") => TlsConfig::require(),
        Some("verify-ca") => TlsConfig::verify_ca(None),
        Some("verify-full") => TlsConfig::verify_full(None),
        _ => TlsConfig::disabled(),
    }
}
