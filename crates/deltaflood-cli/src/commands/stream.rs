use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use deltaflood_core::{format_lsn, EncoderConfig, Session};
use deltaflood_pg::{connect_postgres, PgTypeOutput, ReplicationStream, ReplicationStreamConfig};
use tracing::{debug, info};

use crate::config::ProjectConfig;
use crate::output::open_sink;

/// Command-line overrides for `stream`.
#[derive(Debug, Default)]
pub struct StreamArgs {
    pub slot: Option<String>,
    pub publication: Option<String>,
    pub create_slot: bool,
    pub output: Option<PathBuf>,
}

/// Stream committed transactions from the slot until the server stops
/// sending or Ctrl-C, acknowledging each one once its lines are flushed.
pub async fn cmd_stream(config: &ProjectConfig, encoder: EncoderConfig, args: StreamArgs) -> Result<()> {
    let connection_string = config.postgres_connection_string()?;
    let control = connect_postgres(&connection_string)
        .await
        .context("Failed to connect to Postgres")?;

    let stream_config = ReplicationStreamConfig {
        connection_string,
        slot_name: args.slot.unwrap_or_else(|| config.stream.slot.clone()),
        publication_name: args
            .publication
            .unwrap_or_else(|| config.stream.publication.clone()),
        create_slot: args.create_slot,
        publication_tables: config.stream.tables.clone(),
        ..Default::default()
    };
    let slot = stream_config.slot_name.clone();

    let mut stream = ReplicationStream::connect(stream_config, &control)
        .await
        .with_context(|| format!("Failed to start replication from slot '{}'", slot))?;

    let mut sink = open_sink(args.output.as_deref())?;
    let mut session = Session::with_output(encoder, PgTypeOutput);

    info!(slot = %slot, "Streaming changes, press Ctrl-C to stop");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let txn = tokio::select! {
            _ = &mut shutdown => {
                info!("Received Ctrl-C, shutting down");
                break;
            }
            txn = stream.recv_transaction() => txn.context("Replication stream failed")?,
        };

        let Some(txn) = txn else {
            break;
        };

        for event in &txn.events {
            session
                .handle_event(event, &mut sink)
                .context("Failed to write output")?;
        }
        sink.flush().context("Failed to flush output")?;
        stream.acknowledge(txn.end_lsn);

        debug!(
            xid = txn.xid,
            events = txn.events.len(),
            lsn = %format_lsn(txn.end_lsn),
            "Transaction written"
        );
    }

    sink.flush().context("Failed to flush output")?;
    let stats = session.shutdown();

    eprintln!(
        "{} {} events ({} filtered, {} without image), {} lines, acknowledged up to {}",
        "Stopped.".green(),
        stats.events,
        stats.filtered,
        stats.empty,
        stats.lines,
        format_lsn(stream.ack_lsn())
    );
    Ok(())
}
