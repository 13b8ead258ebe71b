//! Publication management.
//!
//! pgoutput only streams tables that belong to the subscribed publication.

use std::collections::BTreeSet;

use deltaflood_core::{quote_identifier, quote_qualified_identifier};
use tokio_postgres::Client;
use tracing::{debug, info};

use crate::error::{PgError, PgResult};

/// Split `schema.table` into its parts; bare names live in `public`.
pub fn parse_table_ref(table_ref: &str) -> (&str, &str) {
    table_ref.split_once('.').unwrap_or(("public", table_ref))
}

/// SQL text for a table reference, quoting each part as needed.
pub fn table_sql(table_ref: &str) -> String {
    let (schema, table) = parse_table_ref(table_ref);
    quote_qualified_identifier(schema, table)
}

pub async fn publication_exists(client: &Client, publication: &str) -> PgResult<bool> {
    let exists: bool = client
        .query_one(
            "SELECT EXISTS(SELECT 1 FROM pg_publication WHERE pubname = $1)",
            &[&publication],
        )
        .await?
        .get(0);

    Ok(exists)
}

/// Tables in the publication as `schema.table`.
pub async fn publication_tables(client: &Client, publication: &str) -> PgResult<BTreeSet<String>> {
    let rows = client
        .query(
            "SELECT schemaname, tablename FROM pg_publication_tables WHERE pubname = $1",
            &[&publication],
        )
        .await?;

    Ok(rows
        .iter()
        .map(|row| format!("{}.{}", row.get::<_, String>(0), row.get::<_, String>(1)))
        .collect())
}

/// Statement creating `publication` for the given tables, or all tables
/// when `tables` is empty.
pub fn create_publication_sql(publication: &str, tables: &[String]) -> String {
    if tables.is_empty() {
        format!("CREATE PUBLICATION {} FOR ALL TABLES", quote_identifier(publication))
    } else {
        format!(
            "CREATE PUBLICATION {} FOR TABLE {}",
            quote_identifier(publication),
            join_tables(tables)
        )
    }
}

fn join_tables<S: AsRef<str>>(tables: &[S]) -> String {
    tables
        .iter()
        .map(|t| table_sql(t.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

pub async fn drop_publication(client: &Client, publication: &str) -> PgResult<()> {
    info!(publication = %publication, "Dropping publication");
    client
        .execute(
            &format!("DROP PUBLICATION IF EXISTS {}", quote_identifier(publication)),
            &[],
        )
        .await?;

    Ok(())
}

/// Make sure `publication` exists and covers `tables`.
///
/// An empty `tables` means all tables. Existing publications gain any
/// missing tables but never lose any.
pub async fn ensure_publication(
    client: &Client,
    publication: &str,
    tables: &[String],
    create_if_missing: bool,
) -> PgResult<()> {
    if !publication_exists(client, publication).await? {
        if !create_if_missing {
            return Err(PgError::PublicationNotFound(publication.to_string()));
        }
        let sql = create_publication_sql(publication, tables);
        info!(publication = %publication, tables = tables.len(), "Creating publication");
        client.execute(&sql, &[]).await?;
        return Ok(());
    }

    if tables.is_empty() {
        info!(publication = %publication, "Using existing publication");
        return Ok(());
    }

    let current = publication_tables(client, publication).await?;
    let missing: Vec<&String> = tables
        .iter()
        .filter(|t| {
            let (schema, table) = parse_table_ref(t);
            !current.contains(&format!("{}.{}", schema, table))
        })
        .collect();

    debug!(publication = %publication, current = ?current, missing = ?missing, "Checked publication tables");

    if missing.is_empty() {
        return Ok(());
    }

    info!(publication = %publication, missing = missing.len(), "Adding tables to publication");
    client
        .execute(
            &format!(
                "ALTER PUBLICATION {} ADD TABLE {}",
                quote_identifier(publication),
                join_tables(&missing)
            ),
            &[],
        )
        .await
        .map_err(|e| PgError::Replication(format!("failed to extend publication: {}", e)))?;

    Ok(())
}
