use anyhow::Result;
use colored::Colorize;
use deltaflood_core::{EncoderConfig, DEFAULT_SEPARATOR};

use crate::config::ProjectConfig;

/// Print the effective encoder and stream configuration.
pub fn cmd_check(config: &ProjectConfig, encoder: &EncoderConfig) -> Result<()> {
    println!("{}", "Encoder options".bold());
    flag("include-xids", encoder.include_xids);
    flag("include-oids", encoder.include_oids);
    flag("include-lsn", encoder.include_lsn);
    flag("full-name", encoder.full_name);
    flag("skip-nulls", encoder.skip_nulls);
    flag("only-local", encoder.only_local);
    flag("escape-chars", encoder.escape_chars);

    let separator = if encoder.separator == DEFAULT_SEPARATOR {
        "\\t (tab)".to_string()
    } else {
        format!("{:?}", encoder.separator)
    };
    println!("  {:<14} {}", "separator", separator);
    println!("  {:<14} {:?}", "null", encoder.null_text);

    if encoder.filters_tables() {
        let mut tables: Vec<&str> = encoder.table_filter.iter().map(String::as_str).collect();
        tables.sort_unstable();
        println!("  {:<14} {}", "tables", tables.join(", "));
    } else {
        println!("  {:<14} {}", "tables", "(all)".dimmed());
    }

    println!();
    println!("{}", "Stream".bold());
    println!("  {:<14} {}", "slot", config.stream.slot);
    println!("  {:<14} {}", "publication", config.stream.publication);
    if config.stream.tables.is_empty() {
        println!("  {:<14} {}", "tables", "(all)".dimmed());
    } else {
        println!("  {:<14} {}", "tables", config.stream.tables.join(", "));
    }

    let postgres = match config.postgres_connection_string() {
        Ok(_) => "configured".green(),
        Err(_) => "not configured".yellow(),
    };
    println!("  {:<14} {}", "postgres", postgres);

    println!();
    println!("{}", "Configuration OK".green());
    Ok(())
}

fn flag(name: &str, on: bool) {
    let value = if on { "on".green() } else { "off".dimmed() };
    println!("  {:<14} {}", name, value);
}
