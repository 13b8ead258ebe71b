use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use deltaflood_config::{parse_options, plugin_options, OptionValue, PluginOption};
use deltaflood_core::EncoderConfig;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "deltaflood.toml";

/// Project configuration from deltaflood.toml
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    pub postgres: Option<PostgresConfig>,
    #[serde(default)]
    pub stream: StreamConfig,
    /// Encoder options, same names as `-o`.
    #[serde(default)]
    pub options: BTreeMap<String, OptionValue>,
}

#[derive(Debug, Deserialize)]
pub struct PostgresConfig {
    pub connection_string: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub slot: String,
    pub publication: String,
    /// Tables the publication must cover; empty publishes all tables.
    pub tables: Vec<String>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            slot: "deltaflood".to_string(),
            publication: "deltaflood_pub".to_string(),
            tables: Vec::new(),
        }
    }
}

impl ProjectConfig {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Load `path`, or the default file when `path` is `None`. A missing
    /// default file yields an empty configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Path::new(DEFAULT_CONFIG_FILE),
            None => return Ok(Self::default()),
        };

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Resolve the encoder configuration: file options first, then `cli`.
    pub fn encoder_config(&self, cli: &[PluginOption]) -> Result<EncoderConfig> {
        let mut options: Vec<PluginOption> = plugin_options(&self.options)
            .into_iter()
            .map(|opt| PluginOption {
                value: opt.value.map(|v| resolve_env(&v)),
                ..opt
            })
            .collect();
        options.extend(cli.iter().cloned());

        parse_options(&options).context("Invalid encoder options")
    }

    /// Connection string from `[postgres]`, falling back to `DATABASE_URL`.
    pub fn postgres_connection_string(&self) -> Result<String> {
        match &self.postgres {
            Some(pg) => Ok(resolve_env(&pg.connection_string)),
            None => std::env::var("DATABASE_URL")
                .context("No [postgres] connection_string configured and DATABASE_URL is not set"),
        }
    }
}

/// Replace `${VAR}` references with the variable's value (empty when unset).
pub fn resolve_env(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        out.push_str(&std::env::var(&rest[start + 2..start + 2 + len]).unwrap_or_default());
        rest = &rest[start + 2 + len + 1..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    #[serial]
    fn test_resolve_env() {
        std::env::set_var("DELTAFLOOD_TEST_VAR", "hello");

        assert_eq!(resolve_env("${DELTAFLOOD_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env("prefix_${DELTAFLOOD_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env("no_vars"), "no_vars");
        assert_eq!(resolve_env("${DELTAFLOOD_TEST_UNSET}x"), "x");
        assert_eq!(resolve_env("open ${brace"), "open ${brace");

        std::env::remove_var("DELTAFLOOD_TEST_VAR");
    }

    #[test]
    fn test_parse_full_config() {
        let config = ProjectConfig::parse(
            r#"
            [postgres]
            connection_string = "postgres://localhost/app"

            [stream]
            slot = "orders_slot"
            tables = ["public.orders"]

            [options]
            include-lsn = true
            separator = "|"
            tables = ["orders", "users"]
            "#,
        )
        .unwrap();

        assert_eq!(config.stream.slot, "orders_slot");
        assert_eq!(config.stream.publication, "deltaflood_pub");
        assert_eq!(config.stream.tables, vec!["public.orders"]);

        let encoder = config.encoder_config(&[]).unwrap();
        assert!(encoder.include_lsn);
        assert_eq!(encoder.separator, "|");
        assert!(encoder.admits_table("orders"));
        assert!(!encoder.admits_table("audit"));
    }

    #[test]
    fn test_cli_options_override_file() {
        let config = ProjectConfig::parse(
            r#"
            [options]
            skip-nulls = false
            null = "\\N"
            "#,
        )
        .unwrap();

        let cli = vec![PluginOption::new("skip-nulls", Some("on")), PluginOption::flag("full-name")];
        let encoder = config.encoder_config(&cli).unwrap();
        assert!(encoder.skip_nulls);
        assert!(encoder.full_name);
        assert_eq!(encoder.null_text, "\\N");
    }

    #[test]
    fn test_invalid_option_is_error() {
        let config = ProjectConfig::default();
        let err = config
            .encoder_config(&[PluginOption::new("include-xids", Some("maybe"))])
            .unwrap_err();
        assert!(format!("{:#}", err).contains("include-xids"));
    }

    #[test]
    #[serial]
    fn test_option_values_resolve_env() {
        std::env::set_var("DELTAFLOOD_TEST_SEP", ";");
        let config = ProjectConfig::parse("[options]\nseparator = \"${DELTAFLOOD_TEST_SEP}\"\n").unwrap();
        assert_eq!(config.encoder_config(&[]).unwrap().separator, ";");
        std::env::remove_var("DELTAFLOOD_TEST_SEP");
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert!(ProjectConfig::parse("[sink]\nkind = \"http\"\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[stream]\npublication = \"p\"").unwrap();

        let config = ProjectConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.stream.publication, "p");
        assert_eq!(config.stream.slot, "deltaflood");
    }

    #[test]
    fn test_load_missing_explicit_file_is_error() {
        assert!(ProjectConfig::load(Some(Path::new("/nonexistent/deltaflood.toml"))).is_err());
    }

    #[test]
    #[serial]
    fn test_connection_string_from_env() {
        std::env::set_var("DATABASE_URL", "postgres://env/db");
        let config = ProjectConfig::default();
        assert_eq!(config.postgres_connection_string().unwrap(), "postgres://env/db");

        let config = ProjectConfig::parse("[postgres]\nconnection_string = \"${DATABASE_URL}?sslmode=require\"\n")
            .unwrap();
        assert_eq!(
            config.postgres_connection_string().unwrap(),
            "postgres://env/db?sslmode=require"
        );
        std::env::remove_var("DATABASE_URL");
    }
}
