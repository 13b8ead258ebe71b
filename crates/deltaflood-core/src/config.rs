use std::collections::HashSet;

/// Field separator used when none is configured.
pub const DEFAULT_SEPARATOR: &str = "\t";

/// Placeholder rendered for nulls when they are not skipped.
pub const DEFAULT_NULL_TEXT: &str = "NULL";

/// Formatting options for a session, resolved once at start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Emit `_xid`.
    pub include_xids: bool,
    /// Emit `_oid` when the table carries an object id.
    pub include_oids: bool,
    /// Emit `_lsn`.
    pub include_lsn: bool,
    /// Emit `_qualified_table`.
    pub full_name: bool,
    /// Omit null columns instead of rendering `null_text`.
    pub skip_nulls: bool,
    /// Drop changes that arrived through replication.
    pub only_local: bool,
    /// Escape control characters in column names and values.
    pub escape_chars: bool,
    /// Allow-list of unqualified table names; empty admits every table.
    pub table_filter: HashSet<String>,
    pub separator: String,
    pub null_text: String,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            include_xids: true,
            include_oids: true,
            include_lsn: false,
            full_name: false,
            skip_nulls: true,
            only_local: false,
            escape_chars: true,
            table_filter: HashSet::new(),
            separator: DEFAULT_SEPARATOR.to_string(),
            null_text: DEFAULT_NULL_TEXT.to_string(),
        }
    }
}

impl EncoderConfig {
    /// Create a builder starting from the default options.
    pub fn builder() -> EncoderConfigBuilder {
        EncoderConfigBuilder::default()
    }

    /// Whether a table allow-list is in effect.
    pub fn filters_tables(&self) -> bool {
        !self.table_filter.is_empty()
    }

    /// Check whether `table` passes the allow-list.
    pub fn admits_table(&self, table: &str) -> bool {
        self.table_filter.is_empty() || self.table_filter.contains(table)
    }
}

/// Builder for constructing an EncoderConfig.
#[derive(Debug, Default)]
pub struct EncoderConfigBuilder {
    config: EncoderConfig,
}

impl EncoderConfigBuilder {
    pub fn include_xids(mut self, on: bool) -> Self {
        self.config.include_xids = on;
        self
    }

    pub fn include_oids(mut self, on: bool) -> Self {
        self.config.include_oids = on;
        self
    }

    pub fn include_lsn(mut self, on: bool) -> Self {
        self.config.include_lsn = on;
        self
    }

    pub fn full_name(mut self, on: bool) -> Self {
        self.config.full_name = on;
        self
    }

    pub fn skip_nulls(mut self, on: bool) -> Self {
        self.config.skip_nulls = on;
        self
    }

    pub fn only_local(mut self, on: bool) -> Self {
        self.config.only_local = on;
        self
    }

    pub fn escape_chars(mut self, on: bool) -> Self {
        self.config.escape_chars = on;
        self
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.config.separator = separator.into();
        self
    }

    pub fn null_text(mut self, null_text: impl Into<String>) -> Self {
        self.config.null_text = null_text.into();
        self
    }

    /// Replace the table allow-list.
    pub fn tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.table_filter = tables.into_iter().map(Into::into).collect();
        self
    }

    pub fn build(self) -> EncoderConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EncoderConfig::default();
        assert!(config.include_xids);
        assert!(config.include_oids);
        assert!(!config.include_lsn);
        assert!(!config.full_name);
        assert!(config.skip_nulls);
        assert!(!config.only_local);
        assert!(config.escape_chars);
        assert!(!config.filters_tables());
        assert_eq!(config.separator, "\t");
        assert_eq!(config.null_text, "NULL");
    }

    #[test]
    fn test_builder() {
        let config = EncoderConfig::builder()
            .include_xids(false)
            .include_lsn(true)
            .separator("|")
            .null_text("\\N")
            .tables(["orders", "users"])
            .build();

        assert!(!config.include_xids);
        assert!(config.include_lsn);
        assert_eq!(config.separator, "|");
        assert_eq!(config.null_text, "\\N");
        assert!(config.filters_tables());
        assert!(config.admits_table("orders"));
        assert!(!config.admits_table("payments"));
    }

    #[test]
    fn test_empty_filter_admits_everything() {
        let config = EncoderConfig::default();
        assert!(config.admits_table("anything"));
    }
}
