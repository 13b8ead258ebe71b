use std::collections::BTreeMap;

use serde::Deserialize;

use crate::options::PluginOption;

/// An option value as written in TOML.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Integer(i64),
    String(String),
    /// A list of names, joined with `,` (used for `tables`).
    List(Vec<String>),
}

impl OptionValue {
    /// The string form handed to the option parser.
    pub fn to_option_string(&self) -> String {
        match self {
            OptionValue::Bool(b) => b.to_string(),
            OptionValue::Integer(i) => i.to_string(),
            OptionValue::String(s) => s.clone(),
            OptionValue::List(items) => items.join(","),
        }
    }
}

/// Convert a TOML option table into options, in key order:
///
/// ```toml
/// [options]
/// include-lsn = true
/// separator = "|"
/// tables = ["orders", "users"]
/// ```
pub fn plugin_options(table: &BTreeMap<String, OptionValue>) -> Vec<PluginOption> {
    table
        .iter()
        .map(|(name, value)| PluginOption::new(name.as_str(), Some(value.to_option_string())))
        .collect()
}
