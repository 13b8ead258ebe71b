use std::str::FromStr;

use deltaflood_core::EncoderConfig;

use crate::error::{ConfigError, ConfigResult};

/// A single `name[=value]` option as supplied at session start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginOption {
    pub name: String,
    /// `None` when the option was given without `=value`.
    pub value: Option<String>,
}

impl PluginOption {
    pub fn new(name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            value: value.map(Into::into),
        }
    }

    /// An option given without a value.
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// Boolean options given without a value mean `true`.
    fn bool_value(&self) -> ConfigResult<bool> {
        match &self.value {
            None => Ok(true),
            Some(v) => parse_bool(v).ok_or_else(|| ConfigError::InvalidBool {
                name: self.name.clone(),
                value: v.clone(),
            }),
        }
    }

    fn required_value(&self) -> ConfigResult<&str> {
        self.value
            .as_deref()
            .ok_or_else(|| ConfigError::MissingValue {
                name: self.name.clone(),
            })
    }

    fn apply(&self, config: &mut EncoderConfig) -> ConfigResult<()> {
        match self.name.as_str() {
            "include-xids" => config.include_xids = self.bool_value()?,
            "include-oids" => config.include_oids = self.bool_value()?,
            "include-lsn" => config.include_lsn = self.bool_value()?,
            "full-name" => config.full_name = self.bool_value()?,
            "skip-nulls" => config.skip_nulls = self.bool_value()?,
            "only-local" => config.only_local = self.bool_value()?,
            "escape-chars" => config.escape_chars = self.bool_value()?,
            "separator" => config.separator = self.required_value()?.to_string(),
            "null" => config.null_text = self.required_value()?.to_string(),
            "tables" => {
                config.table_filter = self
                    .required_value()?
                    .split(',')
                    .map(str::to_string)
                    .collect();
            }
            _ => {
                return Err(ConfigError::UnknownOption {
                    name: self.name.clone(),
                    value: self.value.clone().unwrap_or_else(|| "(null)".to_string()),
                })
            }
        }
        Ok(())
    }
}

impl FromStr for PluginOption {
    type Err = ConfigError;

    /// Parse `name=value` or a bare `name`.
    fn from_str(s: &str) -> ConfigResult<Self> {
        let (name, value) = match s.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (s, None),
        };

        if name.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: s.to_string(),
                message: "option name is empty".into(),
            });
        }

        Ok(PluginOption::new(name, value))
    }
}

/// Resolve a list of options, applied in order over the defaults.
///
/// The first invalid option aborts resolution; no partial configuration is
/// returned.
pub fn parse_options(options: &[PluginOption]) -> ConfigResult<EncoderConfig> {
    let mut config = EncoderConfig::default();
    for option in options {
        option.apply(&mut config)?;
    }
    Ok(config)
}

/// Parse a boolean literal the way Postgres does.
///
/// Accepts any case-insensitive prefix of `true`, `false`, `yes` or `no`,
/// `on`, `off` or `of`, and `1` or `0`. Whitespace is not stripped.
pub fn parse_bool(value: &str) -> Option<bool> {
    let v = value.to_ascii_lowercase();
    let prefix_of = |word: &str| word.starts_with(v.as_str());

    match v.as_bytes().first()? {
        b't' if prefix_of("true") => Some(true),
        b'f' if prefix_of("false") => Some(false),
        b'y' if prefix_of("yes") => Some(true),
        b'n' if prefix_of("no") => Some(false),
        b'o' if v == "on" => Some(true),
        b'o' if v.len() >= 2 && prefix_of("off") => Some(false),
        b'1' if v == "1" => Some(true),
        b'0' if v == "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opt(s: &str) -> PluginOption {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_bool_literals() {
        for v in ["true", "t", "TRUE", "tr", "yes", "y", "on", "1"] {
            assert_eq!(parse_bool(v), Some(true), "{v}");
        }
        for v in ["false", "f", "FaLsE", "no", "n", "off", "of", "0"] {
            assert_eq!(parse_bool(v), Some(false), "{v}");
        }
    }

    #[test]
    fn test_parse_bool_rejects() {
        for v in ["", "  ", "o", "maybe", "truex", "2", "10", "onn", "nope"] {
            assert_eq!(parse_bool(v), None, "{v}");
        }
    }

    #[test]
    fn test_parse_bool_rejects_padding() {
        for v in [" true ", "true ", " 0", "\toff"] {
            assert_eq!(parse_bool(v), None, "{v:?}");
        }

        let err = parse_options(&[opt("include-lsn= on")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBool { .. }));
        assert_eq!(
            err.to_string(),
            "could not parse value \" on\" for parameter \"include-lsn\""
        );
    }

    #[test]
    fn test_option_from_str() {
        assert_eq!(opt("null=\\N"), PluginOption::new("null", Some("\\N")));
        assert_eq!(opt("include-lsn"), PluginOption::flag("include-lsn"));
        assert_eq!(opt("separator="), PluginOption::new("separator", Some("")));
        assert_eq!(opt("a=b=c"), PluginOption::new("a", Some("b=c")));
        assert!("=x".parse::<PluginOption>().is_err());
    }

    #[test]
    fn test_no_options_gives_defaults() {
        assert_eq!(parse_options(&[]).unwrap(), EncoderConfig::default());
    }

    #[test]
    fn test_all_options() {
        let config = parse_options(&[
            opt("include-xids=false"),
            opt("include-oids=off"),
            opt("include-lsn"),
            opt("full-name=yes"),
            opt("skip-nulls=0"),
            opt("only-local=on"),
            opt("escape-chars=f"),
            opt("separator=,"),
            opt("null=\\N"),
            opt("tables=orders,users"),
        ])
        .unwrap();

        assert!(!config.include_xids);
        assert!(!config.include_oids);
        assert!(config.include_lsn);
        assert!(config.full_name);
        assert!(!config.skip_nulls);
        assert!(config.only_local);
        assert!(!config.escape_chars);
        assert_eq!(config.separator, ",");
        assert_eq!(config.null_text, "\\N");
        assert!(config.admits_table("orders"));
        assert!(config.admits_table("users"));
        assert!(!config.admits_table("payments"));
    }

    #[test]
    fn test_bare_bool_means_true() {
        let config = parse_options(&[opt("skip-nulls=false"), opt("skip-nulls")]).unwrap();
        assert!(config.skip_nulls);
    }

    #[test]
    fn test_later_option_wins() {
        let config = parse_options(&[opt("tables=a,b"), opt("tables=c")]).unwrap();
        assert_eq!(config.table_filter.len(), 1);
        assert!(config.admits_table("c"));
    }

    #[test]
    fn test_tables_not_trimmed() {
        let config = parse_options(&[opt("tables=orders, users")]).unwrap();
        assert!(config.admits_table(" users"));
        assert!(!config.admits_table("users"));
    }

    #[test]
    fn test_unknown_option() {
        let err = parse_options(&[opt("bogus=1")]).unwrap_err();
        assert!(matches!(
            &err,
            ConfigError::UnknownOption { name, value } if name == "bogus" && value == "1"
        ));
        assert_eq!(err.to_string(), "option \"bogus\" = \"1\" is unknown");

        let err = parse_options(&[opt("bogus")]).unwrap_err();
        assert_eq!(err.to_string(), "option \"bogus\" = \"(null)\" is unknown");
    }

    #[test]
    fn test_invalid_bool() {
        let err = parse_options(&[opt("include-xids=maybe")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBool { ref name, .. } if name == "include-xids"));
        assert_eq!(
            err.to_string(),
            "could not parse value \"maybe\" for parameter \"include-xids\""
        );
    }

    #[test]
    fn test_missing_values() {
        for name in ["separator", "null", "tables"] {
            let err = parse_options(&[PluginOption::flag(name)]).unwrap_err();
            assert!(
                matches!(&err, ConfigError::MissingValue { name: n } if n == name),
                "{name}"
            );
        }
    }

    #[test]
    fn test_error_aborts_resolution() {
        let result = parse_options(&[opt("include-lsn"), opt("nope"), opt("full-name")]);
        assert!(result.is_err());
    }
}
