use std::borrow::Cow;

use crate::config::EncoderConfig;
use crate::escape::escape;
use crate::output::TypeOutput;
use crate::types::{Column, ColumnValue};

/// The name and value fields rendered for one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedColumn<'a> {
    pub name: Cow<'a, [u8]>,
    pub value: Cow<'a, [u8]>,
}

/// Renders columns according to the session's null and escaping policy.
pub struct ColumnRenderer<'s> {
    config: &'s EncoderConfig,
    output: &'s dyn TypeOutput,
}

impl<'s> ColumnRenderer<'s> {
    pub fn new(config: &'s EncoderConfig, output: &'s dyn TypeOutput) -> Self {
        Self { config, output }
    }

    /// Render a column, or `None` when it contributes nothing to the line.
    ///
    /// Dropped, system and unresolved out-of-line columns are always skipped;
    /// nulls are skipped only under `skip-nulls`.
    pub fn render<'a>(&self, column: &'a Column) -> Option<RenderedColumn<'a>>
    where
        's: 'a,
    {
        if column.is_dropped || column.is_system {
            return None;
        }

        let value: Cow<'a, [u8]> = match &column.value {
            ColumnValue::Unresolved => return None,
            ColumnValue::Null if self.config.skip_nulls => return None,
            ColumnValue::Null => Cow::Borrowed(self.config.null_text.as_bytes()),
            other => {
                let datum = other.datum()?;
                self.output.output(column.type_oid, datum)
            }
        };

        let name = column.name.as_bytes();
        if !self.config.escape_chars {
            return Some(RenderedColumn {
                name: Cow::Borrowed(name),
                value,
            });
        }

        Some(RenderedColumn {
            name: escape(name),
            value: match value {
                Cow::Borrowed(v) => escape(v),
                Cow::Owned(v) => Cow::Owned(escape(&v).into_owned()),
            },
        })
    }
}
