use std::fmt::Write as _;

use bytes::{BufMut, BytesMut};

use crate::config::EncoderConfig;
use crate::ident::quote_qualified_identifier;
use crate::lsn::DisplayLsn;
use crate::output::TypeOutput;
use crate::render::ColumnRenderer;
use crate::split::Image;
use crate::types::ChangeEvent;

/// Builds one delimited line per row image.
///
/// Field order: `_table`, `_qualified_table`, `_oid`, `_xid`, `_lsn`,
/// `_action`, then the columns in declared order. Every field after the
/// first is preceded by the separator; there is no trailing separator or
/// newline.
pub struct LineEncoder<'s> {
    config: &'s EncoderConfig,
    renderer: ColumnRenderer<'s>,
}

impl<'s> LineEncoder<'s> {
    pub fn new(config: &'s EncoderConfig, output: &'s dyn TypeOutput) -> Self {
        Self {
            config,
            renderer: ColumnRenderer::new(config, output),
        }
    }

    /// Append the line for `image` of `event` to `buf`.
    pub fn encode_into(&self, buf: &mut BytesMut, event: &ChangeEvent, image: &Image<'_>) {
        let config = self.config;

        buf.put_slice(b"_table");
        self.put_field(buf, event.table.name.as_bytes());

        if config.full_name {
            self.put_meta(
                buf,
                "_qualified_table",
                quote_qualified_identifier(&event.table.schema, &event.table.name),
            );
        }

        if config.include_oids {
            if let Some(oid) = event.table.object_id {
                self.put_meta(buf, "_oid", oid);
            }
        }

        if config.include_xids {
            self.put_meta(buf, "_xid", event.transaction_id);
        }

        if config.include_lsn {
            self.put_meta(buf, "_lsn", DisplayLsn(event.commit_lsn));
        }

        self.put_meta(buf, "_action", image.action);

        for column in image.tuple.iter() {
            if let Some(rendered) = self.renderer.render(column) {
                self.put_field(buf, &rendered.name);
                self.put_field(buf, &rendered.value);
            }
        }
    }

    fn put_field(&self, buf: &mut BytesMut, field: &[u8]) {
        buf.put_slice(self.config.separator.as_bytes());
        buf.put_slice(field);
    }

    fn put_meta(&self, buf: &mut BytesMut, name: &str, value: impl std::fmt::Display) {
        self.put_field(buf, name.as_bytes());
        buf.put_slice(self.config.separator.as_bytes());
        // BytesMut implements fmt::Write and never fails.
        let _ = write!(buf, "{}", value);
    }
}
