use std::borrow::Cow;

use crate::types::Datum;

/// Converts a resolved column value into its canonical text form.
pub trait TypeOutput: Send + Sync {
    /// Render `datum`, declared with type `type_oid`, as text bytes.
    fn output<'a>(&self, type_oid: u32, datum: Datum<'a>) -> Cow<'a, [u8]>;
}

/// Uses text values as-is and renders binary values in `bytea` hex form.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerbatimOutput;

impl TypeOutput for VerbatimOutput {
    fn output<'a>(&self, _type_oid: u32, datum: Datum<'a>) -> Cow<'a, [u8]> {
        match datum {
            Datum::Text(s) => Cow::Borrowed(s.as_bytes()),
            Datum::Binary(b) => Cow::Owned(bytea_hex(b).into_bytes()),
        }
    }
}

/// Format bytes the way Postgres prints `bytea` with `bytea_output = hex`.
pub fn bytea_hex(bytes: &[u8]) -> String {
    format!("\\x{}", hex::encode(bytes))
}
