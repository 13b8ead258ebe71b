//! Text rendering for column values by Postgres type.
//!
//! Text-format values already are the type's output form. Binary-format
//! values are decoded for the common built-in types; everything else,
//! including values whose length doesn't match the type, falls back to
//! `bytea` hex.

use std::borrow::Cow;

use byteorder::{BigEndian, ByteOrder};
use deltaflood_core::{bytea_hex, Datum, TypeOutput};

pub const BOOLOID: u32 = 16;
pub const BYTEAOID: u32 = 17;
pub const NAMEOID: u32 = 19;
pub const INT8OID: u32 = 20;
pub const INT2OID: u32 = 21;
pub const INT4OID: u32 = 23;
pub const TEXTOID: u32 = 25;
pub const OIDOID: u32 = 26;
pub const FLOAT4OID: u32 = 700;
pub const FLOAT8OID: u32 = 701;
pub const BPCHAROID: u32 = 1042;
pub const VARCHAROID: u32 = 1043;
pub const UUIDOID: u32 = 2950;

/// [`TypeOutput`] aware of Postgres binary send formats.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgTypeOutput;

impl TypeOutput for PgTypeOutput {
    fn output<'a>(&self, type_oid: u32, datum: Datum<'a>) -> Cow<'a, [u8]> {
        match datum {
            Datum::Text(s) => Cow::Borrowed(s.as_bytes()),
            Datum::Binary(b) => match binary_output(type_oid, b) {
                Some(out) => out,
                None => Cow::Owned(bytea_hex(b).into_bytes()),
            },
        }
    }
}

fn binary_output(type_oid: u32, b: &[u8]) -> Option<Cow<'_, [u8]>> {
    let text = match (type_oid, b.len()) {
        (TEXTOID | VARCHAROID | BPCHAROID | NAMEOID, _) => {
            return std::str::from_utf8(b).ok().map(|_| Cow::Borrowed(b));
        }
        (BOOLOID, 1) => (if b[0] != 0 { "t" } else { "f" }).to_string(),
        (INT2OID, 2) => BigEndian::read_i16(b).to_string(),
        (INT4OID, 4) => BigEndian::read_i32(b).to_string(),
        (INT8OID, 8) => BigEndian::read_i64(b).to_string(),
        (OIDOID, 4) => BigEndian::read_u32(b).to_string(),
        (FLOAT4OID, 4) => float_text(BigEndian::read_f32(b)),
        (FLOAT8OID, 8) => float_text(BigEndian::read_f64(b)),
        (UUIDOID, 16) => uuid_text(b),
        _ => return None,
    };
    Some(Cow::Owned(text.into_bytes()))
}

/// Postgres spells the non-finite floats out.
fn float_text<F: Into<f64> + ToString + Copy>(value: F) -> String {
    let wide: f64 = value.into();
    if wide.is_nan() {
        "NaN".to_string()
    } else if wide == f64::INFINITY {
        "Infinity".to_string()
    } else if wide == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        value.to_string()
    }
}

fn uuid_text(b: &[u8]) -> String {
    let hex = hex::encode(b);
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}
