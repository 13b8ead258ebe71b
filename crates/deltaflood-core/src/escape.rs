//! Control-character escaping for rendered fields.
//!
//! Tab becomes `\t`, newline becomes `\n`, and any other byte below `' '`
//! becomes a three-digit octal escape (`\001`). Everything else, including
//! backslashes and bytes above 0x7F, passes through untouched.

use std::borrow::Cow;

use bytes::{BufMut, BytesMut};

fn needs_escape(b: u8) -> bool {
    b < b' '
}

/// Append `raw` to `buf`, escaping control bytes.
pub(crate) fn escape_into(buf: &mut BytesMut, raw: &[u8]) {
    let mut start = 0;
    for (i, &b) in raw.iter().enumerate() {
        if !needs_escape(b) {
            continue;
        }
        buf.put_slice(&raw[start..i]);
        match b {
            b'\t' => buf.put_slice(b"\\t"),
            b'\n' => buf.put_slice(b"\\n"),
            _ => buf.put_slice(&[b'\\', b'0' + (b >> 6), b'0' + ((b >> 3) & 7), b'0' + (b & 7)]),
        }
        start = i + 1;
    }
    buf.put_slice(&raw[start..]);
}

/// Escape `raw`, borrowing it when nothing needs escaping.
pub fn escape(raw: &[u8]) -> Cow<'_, [u8]> {
    if !raw.iter().copied().any(needs_escape) {
        return Cow::Borrowed(raw);
    }
    let mut buf = BytesMut::with_capacity(raw.len() + 8);
    escape_into(&mut buf, raw);
    Cow::Owned(buf.to_vec())
}
