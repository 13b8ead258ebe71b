//! LSN (Log Sequence Number) formatting.

use crate::error::{Error, Result};

/// Parse LSN from "X/Y" format to u64.
pub fn parse_lsn(lsn: &str) -> Result<u64> {
    let (high, low) = lsn
        .split_once('/')
        .ok_or_else(|| Error::InvalidLsn(lsn.to_string()))?;

    let high = u32::from_str_radix(high, 16).map_err(|_| Error::InvalidLsn(lsn.to_string()))?;
    let low = u32::from_str_radix(low, 16).map_err(|_| Error::InvalidLsn(lsn.to_string()))?;

    Ok(((high as u64) << 32) | low as u64)
}

/// Format u64 LSN to "X/Y" format, both halves in unpadded upper-case hex.
pub fn format_lsn(lsn: u64) -> String {
    format!("{}", DisplayLsn(lsn))
}

/// `Display` adapter that writes an LSN without allocating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayLsn(pub u64);

impl std::fmt::Display for DisplayLsn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:X}/{:X}", self.0 >> 32, self.0 & 0xFFFF_FFFF)
    }
}
