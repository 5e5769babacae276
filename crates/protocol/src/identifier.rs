//! 128-bit identifier encoding
//!
//! The legacy generation splits identifiers into `low`/`high` u64 halves,
//! each holding its eight bytes in little-endian order. The newer generation
//! uses the dash-formatted string (8-4-4-4-12 hex groups) of the same sixteen
//! bytes, `low` first.
//!
//! ```
//! use courier_protocol::identifier::{format_uuid, parse_uuid};
//!
//! let text = format_uuid(0xbe4484acc4614f95, 0x41fb1731facd1792);
//! assert_eq!(text, "954f61c4-ac84-44be-9217-cdfa3117fb41");
//! assert_eq!(parse_uuid(&text).unwrap(), (0xbe4484acc4614f95, 0x41fb1731facd1792));
//! ```

use uuid::Uuid;

use crate::wire::v1;
use crate::{ProtocolError, Result};

/// Length of the dash-formatted representation
const HYPHENATED_LEN: usize = 36;

/// Format a `(low, high)` pair as a dash-formatted lowercase UUID string
pub fn format_uuid(low: u64, high: u64) -> String {
    let mut bytes = [0u8; 16];
    bytes[..8].copy_from_slice(&low.to_le_bytes());
    bytes[8..].copy_from_slice(&high.to_le_bytes());
    Uuid::from_bytes(bytes).hyphenated().to_string()
}

/// Parse a dash-formatted UUID string into its `(low, high)` pair
///
/// Only the hyphenated form is accepted; braced, URN and simple forms are
/// rejected so that conversion stays exactly reversible.
pub fn parse_uuid(text: &str) -> Result<(u64, u64)> {
    if text.len() != HYPHENATED_LEN {
        return Err(ProtocolError::InvalidIdentifier(text.to_string()));
    }
    let uuid =
        Uuid::try_parse(text).map_err(|_| ProtocolError::InvalidIdentifier(text.to_string()))?;

    let bytes = uuid.as_bytes();
    let mut low = [0u8; 8];
    let mut high = [0u8; 8];
    low.copy_from_slice(&bytes[..8]);
    high.copy_from_slice(&bytes[8..]);
    Ok((u64::from_le_bytes(low), u64::from_le_bytes(high)))
}

impl v1::Uuid {
    /// Build a legacy identifier from its halves
    #[inline]
    pub fn from_parts(low: u64, high: u64) -> Self {
        Self {
            low: Some(low),
            high: Some(high),
        }
    }

    /// Parse a dash-formatted string into a legacy identifier
    pub fn parse(text: &str) -> Result<Self> {
        let (low, high) = parse_uuid(text)?;
        Ok(Self::from_parts(low, high))
    }

    /// Dash-formatted representation (absent halves encode as zero)
    pub fn to_uuid_string(&self) -> String {
        format_uuid(self.low.unwrap_or(0), self.high.unwrap_or(0))
    }
}

#[cfg(test)]
#[path = "identifier_test.rs"]
mod tests;
