//! Wire generations
//!
//! Both generations are plain prost messages. Field numbers follow the
//! byte formats producers already emit, so no code generation step is
//! needed.
//!
//! - [`v1`] - legacy flat envelope with a type code
//! - [`v2`] - source-id envelope with a typed tag map and `oneof` payload

pub mod v1;
pub mod v2;

use prost::Message;

use crate::{ProtocolError, Result};

/// Decode a legacy envelope from bytes
///
/// Only the byte structure is checked here; required-field and payload
/// checks happen when converting into [`crate::Envelope`].
pub fn decode_v1(bytes: &[u8]) -> Result<v1::Envelope> {
    v1::Envelope::decode(bytes).map_err(ProtocolError::Decode)
}

/// Decode a newer-generation envelope from bytes
pub fn decode_v2(bytes: &[u8]) -> Result<v2::Envelope> {
    v2::Envelope::decode(bytes).map_err(ProtocolError::Decode)
}
