use bytes::Bytes;

use crate::error::{BridgeError, Result};

const HEX_PREFIX: &str = "hex:";

/// Decode a hex string (two digits per byte, either case).
pub fn decode_hex(encoded: &str) -> Result<Bytes> {
    hex::decode(encoded)
        .map(Bytes::from)
        .map_err(|source| BridgeError::InvalidHex {
            value: encoded.to_string(),
            source,
        })
}

/// Decode a configuration value.
///
/// Values prefixed with `hex:` are hex-decoded, so control characters such
/// as `hex:0D0A` can be configured; anything else is taken literally.
pub fn decode_value(input: &str) -> Result<Bytes> {
    match input.strip_prefix(HEX_PREFIX) {
        Some(encoded) => decode_hex(encoded),
        None => Ok(Bytes::copy_from_slice(input.as_bytes())),
    }
}
