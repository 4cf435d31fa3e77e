//! Frame representation and the open/seal operations at the trust
//! boundary between raw bytes and decoded messages.
//!
//! A [`RawFrame`] is what the reframer hands up: the interior of one
//! delimited wire frame, still escaped for the binary variant. Opening a
//! binary frame unescapes it and validates the trailing XOR checksum;
//! sealing does the inverse for outbound responses.

use crate::codecs::{escape, hex_dump, unescape, xor_checksum};
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;
use trackgate_core::{constants::FRAME_DELIMITER, Error, Result};

/// One reframed wire message, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawFrame {
    /// Interior between two 0x7E sentinels, transparent bytes still escaped.
    Binary(Bytes),
    /// Interior between '*' and '#', already known to be ASCII text.
    Ascii(String),
}

impl RawFrame {
    /// Hex rendering of the frame content for diagnostics.
    #[must_use]
    pub fn to_hex(&self) -> String {
        match self {
            RawFrame::Binary(interior) => hex_dump(interior),
            RawFrame::Ascii(text) => hex_dump(text.as_bytes()),
        }
    }
}

impl fmt::Display for RawFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawFrame::Binary(interior) => {
                write!(f, "Frame[binary, {} bytes: {}]", interior.len(), hex_dump(interior))
            }
            RawFrame::Ascii(text) => write!(f, "Frame[ascii: '{text}']"),
        }
    }
}

/// Unescape a binary frame interior and validate its trailing checksum.
///
/// Returns the header+body payload with the checksum byte removed.
///
/// # Errors
/// - `Error::Framing` on a malformed escape sequence
/// - `Error::Length` if fewer than two bytes remain after unescaping
/// - `Error::Checksum` if the XOR over the payload does not match the
///   trailing byte
pub fn open_binary(interior: &[u8]) -> Result<Vec<u8>> {
    let unescaped = unescape(interior)?;
    if unescaped.len() < 2 {
        return Err(Error::Length {
            message: format!(
                "frame interior holds {} bytes, too short for a checksum",
                unescaped.len()
            ),
        });
    }
    let (payload, trailer) = unescaped.split_at(unescaped.len() - 1);
    let computed = xor_checksum(payload);
    if computed != trailer[0] {
        return Err(Error::Checksum {
            computed,
            received: trailer[0],
        });
    }
    Ok(payload.to_vec())
}

/// Seal a header+body payload into a complete outbound wire frame:
/// append the XOR checksum, escape transparent bytes, bracket with 0x7E.
#[must_use]
pub fn seal(payload: &[u8]) -> Bytes {
    let mut with_checksum = Vec::with_capacity(payload.len() + 1);
    with_checksum.extend_from_slice(payload);
    with_checksum.push(xor_checksum(payload));

    let escaped = escape(&with_checksum);
    let mut out = BytesMut::with_capacity(escaped.len() + 2);
    out.put_u8(FRAME_DELIMITER);
    out.put_slice(&escaped);
    out.put_u8(FRAME_DELIMITER);
    out.freeze()
}
