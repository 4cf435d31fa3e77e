//! Message header decoding for the binary variant.
//!
//! Input is the checksum-validated payload produced by
//! [`frame::open_binary`](crate::frame::open_binary): a 12-byte header
//! (16 with the subpackage pair) followed by the body.
//!
//! Layout:
//!
//! ```text
//! 0      2      4            10     12            [16]
//! msg_id props  terminal BCD  seq   [total index]  body…
//! ```
//!
//! The properties word carries the body length in its low 10 bits and
//! the subpackage flag in bit 13; encryption bits are ignored. The
//! subpackage pair is surfaced but never reassembled here.

use crate::frame;
use trackgate_core::{
    constants::{HEADER_LEN, HEADER_LEN_SUBPACKAGE, PROPS_BODY_LEN_MASK, PROPS_SUBPACKAGE_FLAG},
    Error, MessageId, Result, TerminalId,
};

/// Subpackage indices attached to a fragmented message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubpackageInfo {
    pub total: u16,
    pub index: u16,
}

/// Decoded binary message header.
#[derive(Debug, Clone)]
pub struct FrameHeader {
    pub message_id: MessageId,
    /// Raw properties word as received.
    pub properties: u16,
    /// Body length declared in the properties word.
    pub body_len: usize,
    /// Present when the subpackage flag (properties bit 13) is set.
    pub subpackage: Option<SubpackageInfo>,
    pub terminal: TerminalId,
    pub sequence: u16,
}

impl FrameHeader {
    /// Decode a header from a validated payload, returning the header and
    /// the body slice.
    ///
    /// # Errors
    /// - `Error::Length` if the payload is shorter than the header, or if
    ///   the declared body length does not match the bytes actually
    ///   present after the header
    /// - `Error::Terminal` if the BCD terminal field is malformed
    pub fn decode(payload: &[u8]) -> Result<(FrameHeader, &[u8])> {
        if payload.len() < HEADER_LEN {
            return Err(Error::Length {
                message: format!(
                    "payload holds {} bytes, header needs {HEADER_LEN}",
                    payload.len()
                ),
            });
        }

        let message_id = MessageId::from_u16(u16::from_be_bytes([payload[0], payload[1]]));
        let properties = u16::from_be_bytes([payload[2], payload[3]]);
        let body_len = usize::from(properties & PROPS_BODY_LEN_MASK);
        let terminal = TerminalId::from_bcd(&payload[4..10])?;
        let sequence = u16::from_be_bytes([payload[10], payload[11]]);

        let (subpackage, body_start) = if properties & PROPS_SUBPACKAGE_FLAG != 0 {
            if payload.len() < HEADER_LEN_SUBPACKAGE {
                return Err(Error::Length {
                    message: format!(
                        "subpackaged payload holds {} bytes, header needs {HEADER_LEN_SUBPACKAGE}",
                        payload.len()
                    ),
                });
            }
            let info = SubpackageInfo {
                total: u16::from_be_bytes([payload[12], payload[13]]),
                index: u16::from_be_bytes([payload[14], payload[15]]),
            };
            (Some(info), HEADER_LEN_SUBPACKAGE)
        } else {
            (None, HEADER_LEN)
        };

        let body = &payload[body_start..];
        if body.len() != body_len {
            return Err(Error::Length {
                message: format!(
                    "properties declare a {body_len}-byte body but {} bytes follow the header",
                    body.len()
                ),
            });
        }

        Ok((
            FrameHeader {
                message_id,
                properties,
                body_len,
                subpackage,
                terminal,
                sequence,
            },
            body,
        ))
    }

    /// Decode straight from an escaped frame interior: unescape, verify
    /// the checksum, then decode the header.
    pub fn from_interior(interior: &[u8]) -> Result<(FrameHeader, Vec<u8>)> {
        let payload = frame::open_binary(interior)?;
        let (header, body) = Self::decode(&payload)?;
        let body = body.to_vec();
        Ok((header, body))
    }
}
