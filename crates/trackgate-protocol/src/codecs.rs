//! Byte-level codecs shared by the framing and decoding layers.
//!
//! Everything here operates on plain byte slices: the XOR checksum that
//! seals every binary frame, the transparent-byte escape that keeps the
//! 0x7E delimiter out of frame interiors, packed-BCD timestamps, and the
//! hex renderings used for diagnostics.

use chrono::{DateTime, TimeZone, Utc};
use trackgate_core::{
    constants::{ESCAPED_DELIMITER, ESCAPED_ESCAPE, ESCAPE_BYTE, FRAME_DELIMITER},
    Error, Result,
};

/// XOR of all bytes, seeded with zero.
#[must_use]
pub fn xor_checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc ^ b)
}

/// Apply the transparent-byte escape to an outbound payload.
///
/// `0x7E` becomes `0x7D 0x02` and `0x7D` becomes `0x7D 0x01`, so the
/// result never contains a bare frame delimiter.
#[must_use]
pub fn escape(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 4);
    for &b in payload {
        match b {
            FRAME_DELIMITER => {
                out.push(ESCAPE_BYTE);
                out.push(ESCAPED_DELIMITER);
            }
            ESCAPE_BYTE => {
                out.push(ESCAPE_BYTE);
                out.push(ESCAPED_ESCAPE);
            }
            _ => out.push(b),
        }
    }
    out
}

/// Reverse the transparent-byte escape on a frame interior.
///
/// # Errors
/// Returns `Error::Framing` if an `0x7D` is followed by anything other
/// than `0x01`/`0x02`, or if the interior ends on a lone `0x7D`.
pub fn unescape(interior: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(interior.len());
    let mut iter = interior.iter();
    while let Some(&b) = iter.next() {
        if b != ESCAPE_BYTE {
            out.push(b);
            continue;
        }
        match iter.next() {
            Some(&ESCAPED_ESCAPE) => out.push(ESCAPE_BYTE),
            Some(&ESCAPED_DELIMITER) => out.push(FRAME_DELIMITER),
            Some(&other) => {
                return Err(Error::Framing {
                    message: format!("invalid escape sequence 7d {other:02x}"),
                });
            }
            None => {
                return Err(Error::Framing {
                    message: "frame interior ends with a lone escape byte".to_string(),
                });
            }
        }
    }
    Ok(out)
}

fn bcd_value(byte: u8) -> Result<u32> {
    let hi = u32::from(byte >> 4);
    let lo = u32::from(byte & 0x0F);
    if hi > 9 || lo > 9 {
        return Err(Error::Timestamp {
            message: format!("byte {byte:02x} is not packed BCD"),
        });
    }
    Ok(hi * 10 + lo)
}

/// Decode a six-byte packed-BCD timestamp (YY MM DD hh mm ss) as UTC.
///
/// Two-digit years below 80 map to 2000+YY, the rest to 1900+YY.
///
/// # Errors
/// Returns `Error::Timestamp` if the slice is not six bytes, a nibble is
/// not a decimal digit, or the fields do not form a valid UTC instant.
pub fn bcd_datetime(bytes: &[u8]) -> Result<DateTime<Utc>> {
    if bytes.len() != 6 {
        return Err(Error::Timestamp {
            message: format!("expected 6 BCD bytes, got {}", bytes.len()),
        });
    }
    let yy = bcd_value(bytes[0])?;
    let month = bcd_value(bytes[1])?;
    let day = bcd_value(bytes[2])?;
    let hour = bcd_value(bytes[3])?;
    let minute = bcd_value(bytes[4])?;
    let second = bcd_value(bytes[5])?;

    let year = if yy < 80 { 2000 + yy } else { 1900 + yy } as i32;

    Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
        .single()
        .ok_or_else(|| Error::Timestamp {
            message: format!("{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02} is not a valid UTC instant"),
        })
}

/// Assemble a UTC instant from two-digit date/time components using the
/// same century rule as [`bcd_datetime`].
pub fn utc_from_parts(
    yy: u32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> Result<DateTime<Utc>> {
    let year = if yy < 80 { 2000 + yy } else { 1900 + yy } as i32;
    Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
        .single()
        .ok_or_else(|| Error::Timestamp {
            message: format!("{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02} is not a valid UTC instant"),
        })
}

/// Lowercase hex, two digits per byte, space separated. Log rendering.
#[must_use]
pub fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lowercase hex with no separators. Used for opaque TLV values.
#[must_use]
pub fn hex_str(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
