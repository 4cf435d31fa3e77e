use crate::{
    constants::{TERMINAL_BCD_LEN, TERMINAL_DIGITS},
    error::Error,
    Result,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal identifier (device phone number or IMEI fragment)
///
/// Carried on the wire as six packed BCD bytes, rendered as a decimal
/// string with leading zeros stripped. The stripped form is used for
/// display and for keying, so two ids that differ only in leading zeros
/// compare equal.
///
/// # Example
/// ```
/// use trackgate_core::TerminalId;
///
/// let id = TerminalId::new("013800138000").unwrap();
/// assert_eq!(id.as_str(), "13800138000");
/// assert_eq!(id.to_bcd(), [0x01, 0x38, 0x00, 0x13, 0x80, 0x00]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TerminalId(String);

impl TerminalId {
    /// Create a terminal id from a decimal string.
    ///
    /// Leading zeros are stripped; an all-zero id normalises to `"0"`.
    ///
    /// # Errors
    /// Returns `Error::Terminal` if the input is empty, longer than 12
    /// characters, or contains a non-digit.
    pub fn new(id: &str) -> Result<Self> {
        let id = id.trim();
        if id.is_empty() || id.len() > TERMINAL_DIGITS {
            return Err(Error::Terminal {
                message: format!("terminal id must be 1-{TERMINAL_DIGITS} digits, got {id:?}"),
            });
        }
        if !id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::Terminal {
                message: format!("terminal id must be decimal digits, got {id:?}"),
            });
        }
        Ok(TerminalId(Self::strip(id)))
    }

    /// Decode a terminal id from its packed BCD wire form.
    ///
    /// Each byte contributes its high then low nibble; nibbles above 9 are
    /// padding and are skipped.
    ///
    /// # Errors
    /// Returns `Error::Terminal` if the slice is not exactly 6 bytes.
    pub fn from_bcd(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != TERMINAL_BCD_LEN {
            return Err(Error::Terminal {
                message: format!(
                    "terminal BCD field must be {TERMINAL_BCD_LEN} bytes, got {}",
                    bytes.len()
                ),
            });
        }
        let mut digits = String::with_capacity(TERMINAL_DIGITS);
        for &b in bytes {
            for nibble in [b >> 4, b & 0x0F] {
                if nibble <= 9 {
                    digits.push(char::from(b'0' + nibble));
                }
            }
        }
        Ok(TerminalId(Self::strip(&digits)))
    }

    /// Pack into the six-byte BCD wire form, left-padded with zero digits.
    #[must_use]
    pub fn to_bcd(&self) -> [u8; TERMINAL_BCD_LEN] {
        let padded = format!("{:0>width$}", self.0, width = TERMINAL_DIGITS);
        let digits = &padded.as_bytes()[padded.len() - TERMINAL_DIGITS..];
        let mut out = [0u8; TERMINAL_BCD_LEN];
        for (i, pair) in digits.chunks_exact(2).enumerate() {
            let hi = (pair[0] as char).to_digit(10).unwrap_or(0) as u8;
            let lo = (pair[1] as char).to_digit(10).unwrap_or(0) as u8;
            out[i] = (hi << 4) | lo;
        }
        out
    }

    /// Get the stripped decimal form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn strip(digits: &str) -> String {
        let stripped = digits.trim_start_matches('0');
        if stripped.is_empty() {
            "0".to_string()
        } else {
            stripped.to_string()
        }
    }
}

impl fmt::Display for TerminalId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TerminalId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TerminalId::new(s)
    }
}

/// Message identifier carried in the first two header bytes.
///
/// The dispatch set is closed; everything else lands in `Other` and is
/// surfaced informationally rather than acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageId {
    /// 0x0002 terminal heartbeat
    TerminalHeartbeat,
    /// 0x0100 terminal registration
    TerminalRegister,
    /// 0x0102 terminal authentication
    TerminalAuth,
    /// 0x0200 location report
    LocationReport,
    /// 0x8001 platform general response
    PlatformAck,
    /// 0x8100 terminal registration response
    RegisterAck,
    /// Any id without a dispatch rule
    Other(u16),
}

impl MessageId {
    #[must_use]
    pub fn from_u16(id: u16) -> Self {
        match id {
            0x0002 => MessageId::TerminalHeartbeat,
            0x0100 => MessageId::TerminalRegister,
            0x0102 => MessageId::TerminalAuth,
            0x0200 => MessageId::LocationReport,
            0x8001 => MessageId::PlatformAck,
            0x8100 => MessageId::RegisterAck,
            other => MessageId::Other(other),
        }
    }

    #[must_use]
    pub fn as_u16(self) -> u16 {
        match self {
            MessageId::TerminalHeartbeat => 0x0002,
            MessageId::TerminalRegister => 0x0100,
            MessageId::TerminalAuth => 0x0102,
            MessageId::LocationReport => 0x0200,
            MessageId::PlatformAck => 0x8001,
            MessageId::RegisterAck => 0x8100,
            MessageId::Other(other) => other,
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:04x}", self.as_u16())
    }
}

/// Per-connection outbound sequence counter.
///
/// Produces a strictly increasing sequence modulo 2^16 that never emits
/// zero. Each connection owns exactly one counter; it is never shared.
///
/// # Example
/// ```
/// use trackgate_core::OutboundSeq;
///
/// let mut seq = OutboundSeq::new();
/// assert_eq!(seq.next(), 1);
/// assert_eq!(seq.next(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct OutboundSeq(u16);

impl OutboundSeq {
    #[must_use]
    pub fn new() -> Self {
        OutboundSeq(0)
    }

    /// Advance and return the next sequence number, wrapping past 0xFFFF
    /// and skipping zero.
    pub fn next(&mut self) -> u16 {
        self.0 = self.0.wrapping_add(1);
        if self.0 == 0 {
            self.0 = 1;
        }
        self.0
    }
}
