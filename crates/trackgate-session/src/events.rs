//! Decoded events handed to the sink.
//!
//! Both wire variants converge on the same [`LocationEvent`] shape; the
//! binary path fills the alarm/status words, the ASCII path fills the
//! validity flag and (for alarm message types) a cause label. All values
//! are owned: nothing references a reusable buffer once an event has
//! been emitted.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use trackgate_core::TerminalId;
use trackgate_protocol::{AsciiRecord, LocationRecord};

/// One decoded position report.
#[derive(Debug, Clone, Serialize)]
pub struct LocationEvent {
    pub terminal: String,
    pub timestamp: DateTime<Utc>,
    /// Signed decimal degrees, six fractional digits
    pub latitude: f64,
    /// Signed decimal degrees, six fractional digits
    pub longitude: f64,
    /// Metres; absent on the ASCII path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude_m: Option<i32>,
    /// km/h with one fractional digit
    pub speed_kmh: f64,
    /// Course as reported (integer degrees on the binary path)
    pub heading: String,
    /// Fix validity; the binary variant only reports valid fixes
    pub valid: bool,
    /// Raw 32-bit alarm bitfield (binary path only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alarm: Option<u32>,
    /// Raw 32-bit status bitfield (binary path only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u32>,
    /// Legacy alarm cause (ASCII path only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alarm_label: Option<String>,
    /// Recognised TLV extras plus unknown tag→hex entries
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extras: BTreeMap<String, String>,
}

impl LocationEvent {
    pub fn from_binary(terminal: &TerminalId, record: &LocationRecord) -> Self {
        LocationEvent {
            terminal: terminal.to_string(),
            timestamp: record.time,
            latitude: record.latitude,
            longitude: record.longitude,
            altitude_m: Some(record.altitude_m),
            speed_kmh: record.speed_kmh(),
            heading: record.heading.to_string(),
            valid: true,
            alarm: Some(record.alarm),
            status: Some(record.status),
            alarm_label: None,
            extras: record.extras.readings(),
        }
    }

    pub fn from_ascii(record: &AsciiRecord) -> Self {
        LocationEvent {
            terminal: record.terminal.to_string(),
            timestamp: record.time,
            latitude: record.latitude,
            longitude: record.longitude,
            altitude_m: None,
            speed_kmh: record.speed_kmh,
            heading: record.heading.clone(),
            valid: record.valid,
            alarm: None,
            status: None,
            alarm_label: record.alarm_label.map(str::to_string),
            extras: BTreeMap::new(),
        }
    }
}

/// A frame that failed framing, checksum, length or TLV validation.
///
/// Carries the error kind, the terminal when the header survived far
/// enough to recover one, and a hex dump of the offending frame when the
/// connection runs with hex tracing enabled.
#[derive(Debug, Clone, Serialize)]
pub struct ParseErrorEvent {
    pub peer: String,
    pub kind: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_hex: Option<String>,
}

/// A valid frame whose message id has no dispatch rule. Informational.
#[derive(Debug, Clone, Serialize)]
pub struct UnhandledMessage {
    pub peer: String,
    pub terminal: String,
    pub message_id: u16,
    pub body_hex: String,
}
