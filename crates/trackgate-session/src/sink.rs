//! Event-sink boundary.
//!
//! The sink is the only process-wide resource the protocol core touches:
//! every connection task emits its decoded events through one shared
//! [`EventSink`]. Implementations must therefore tolerate concurrent
//! calls; the core promises ordering per connection, never across
//! connections. A sink failure is logged by the dispatcher and never
//! tears a connection down.
//!
//! [`StdoutSink`] is the built-in adaptor: one record per line in a
//! human-oriented, JSON or tabular rendering.

use crate::events::{LocationEvent, ParseErrorEvent, UnhandledMessage};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Once;
use trackgate_core::{Error, Result};

/// Consumer of decoded events. Shared by all connection tasks.
pub trait EventSink: Send + Sync {
    fn on_location(&self, event: &LocationEvent) -> Result<()>;
    fn on_parse_error(&self, event: &ParseErrorEvent) -> Result<()>;
    fn on_unhandled(&self, event: &UnhandledMessage) -> Result<()>;
}

/// Output rendering for [`StdoutSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintMode {
    Line,
    Json,
    Table,
}

impl FromStr for PrintMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "line" => Ok(PrintMode::Line),
            "json" => Ok(PrintMode::Json),
            "table" => Ok(PrintMode::Table),
            other => Err(Error::Config(format!(
                "print mode must be line, json or table, got {other:?}"
            ))),
        }
    }
}

impl fmt::Display for PrintMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PrintMode::Line => write!(f, "line"),
            PrintMode::Json => write!(f, "json"),
            PrintMode::Table => write!(f, "table"),
        }
    }
}

/// Envelope that tags each JSON record with its event type.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum EventRecord<'a> {
    Location(&'a LocationEvent),
    ParseError(&'a ParseErrorEvent),
    Unhandled(&'a UnhandledMessage),
}

/// Prints every event to stdout in the configured rendering.
pub struct StdoutSink {
    mode: PrintMode,
    table_header: Once,
}

impl StdoutSink {
    #[must_use]
    pub fn new(mode: PrintMode) -> Self {
        StdoutSink {
            mode,
            table_header: Once::new(),
        }
    }

    fn print_json(&self, record: EventRecord<'_>) -> Result<()> {
        let json = serde_json::to_string(&record).map_err(|e| Error::Sink(e.to_string()))?;
        println!("{json}");
        Ok(())
    }

    fn extras_summary(event: &LocationEvent) -> String {
        if event.extras.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = event
            .extras
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        parts.join(" ")
    }
}

impl EventSink for StdoutSink {
    fn on_location(&self, event: &LocationEvent) -> Result<()> {
        match self.mode {
            PrintMode::Json => self.print_json(EventRecord::Location(event)),
            PrintMode::Line => {
                let mut line = format!(
                    "[{}] {} lat={:.6} lon={:.6} speed={:.1}km/h heading={}",
                    event.timestamp.format("%Y-%m-%dT%H:%M:%SZ"),
                    event.terminal,
                    event.latitude,
                    event.longitude,
                    event.speed_kmh,
                    event.heading,
                );
                if let Some(alt) = event.altitude_m {
                    line.push_str(&format!(" alt={alt}m"));
                }
                if let Some(alarm) = event.alarm {
                    if alarm != 0 {
                        line.push_str(&format!(" alarm=0x{alarm:08x}"));
                    }
                }
                if let Some(label) = &event.alarm_label {
                    line.push_str(&format!(" alarm={label}"));
                }
                if !event.valid {
                    line.push_str(" fix=invalid");
                }
                let extras = Self::extras_summary(event);
                if !extras.is_empty() {
                    line.push(' ');
                    line.push_str(&extras);
                }
                println!("{line}");
                Ok(())
            }
            PrintMode::Table => {
                self.table_header.call_once(|| {
                    println!(
                        "{:<14} {:<20} {:>11} {:>12} {:>8} {:>7}  extras",
                        "terminal", "timestamp (UTC)", "latitude", "longitude", "km/h", "heading"
                    );
                });
                println!(
                    "{:<14} {:<20} {:>11.6} {:>12.6} {:>8.1} {:>7}  {}",
                    event.terminal,
                    event.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    event.latitude,
                    event.longitude,
                    event.speed_kmh,
                    event.heading,
                    Self::extras_summary(event),
                );
                Ok(())
            }
        }
    }

    fn on_parse_error(&self, event: &ParseErrorEvent) -> Result<()> {
        match self.mode {
            PrintMode::Json => self.print_json(EventRecord::ParseError(event)),
            PrintMode::Line | PrintMode::Table => {
                let mut line = format!(
                    "parse-error peer={} kind={} detail={:?}",
                    event.peer, event.kind, event.detail
                );
                if let Some(terminal) = &event.terminal {
                    line.push_str(&format!(" terminal={terminal}"));
                }
                if let Some(hex) = &event.frame_hex {
                    line.push_str(&format!(" frame=[{hex}]"));
                }
                println!("{line}");
                Ok(())
            }
        }
    }

    fn on_unhandled(&self, event: &UnhandledMessage) -> Result<()> {
        match self.mode {
            PrintMode::Json => self.print_json(EventRecord::Unhandled(event)),
            PrintMode::Line | PrintMode::Table => {
                println!(
                    "unhandled peer={} terminal={} msg_id=0x{:04x} body=[{}]",
                    event.peer, event.terminal, event.message_id, event.body_hex
                );
                Ok(())
            }
        }
    }
}
