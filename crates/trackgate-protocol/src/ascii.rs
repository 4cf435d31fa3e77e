//! Legacy ASCII variant parser.
//!
//! Older HQ-family firmware reports over the same TCP port with a
//! comma-delimited `*…#` framing instead of binary frames:
//!
//! ```text
//! *HQ,<IMEI>,<CMD>,HHMMSS,A|V,DDMM.mmmm,N|S,DDDMM.mmmm,E|W,<knots>,<course>,DDMMYY,<state>,…#
//! ```
//!
//! The tokenizer converts degrees-minutes to signed decimal degrees,
//! knots to km/h, and rebuilds a UTC instant from the split date/time
//! fields, producing the same decoded-location shape as the binary path.
//! This path is read-only: no acknowledgement is ever sent.

use crate::codecs::utc_from_parts;
use crate::location::{round1, round6};
use chrono::{DateTime, Utc};
use serde::Serialize;
use trackgate_core::{
    constants::{KNOTS_TO_KMH, TERMINAL_DIGITS},
    Error, Result, TerminalId,
};

/// Minimum comma-separated fields in a well-formed report line.
const MIN_FIELDS: usize = 12;

/// Decoded legacy ASCII report.
#[derive(Debug, Clone, Serialize)]
pub struct AsciiRecord {
    pub terminal: TerminalId,
    /// Command tag, e.g. "V1" or "LK"
    pub command: String,
    /// UTC instant rebuilt from DDMMYY + HHMMSS
    pub time: DateTime<Utc>,
    /// 'A' = valid fix, 'V' = invalid
    pub valid: bool,
    /// Signed decimal degrees, six fractional digits
    pub latitude: f64,
    /// Signed decimal degrees, six fractional digits
    pub longitude: f64,
    /// Converted from knots, one fractional digit
    pub speed_kmh: f64,
    /// Course field as transmitted
    pub heading: String,
    /// Alarm cause when the command tag is a legacy alarm message type
    pub alarm_label: Option<&'static str>,
}

/// Parse one `*…#` frame interior (delimiters already stripped).
///
/// # Errors
/// Returns `Error::Field` for missing fields, malformed coordinates,
/// hemispheres, or speeds, `Error::Timestamp` for bad date/time fields,
/// and `Error::Terminal` for an unusable IMEI field.
pub fn parse_line(interior: &str) -> Result<AsciiRecord> {
    let fields: Vec<&str> = interior.split(',').collect();
    if fields.len() < MIN_FIELDS {
        return Err(Error::Field {
            message: format!(
                "report line holds {} comma fields, expected at least {MIN_FIELDS}",
                fields.len()
            ),
        });
    }

    let terminal = parse_terminal(fields[1])?;
    let command = fields[2].to_string();
    let valid = match fields[4] {
        "A" => true,
        "V" => false,
        other => {
            return Err(Error::Field {
                message: format!("validity flag must be A or V, got {other:?}"),
            });
        }
    };

    let latitude = degrees_minutes(fields[5], fields[6], Hemisphere::Latitude)?;
    let longitude = degrees_minutes(fields[7], fields[8], Hemisphere::Longitude)?;

    let knots: f64 = fields[9].parse().map_err(|_| Error::Field {
        message: format!("speed field {:?} is not a number", fields[9]),
    })?;
    if !(0.0..10_000.0).contains(&knots) {
        return Err(Error::Field {
            message: format!("speed {knots} knots out of range"),
        });
    }
    let speed_kmh = round1(knots * KNOTS_TO_KMH);

    let time = parse_timestamp(fields[11], fields[3])?;

    Ok(AsciiRecord {
        terminal,
        alarm_label: alarm_label(&command),
        command,
        time,
        valid,
        latitude,
        longitude,
        speed_kmh,
        heading: fields[10].to_string(),
    })
}

/// Alarm cause for a legacy alarm message type, keyed on the low nibble.
///
/// Applies only to the HQ firmware family; the binary variant signals
/// alarms through the 32-bit alarm bitfield instead.
#[must_use]
pub fn alarm_label(command: &str) -> Option<&'static str> {
    if command.len() != 2 || !command.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let message_type = u8::from_str_radix(command, 16).ok()?;
    match message_type & 0x0F {
        0x1 => Some("SOS"),
        0x2 => Some("low battery"),
        0x3 => Some("vibration"),
        0x4 => Some("movement"),
        0x5 => Some("geo-fence"),
        _ => None,
    }
}

/// The IMEI field may be longer than the 12 digits a terminal id can
/// carry; keep the rightmost 12 so binary and ASCII reports from the same
/// unit key identically.
fn parse_terminal(imei: &str) -> Result<TerminalId> {
    let digits = imei.trim();
    if digits.len() > TERMINAL_DIGITS {
        let (_, tail) = digits.split_at(digits.len() - TERMINAL_DIGITS);
        TerminalId::new(tail)
    } else {
        TerminalId::new(digits)
    }
}

#[derive(Clone, Copy)]
enum Hemisphere {
    Latitude,
    Longitude,
}

/// Convert a DDMM.mmmm / DDDMM.mmmm field plus hemisphere letter into
/// signed decimal degrees rounded to six fractional digits.
fn degrees_minutes(value: &str, hemisphere: &str, kind: Hemisphere) -> Result<f64> {
    let int_len = value.find('.').unwrap_or(value.len());
    if int_len < 3 {
        return Err(Error::Field {
            message: format!("coordinate {value:?} too short for degrees-minutes form"),
        });
    }
    let split = int_len - 2;
    let degrees: f64 = value[..split].parse().map_err(|_| Error::Field {
        message: format!("coordinate {value:?} has a non-numeric degree part"),
    })?;
    let minutes: f64 = value[split..].parse().map_err(|_| Error::Field {
        message: format!("coordinate {value:?} has a non-numeric minute part"),
    })?;
    if minutes >= 60.0 {
        return Err(Error::Field {
            message: format!("coordinate {value:?} carries {minutes} minutes"),
        });
    }

    let unsigned = degrees + minutes / 60.0;
    let (signed, limit) = match (kind, hemisphere) {
        (Hemisphere::Latitude, "N") => (unsigned, 90.0),
        (Hemisphere::Latitude, "S") => (-unsigned, 90.0),
        (Hemisphere::Longitude, "E") => (unsigned, 180.0),
        (Hemisphere::Longitude, "W") => (-unsigned, 180.0),
        (_, other) => {
            return Err(Error::Field {
                message: format!("hemisphere must be N/S/E/W, got {other:?}"),
            });
        }
    };
    if signed.abs() > limit {
        return Err(Error::Field {
            message: format!("coordinate {signed} exceeds ±{limit}"),
        });
    }
    Ok(round6(signed))
}

fn parse_timestamp(ddmmyy: &str, hhmmss: &str) -> Result<DateTime<Utc>> {
    let date = digit_pairs(ddmmyy)?;
    let time = digit_pairs(hhmmss)?;
    utc_from_parts(date[2], date[1], date[0], time[0], time[1], time[2])
}

fn digit_pairs(field: &str) -> Result<[u32; 3]> {
    if field.len() != 6 || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Timestamp {
            message: format!("expected six digits, got {field:?}"),
        });
    }
    let mut out = [0u32; 3];
    for (i, chunk) in field.as_bytes().chunks_exact(2).enumerate() {
        out[i] = u32::from(chunk[0] - b'0') * 10 + u32::from(chunk[1] - b'0');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SAMPLE: &str = "HQ,1234567890,V1,123045,A,3215.4545,N,03451.2323,E,10.0,90,150324,FFFFFFFF";

    #[test]
    fn test_parse_sample_line() {
        let record = parse_line(SAMPLE).unwrap();

        assert_eq!(record.terminal.as_str(), "1234567890");
        assert_eq!(record.command, "V1");
        assert!(record.valid);
        assert_eq!(record.latitude, 32.257575);
        assert_eq!(record.longitude, 34.853872);
        assert_eq!(record.speed_kmh, 18.5);
        assert_eq!(record.heading, "90");
        assert_eq!(record.time.to_rfc3339(), "2024-03-15T12:30:45+00:00");
        assert!(record.alarm_label.is_none());
    }

    #[test]
    fn test_parse_southern_western_hemispheres() {
        let line = "HQ,1234567890,V1,000000,A,2304.0000,S,04612.0000,W,0.0,180,010120,FF";
        let record = parse_line(line).unwrap();

        assert!((record.latitude - (-23.066667)).abs() < 1e-9);
        assert!((record.longitude - (-46.2)).abs() < 1e-9);
        assert_eq!(record.speed_kmh, 0.0);
    }

    #[test]
    fn test_parse_invalid_fix_flag() {
        let line = SAMPLE.replace(",A,", ",V,");
        let record = parse_line(&line).unwrap();
        assert!(!record.valid);
    }

    #[test]
    fn test_parse_long_imei_keeps_rightmost_digits() {
        let line = SAMPLE.replace("1234567890", "861234567890123");
        let record = parse_line(&line).unwrap();
        assert_eq!(record.terminal.as_str(), "234567890123");
    }

    #[rstest]
    #[case("HQ,1,V1,123045")] // far too few fields
    #[case("HQ,1234567890,V1,123045,X,3215.4545,N,03451.2323,E,10.0,90,150324,FF")] // bad validity
    #[case("HQ,1234567890,V1,123045,A,3215.4545,Q,03451.2323,E,10.0,90,150324,FF")] // bad hemisphere
    #[case("HQ,1234567890,V1,123045,A,32xx.4545,N,03451.2323,E,10.0,90,150324,FF")] // bad degrees
    #[case("HQ,1234567890,V1,123045,A,3215.4545,N,03451.2323,E,fast,90,150324,FF")] // bad speed
    #[case("HQ,1234567890,V1,123045,A,3215.4545,N,03451.2323,E,-3.0,90,150324,FF")] // negative speed
    #[case("HQ,1234567890,V1,123045,A,3215.4545,N,03451.2323,E,10.0,90,15032,FF")] // short date
    #[case("HQ,1234567890,V1,123045,A,9961.0000,N,03451.2323,E,10.0,90,150324,FF")] // minutes >= 60
    fn test_parse_rejects_malformed_lines(#[case] line: &str) {
        assert!(parse_line(line).is_err());
    }

    #[test]
    fn test_century_rule_on_dates() {
        let line = SAMPLE.replace(",150324,", ",150399,");
        let record = parse_line(&line).unwrap();
        assert_eq!(record.time.to_rfc3339(), "1999-03-15T12:30:45+00:00");
    }

    #[rstest]
    #[case("01", Some("SOS"))]
    #[case("12", Some("low battery"))]
    #[case("13", Some("vibration"))]
    #[case("44", Some("movement"))]
    #[case("25", Some("geo-fence"))]
    #[case("10", None)] // low nibble 0 has no cause
    #[case("V1", None)] // ordinary report command
    #[case("LK", None)] // link keepalive
    fn test_alarm_label_low_nibble(#[case] command: &str, #[case] expected: Option<&'static str>) {
        assert_eq!(alarm_label(command), expected);
    }

    #[test]
    fn test_alarm_label_attached_to_record() {
        let line = SAMPLE.replace(",V1,", ",01,");
        let record = parse_line(&line).unwrap();
        assert_eq!(record.alarm_label, Some("SOS"));
    }
}
