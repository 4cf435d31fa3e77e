//! Location report (0x0200) body decoding.
//!
//! The body starts with a 28-byte fixed prefix:
//!
//! ```text
//! alarm(4) status(4) latitude(4) longitude(4) altitude(2) speed(2) heading(2) time(6 BCD)
//! ```
//!
//! Latitude/longitude arrive as magnitudes in 10^-6 degree units; the
//! hemisphere lives in the status word (bit 2 = south, bit 3 = west, the
//! common firmware convention). The signed value is computed here and the
//! raw status word is kept on the record so a sink can re-derive the sign
//! under a different layout.
//!
//! After the prefix, zero or more TLVs follow (1-byte tag, 1-byte
//! length, value). A TLV that declares more bytes than remain halts
//! extras parsing; the fixed prefix still yields a record.

use crate::codecs::{bcd_datetime, hex_str};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use trackgate_core::{constants::LOCATION_PREFIX_LEN, Error, Result};

/// Status bit set when the latitude magnitude is southern.
pub const STATUS_SOUTH_LATITUDE: u32 = 1 << 2;
/// Status bit set when the longitude magnitude is western.
pub const STATUS_WEST_LONGITUDE: u32 = 1 << 3;

/// TLV tag dictionary for the recognised extras.
mod tag {
    pub const ODOMETER: u8 = 0x01;
    pub const GSM_SIGNAL: u8 = 0x30;
    pub const GNSS_SIGNAL: u8 = 0x31;
    pub const HDOP: u8 = 0x32;
    pub const SATELLITES: u8 = 0x33;
    pub const IGNITION: u8 = 0x34;
    pub const IO_STATE: u8 = 0x57;
    pub const SUPPLY_VOLTAGE: u8 = 0x82;
}

/// Optional TLV extras appended to a location report.
///
/// Recognised tags decode into typed fields; anything else is preserved
/// as a tag→hex entry. A recognised tag with an unexpected length is
/// treated as unknown rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LocationExtras {
    /// 0x01: odometer, exposed in km with one decimal
    pub odometer_km: Option<f64>,
    /// 0x30: GSM signal strength
    pub gsm_signal: Option<u8>,
    /// 0x31: GNSS signal strength
    pub gnss_signal: Option<u8>,
    /// 0x32: horizontal dilution of precision
    pub hdop: Option<u8>,
    /// 0x33: satellites in use
    pub satellites: Option<u8>,
    /// 0x34: ignition, bit 0
    pub ignition_on: Option<bool>,
    /// 0x57: opaque 8-byte I/O word, hex
    pub io_state: Option<String>,
    /// 0x82: external supply voltage, exposed in volts with one decimal
    pub supply_volts: Option<f64>,
    /// Unrecognised tags, value preserved as hex
    pub unknown: BTreeMap<u8, String>,
}

impl LocationExtras {
    fn decode(mut rest: &[u8]) -> (Self, Option<Error>) {
        let mut extras = LocationExtras::default();
        while !rest.is_empty() {
            if rest.len() < 2 {
                // A dangling tag byte with no length counts as an overrun.
                return (
                    extras,
                    Some(Error::Tlv {
                        tag: rest[0],
                        declared: 1,
                        remaining: 0,
                    }),
                );
            }
            let tag = rest[0];
            let declared = usize::from(rest[1]);
            let remaining = rest.len() - 2;
            if declared > remaining {
                return (
                    extras,
                    Some(Error::Tlv {
                        tag,
                        declared,
                        remaining,
                    }),
                );
            }
            let value = &rest[2..2 + declared];
            extras.apply(tag, value);
            rest = &rest[2 + declared..];
        }
        (extras, None)
    }

    fn apply(&mut self, tag: u8, value: &[u8]) {
        match (tag, value.len()) {
            (tag::ODOMETER, 4) => {
                let tenths = u32::from_be_bytes([value[0], value[1], value[2], value[3]]);
                self.odometer_km = Some(round1(f64::from(tenths) / 10.0));
            }
            (tag::GSM_SIGNAL, 1) => self.gsm_signal = Some(value[0]),
            (tag::GNSS_SIGNAL, 1) => self.gnss_signal = Some(value[0]),
            (tag::HDOP, 1) => self.hdop = Some(value[0]),
            (tag::SATELLITES, 1) => self.satellites = Some(value[0]),
            (tag::IGNITION, 1) => self.ignition_on = Some(value[0] & 0x01 == 0x01),
            (tag::IO_STATE, 8) => self.io_state = Some(hex_str(value)),
            (tag::SUPPLY_VOLTAGE, 2) => {
                let tenths = u16::from_be_bytes([value[0], value[1]]);
                self.supply_volts = Some(round1(f64::from(tenths) / 10.0));
            }
            _ => {
                self.unknown.insert(tag, hex_str(value));
            }
        }
    }

    /// Render the extras as the label→value map exposed on events.
    #[must_use]
    pub fn readings(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        if let Some(km) = self.odometer_km {
            map.insert("odometer_km".to_string(), format!("{km:.1}"));
        }
        if let Some(v) = self.gsm_signal {
            map.insert("gsm_signal".to_string(), v.to_string());
        }
        if let Some(v) = self.gnss_signal {
            map.insert("gnss_signal".to_string(), v.to_string());
        }
        if let Some(v) = self.hdop {
            map.insert("hdop".to_string(), v.to_string());
        }
        if let Some(v) = self.satellites {
            map.insert("satellites".to_string(), v.to_string());
        }
        if let Some(on) = self.ignition_on {
            map.insert(
                "ignition".to_string(),
                if on { "ON" } else { "OFF" }.to_string(),
            );
        }
        if let Some(io) = &self.io_state {
            map.insert("io_state".to_string(), io.clone());
        }
        if let Some(volts) = self.supply_volts {
            map.insert("supply_volts".to_string(), format!("{volts:.1}"));
        }
        for (tag, hex) in &self.unknown {
            map.insert(format!("tag_0x{tag:02x}"), hex.clone());
        }
        map
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == LocationExtras::default()
    }
}

/// Decoded 0x0200 location report body.
#[derive(Debug, Clone, Serialize)]
pub struct LocationRecord {
    /// Raw 32-bit alarm bitfield
    pub alarm: u32,
    /// Raw 32-bit status bitfield
    pub status: u32,
    /// Signed decimal degrees, six fractional digits
    pub latitude: f64,
    /// Signed decimal degrees, six fractional digits
    pub longitude: f64,
    /// Metres
    pub altitude_m: i32,
    /// Wire speed in 0.1 km/h units
    pub speed_tenths: u16,
    /// Integer degrees, 0-359
    pub heading: u16,
    /// UTC instant from the six-byte BCD timestamp
    pub time: DateTime<Utc>,
    pub extras: LocationExtras,
}

impl LocationRecord {
    /// Decode a location body.
    ///
    /// Returns the record together with the TLV overrun, if extras
    /// parsing had to halt early; the record itself is still complete.
    ///
    /// # Errors
    /// - `Error::Length` if the body is shorter than the 28-byte prefix
    /// - `Error::Timestamp` if the BCD timestamp is malformed
    pub fn decode(body: &[u8]) -> Result<(LocationRecord, Option<Error>)> {
        if body.len() < LOCATION_PREFIX_LEN {
            return Err(Error::Length {
                message: format!(
                    "location body holds {} bytes, the fixed prefix needs {LOCATION_PREFIX_LEN}",
                    body.len()
                ),
            });
        }

        let alarm = be_u32(&body[0..4]);
        let status = be_u32(&body[4..8]);

        let lat_magnitude = f64::from(be_u32(&body[8..12])) * 1e-6;
        let lon_magnitude = f64::from(be_u32(&body[12..16])) * 1e-6;
        let latitude = round6(if status & STATUS_SOUTH_LATITUDE != 0 {
            -lat_magnitude
        } else {
            lat_magnitude
        });
        let longitude = round6(if status & STATUS_WEST_LONGITUDE != 0 {
            -lon_magnitude
        } else {
            lon_magnitude
        });

        let altitude_m = i32::from(be_u16(&body[16..18]));
        let speed_tenths = be_u16(&body[18..20]);
        // Wire heading is 0-359; anything larger is normalised.
        let heading = be_u16(&body[20..22]) % 360;
        let time = bcd_datetime(&body[22..28])?;

        let (extras, tlv_overrun) = LocationExtras::decode(&body[LOCATION_PREFIX_LEN..]);

        Ok((
            LocationRecord {
                alarm,
                status,
                latitude,
                longitude,
                altitude_m,
                speed_tenths,
                heading,
                time,
                extras,
            },
            tlv_overrun,
        ))
    }

    /// Speed in km/h with one fractional digit.
    #[must_use]
    pub fn speed_kmh(&self) -> f64 {
        round1(f64::from(self.speed_tenths) / 10.0)
    }
}

fn be_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn be_u16(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}

pub(crate) fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
