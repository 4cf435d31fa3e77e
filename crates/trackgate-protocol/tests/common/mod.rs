//! Shared helpers for protocol integration tests.
#![allow(dead_code)]

use trackgate_core::TerminalId;
use trackgate_protocol::{frame, RawFrame};

/// Default terminal used across scenario tests.
pub const TERMINAL: &str = "123456789010";

/// Build a complete device-side wire frame (delimiters, escaping and
/// checksum included) for the given header fields and body.
pub fn device_frame(msg_id: u16, terminal: &str, seq: u16, body: &[u8]) -> Vec<u8> {
    let terminal = TerminalId::new(terminal).unwrap();
    let mut payload = Vec::with_capacity(12 + body.len());
    payload.extend_from_slice(&msg_id.to_be_bytes());
    payload.extend_from_slice(&(body.len() as u16).to_be_bytes());
    payload.extend_from_slice(&terminal.to_bcd());
    payload.extend_from_slice(&seq.to_be_bytes());
    payload.extend_from_slice(body);
    frame::seal(&payload).to_vec()
}

/// Location body fixed prefix for 31.258960°N 12.826744°E, 100 m,
/// 20.0 km/h, heading 90°, 2024-03-15T12:30:45Z.
pub fn location_prefix() -> Vec<u8> {
    let mut body = Vec::with_capacity(28);
    body.extend_from_slice(&0u32.to_be_bytes()); // alarm
    body.extend_from_slice(&0x0000_0003u32.to_be_bytes()); // status
    body.extend_from_slice(&31_258_960u32.to_be_bytes()); // latitude e-6
    body.extend_from_slice(&12_826_744u32.to_be_bytes()); // longitude e-6
    body.extend_from_slice(&100u16.to_be_bytes()); // altitude m
    body.extend_from_slice(&200u16.to_be_bytes()); // speed 0.1 km/h
    body.extend_from_slice(&90u16.to_be_bytes()); // heading
    body.extend_from_slice(&[0x24, 0x03, 0x15, 0x12, 0x30, 0x45]); // BCD time
    body
}

/// Unwrap a binary frame or panic with context.
pub fn expect_binary(frame: Option<RawFrame>) -> Vec<u8> {
    match frame {
        Some(RawFrame::Binary(interior)) => interior.to_vec(),
        other => panic!("expected a binary frame, got {other:?}"),
    }
}

/// Unwrap an ASCII frame or panic with context.
pub fn expect_ascii(frame: Option<RawFrame>) -> String {
    match frame {
        Some(RawFrame::Ascii(text)) => text,
        other => panic!("expected an ascii frame, got {other:?}"),
    }
}
