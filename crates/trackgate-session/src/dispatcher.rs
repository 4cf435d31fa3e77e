//! Per-connection message dispatch.
//!
//! One [`Dispatcher`] exists per accepted connection. For every reframed
//! [`RawFrame`] it applies the request→response table:
//!
//! | incoming            | action                                   |
//! |---------------------|------------------------------------------|
//! | 0x0100 register     | 0x8100, result 0, token                  |
//! | 0x0102 authenticate | 0x8100, result 0, token                  |
//! | 0x0002 heartbeat    | 0x8001, result 0                         |
//! | 0x0200 location     | location event, then 0x8001, result 0    |
//! | anything else       | unhandled event, no response             |
//! | ASCII report line   | location event, no response              |
//!
//! Frames that fail validation become structured parse-error events and
//! produce no response; the connection stays up and the next well-formed
//! frame is processed normally. A sink rejection is logged and otherwise
//! ignored.

use crate::events::{LocationEvent, ParseErrorEvent, UnhandledMessage};
use crate::sink::EventSink;
use std::sync::Arc;
use tracing::{debug, trace, warn};
use trackgate_core::{Error, MessageId, TerminalId};
use trackgate_protocol::{
    hex_dump, open_binary, parse_line, FrameHeader, LocationRecord, RawFrame, Response,
};

/// Routes decoded frames to events and acknowledgements.
pub struct Dispatcher {
    sink: Arc<dyn EventSink>,
    register_token: String,
    log_hex: bool,
    peer: String,
}

impl Dispatcher {
    pub fn new(
        sink: Arc<dyn EventSink>,
        register_token: impl Into<String>,
        log_hex: bool,
        peer: impl Into<String>,
    ) -> Self {
        Dispatcher {
            sink,
            register_token: register_token.into(),
            log_hex,
            peer: peer.into(),
        }
    }

    /// Process one frame, returning the responses to write back in order.
    pub fn handle_frame(&self, frame: &RawFrame) -> Vec<Response> {
        match frame {
            RawFrame::Binary(interior) => self.handle_binary(interior),
            RawFrame::Ascii(text) => {
                self.handle_ascii(text);
                Vec::new()
            }
        }
    }

    fn handle_binary(&self, interior: &[u8]) -> Vec<Response> {
        let payload = match open_binary(interior) {
            Ok(payload) => payload,
            Err(err) => {
                self.emit_parse_error(&err, None, interior);
                return Vec::new();
            }
        };
        let (header, body) = match FrameHeader::decode(&payload) {
            Ok(decoded) => decoded,
            Err(err) => {
                self.emit_parse_error(&err, None, interior);
                return Vec::new();
            }
        };
        trace!(
            peer = %self.peer,
            terminal = %header.terminal,
            message_id = %header.message_id,
            sequence = header.sequence,
            "frame decoded"
        );

        match header.message_id {
            MessageId::TerminalRegister | MessageId::TerminalAuth => {
                debug!(peer = %self.peer, terminal = %header.terminal, "terminal registered");
                vec![Response::register_ack(
                    header.terminal.clone(),
                    header.sequence,
                    &self.register_token,
                )]
            }
            MessageId::TerminalHeartbeat => {
                vec![Response::general_ack(
                    header.terminal.clone(),
                    header.sequence,
                    header.message_id,
                )]
            }
            MessageId::LocationReport => match LocationRecord::decode(body) {
                Ok((record, tlv_overrun)) => {
                    self.emit_location(LocationEvent::from_binary(&header.terminal, &record));
                    if let Some(err) = tlv_overrun {
                        self.emit_parse_error(&err, Some(&header.terminal), interior);
                    }
                    vec![Response::general_ack(
                        header.terminal.clone(),
                        header.sequence,
                        header.message_id,
                    )]
                }
                Err(err) => {
                    self.emit_parse_error(&err, Some(&header.terminal), interior);
                    Vec::new()
                }
            },
            MessageId::PlatformAck | MessageId::RegisterAck | MessageId::Other(_) => {
                let event = UnhandledMessage {
                    peer: self.peer.clone(),
                    terminal: header.terminal.to_string(),
                    message_id: header.message_id.as_u16(),
                    body_hex: hex_dump(body),
                };
                if let Err(err) = self.sink.on_unhandled(&event) {
                    warn!(peer = %self.peer, error = %err, "event sink rejected unhandled-message event");
                }
                Vec::new()
            }
        }
    }

    fn handle_ascii(&self, text: &str) {
        match parse_line(text) {
            Ok(record) => {
                trace!(peer = %self.peer, terminal = %record.terminal, command = %record.command, "report line decoded");
                self.emit_location(LocationEvent::from_ascii(&record));
            }
            Err(err) => {
                self.emit_parse_error(&err, None, text.as_bytes());
            }
        }
    }

    fn emit_location(&self, event: LocationEvent) {
        if let Err(err) = self.sink.on_location(&event) {
            warn!(peer = %self.peer, error = %err, "event sink rejected location event");
        }
    }

    fn emit_parse_error(&self, error: &Error, terminal: Option<&TerminalId>, raw: &[u8]) {
        debug!(peer = %self.peer, kind = error.kind(), error = %error, "frame rejected");
        let event = ParseErrorEvent {
            peer: self.peer.clone(),
            kind: error.kind().to_string(),
            detail: error.to_string(),
            terminal: terminal.map(TerminalId::to_string),
            frame_hex: self.log_hex.then(|| hex_dump(raw)),
        };
        if let Err(err) = self.sink.on_parse_error(&event) {
            warn!(peer = %self.peer, error = %err, "event sink rejected parse-error event");
        }
    }
}
