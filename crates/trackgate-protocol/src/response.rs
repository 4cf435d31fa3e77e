//! Outbound response construction.
//!
//! Only two response shapes keep a device session alive:
//!
//! - **Platform general response (0x8001)** — acknowledges heartbeats and
//!   location reports; body = original sequence (2) ‖ original message
//!   id (2) ‖ result (1).
//! - **Terminal registration response (0x8100)** — answers register and
//!   authenticate messages; body = original sequence (2) ‖ result (1) ‖
//!   authentication token bytes.
//!
//! [`Response::encode`] seals the frame: header with the body length in
//! the properties word, BCD terminal echo, caller-supplied outbound
//! sequence, XOR checksum, transparent-byte escape, 0x7E brackets.

use crate::frame;
use bytes::Bytes;
use trackgate_core::{
    constants::{HEADER_LEN, PROPS_BODY_LEN_MASK, RESULT_OK},
    MessageId, TerminalId,
};

/// One outbound acknowledgement, addressed back at a terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub message_id: MessageId,
    pub terminal: TerminalId,
    pub body: Vec<u8>,
}

impl Response {
    /// Platform general response (0x8001) with result 0.
    #[must_use]
    pub fn general_ack(terminal: TerminalId, request_seq: u16, request_id: MessageId) -> Self {
        let mut body = Vec::with_capacity(5);
        body.extend_from_slice(&request_seq.to_be_bytes());
        body.extend_from_slice(&request_id.as_u16().to_be_bytes());
        body.push(RESULT_OK);
        Response {
            message_id: MessageId::PlatformAck,
            terminal,
            body,
        }
    }

    /// Terminal registration response (0x8100) with result 0 and the
    /// deployment's authentication token.
    #[must_use]
    pub fn register_ack(terminal: TerminalId, request_seq: u16, token: &str) -> Self {
        let mut body = Vec::with_capacity(3 + token.len());
        body.extend_from_slice(&request_seq.to_be_bytes());
        body.push(RESULT_OK);
        body.extend_from_slice(token.as_bytes());
        Response {
            message_id: MessageId::RegisterAck,
            terminal,
            body,
        }
    }

    /// Seal into a complete wire frame under the given outbound sequence.
    #[must_use]
    pub fn encode(&self, sequence: u16) -> Bytes {
        let mut payload = Vec::with_capacity(HEADER_LEN + self.body.len());
        payload.extend_from_slice(&self.message_id.as_u16().to_be_bytes());
        let properties = (self.body.len() as u16) & PROPS_BODY_LEN_MASK;
        payload.extend_from_slice(&properties.to_be_bytes());
        payload.extend_from_slice(&self.terminal.to_bcd());
        payload.extend_from_slice(&sequence.to_be_bytes());
        payload.extend_from_slice(&self.body);
        frame::seal(&payload)
    }
}
