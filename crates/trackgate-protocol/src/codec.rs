//! Tokio codec wiring the protocol engine into `Framed` streams.
//!
//! One [`TrackerCodec`] instance lives per accepted connection and owns
//! the two pieces of per-connection protocol state: the reframer
//! accumulator and the outbound sequence counter. Nothing here is shared
//! across connections.
//!
//! The decoder yields [`RawFrame`]s: reframing is infallible by design
//! (garbage is skipped, oversized accumulators are truncated), so a
//! protocol violation inside a frame surfaces later, at dispatch, where
//! it becomes a structured parse-error event instead of a dead
//! connection. The encoder seals a [`Response`] under the next outbound
//! sequence.
//!
//! # Usage with Tokio Framed
//!
//! ```no_run
//! use futures::StreamExt;
//! use tokio::net::TcpStream;
//! use tokio_util::codec::Framed;
//! use trackgate_protocol::TrackerCodec;
//!
//! # async fn example() -> trackgate_core::Result<()> {
//! let stream = TcpStream::connect("127.0.0.1:7700").await?;
//! let mut framed = Framed::new(stream, TrackerCodec::new());
//!
//! while let Some(Ok(frame)) = framed.next().await {
//!     println!("frame: {frame}");
//! }
//! # Ok(())
//! # }
//! ```

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::{frame::RawFrame, response::Response, stream_parser::StreamParser};
use trackgate_core::{Error, OutboundSeq, Result};

/// Per-connection codec: reframer in, sealed responses out.
#[derive(Debug, Default)]
pub struct TrackerCodec {
    parser: StreamParser,
    sequence: OutboundSeq,
}

impl TrackerCodec {
    #[must_use]
    pub fn new() -> Self {
        Self {
            parser: StreamParser::new(),
            sequence: OutboundSeq::new(),
        }
    }
}

impl Decoder for TrackerCodec {
    type Item = RawFrame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if !src.is_empty() {
            // All bytes move into the reframer accumulator.
            self.parser.feed(src);
            src.clear();
        }
        Ok(self.parser.next_frame())
    }
}

impl Encoder<Response> for TrackerCodec {
    type Error = Error;

    fn encode(&mut self, item: Response, dst: &mut BytesMut) -> Result<()> {
        let sequence = self.sequence.next();
        dst.extend_from_slice(&item.encode(sequence));
        Ok(())
    }
}
