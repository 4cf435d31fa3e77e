//! Stream reframer for device connections.
//!
//! TCP delivers bytes with arbitrary chunk boundaries: a single read may
//! hold a partial frame, several complete frames, or garbage between
//! frames. The [`StreamParser`] owns one append-only accumulator per
//! connection and turns that byte soup into whole [`RawFrame`]s.
//!
//! Two framings share the accumulator, distinguished by their opening
//! sentinel:
//! - binary: `0x7E … 0x7E`, interior still escaped
//! - legacy ASCII: `*…#`, interior is comma-delimited text
//!
//! # Back-pressure safety
//!
//! A peer that never completes a frame cannot grow the accumulator
//! without bound: past 64 KiB (binary) or 10 000 bytes (ASCII) the buffer
//! is truncated to its tail and reframing resumes from the next sentinel.
//! The connection itself is never torn down here.
//!
//! # Usage
//!
//! ```
//! use trackgate_protocol::{RawFrame, StreamParser};
//!
//! let mut parser = StreamParser::new();
//! parser.feed(&[0x7E, 0x01, 0x02]);
//! assert!(parser.next_frame().is_none());
//!
//! parser.feed(&[0x03, 0x7E]);
//! match parser.next_frame() {
//!     Some(RawFrame::Binary(interior)) => assert_eq!(&interior[..], &[0x01, 0x02, 0x03]),
//!     other => panic!("expected a binary frame, got {other:?}"),
//! }
//! ```

use bytes::{Bytes, BytesMut};
use std::collections::VecDeque;
use trackgate_core::constants::{
    ASCII_END, ASCII_KEEP_TAIL, ASCII_START, BINARY_KEEP_TAIL, FRAME_DELIMITER,
    MAX_ASCII_ACCUMULATOR, MAX_BINARY_ACCUMULATOR,
};

use crate::frame::RawFrame;

/// Initial accumulator capacity, sized for typical TCP reads.
const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024;

/// Initial capacity of the ready-frame queue.
const INITIAL_FRAME_QUEUE_CAPACITY: usize = 4;

/// Stateful reframer that extracts whole frames from a chunked stream.
///
/// The ordered sequence of frames it yields is independent of how the
/// input was chunked: feeding a stream byte-by-byte or all at once
/// produces identical output.
#[derive(Debug, Default)]
pub struct StreamParser {
    /// Accumulator for bytes that do not yet form a complete frame.
    buffer: BytesMut,

    /// Queue of complete frames ready for extraction.
    frames: VecDeque<RawFrame>,
}

impl StreamParser {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            frames: VecDeque::with_capacity(INITIAL_FRAME_QUEUE_CAPACITY),
        }
    }

    /// Append bytes from the socket and extract every frame they complete.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
        while self.try_extract_frame() {}
    }

    /// Pop the next complete frame, if any.
    pub fn next_frame(&mut self) -> Option<RawFrame> {
        self.frames.pop_front()
    }

    /// Number of frames ready for extraction.
    #[must_use]
    pub fn frames_available(&self) -> usize {
        self.frames.len()
    }

    /// Drop all buffered bytes and queued frames.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.frames.clear();
    }

    /// Iterator draining all currently queued frames.
    pub fn drain_frames(&mut self) -> DrainFrames<'_> {
        DrainFrames { parser: self }
    }

    /// Try to extract one frame from the front of the accumulator.
    ///
    /// Returns `true` if the accumulator advanced (a frame was queued or
    /// an empty frame was consumed), `false` when more bytes are needed.
    fn try_extract_frame(&mut self) -> bool {
        // Bytes before the first sentinel of either variant can never be
        // part of a frame.
        let Some(start) = self
            .buffer
            .iter()
            .position(|&b| b == FRAME_DELIMITER || b == ASCII_START)
        else {
            self.buffer.clear();
            return false;
        };
        if start > 0 {
            let _ = self.buffer.split_to(start);
        }

        if self.buffer[0] == FRAME_DELIMITER {
            self.extract_binary()
        } else {
            self.extract_ascii()
        }
    }

    fn extract_binary(&mut self) -> bool {
        match self.buffer[1..].iter().position(|&b| b == FRAME_DELIMITER) {
            Some(rel) => {
                let end = rel + 1;
                let framed = self.buffer.split_to(end + 1);
                let interior = &framed[1..framed.len() - 1];
                // Adjacent delimiters between frames produce an empty
                // interior; dropped silently.
                if !interior.is_empty() {
                    self.frames
                        .push_back(RawFrame::Binary(Bytes::copy_from_slice(interior)));
                }
                true
            }
            None => {
                self.truncate_if_oversized(MAX_BINARY_ACCUMULATOR, BINARY_KEEP_TAIL);
                false
            }
        }
    }

    fn extract_ascii(&mut self) -> bool {
        match self.buffer[1..].iter().position(|&b| b == ASCII_END) {
            Some(rel) => {
                let end = rel + 1;
                let framed = self.buffer.split_to(end + 1);
                let interior = &framed[1..framed.len() - 1];
                // Non-ASCII bytes inside a '*…#' frame are a protocol
                // violation; the frame is discarded.
                if !interior.is_empty() && interior.is_ascii() {
                    if let Ok(text) = std::str::from_utf8(interior) {
                        self.frames.push_back(RawFrame::Ascii(text.trim().to_string()));
                    }
                }
                true
            }
            None => {
                self.truncate_if_oversized(MAX_ASCII_ACCUMULATOR, ASCII_KEEP_TAIL);
                false
            }
        }
    }

    fn truncate_if_oversized(&mut self, max: usize, keep: usize) {
        if self.buffer.len() > max {
            let excess = self.buffer.len() - keep;
            let _ = self.buffer.split_to(excess);
        }
    }
}

/// Iterator that drains frames from a [`StreamParser`].
pub struct DrainFrames<'a> {
    parser: &'a mut StreamParser,
}

impl Iterator for DrainFrames<'_> {
    type Item = RawFrame;

    fn next(&mut self) -> Option<Self::Item> {
        self.parser.next_frame()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.parser.frames_available();
        (len, Some(len))
    }
}

impl ExactSizeIterator for DrainFrames<'_> {
    fn len(&self) -> usize {
        self.parser.frames_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary_frame(interior: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(interior.len() + 2);
        out.push(FRAME_DELIMITER);
        out.extend_from_slice(interior);
        out.push(FRAME_DELIMITER);
        out
    }

    fn expect_binary(frame: Option<RawFrame>) -> Bytes {
        match frame {
            Some(RawFrame::Binary(interior)) => interior,
            other => panic!("expected binary frame, got {other:?}"),
        }
    }

    fn expect_ascii(frame: Option<RawFrame>) -> String {
        match frame {
            Some(RawFrame::Ascii(text)) => text,
            other => panic!("expected ascii frame, got {other:?}"),
        }
    }

    #[test]
    fn test_complete_frame_single_feed() {
        let mut parser = StreamParser::new();
        parser.feed(&binary_frame(&[0x00, 0x02, 0x01]));

        assert_eq!(parser.frames_available(), 1);
        assert_eq!(&expect_binary(parser.next_frame())[..], &[0x00, 0x02, 0x01]);
    }

    #[test]
    fn test_partial_frame_multiple_feeds() {
        let mut parser = StreamParser::new();

        parser.feed(&[FRAME_DELIMITER, 0x00]);
        assert!(parser.next_frame().is_none());

        parser.feed(&[0x02, 0x11]);
        assert!(parser.next_frame().is_none());

        parser.feed(&[FRAME_DELIMITER]);
        assert_eq!(&expect_binary(parser.next_frame())[..], &[0x00, 0x02, 0x11]);
    }

    #[test]
    fn test_multiple_frames_in_single_buffer() {
        let mut parser = StreamParser::new();
        let mut data = binary_frame(&[0x01]);
        data.extend_from_slice(&binary_frame(&[0x02]));
        parser.feed(&data);

        assert_eq!(parser.frames_available(), 2);
        assert_eq!(&expect_binary(parser.next_frame())[..], &[0x01]);
        assert_eq!(&expect_binary(parser.next_frame())[..], &[0x02]);
    }

    #[test]
    fn test_garbage_before_frame_discarded() {
        let mut parser = StreamParser::new();
        let mut data = b"noise\r\n".to_vec();
        data.extend_from_slice(&binary_frame(&[0x42]));
        parser.feed(&data);

        assert_eq!(&expect_binary(parser.next_frame())[..], &[0x42]);
    }

    #[test]
    fn test_garbage_without_sentinel_discards_accumulator() {
        let mut parser = StreamParser::new();
        parser.feed(b"no frame here at all");
        assert_eq!(parser.frames_available(), 0);
        assert_eq!(parser.buffer.len(), 0);
    }

    #[test]
    fn test_empty_binary_frame_dropped() {
        let mut parser = StreamParser::new();
        let mut data = vec![FRAME_DELIMITER, FRAME_DELIMITER];
        data.extend_from_slice(&binary_frame(&[0x55]));
        parser.feed(&data);

        assert_eq!(parser.frames_available(), 1);
        assert_eq!(&expect_binary(parser.next_frame())[..], &[0x55]);
    }

    #[test]
    fn test_byte_by_byte_feeding() {
        let mut parser = StreamParser::new();
        for &b in &binary_frame(&[0x00, 0x02, 0x00, 0x2d]) {
            parser.feed(&[b]);
        }
        assert_eq!(
            &expect_binary(parser.next_frame())[..],
            &[0x00, 0x02, 0x00, 0x2d]
        );
    }

    #[test]
    fn test_chunking_invariance() {
        let mut stream = Vec::new();
        stream.extend_from_slice(b"junk");
        stream.extend_from_slice(&binary_frame(&[0x01, 0x02]));
        stream.extend_from_slice(b"*HQ,1,LK#");
        stream.extend_from_slice(&binary_frame(&[0x03]));

        let mut whole = StreamParser::new();
        whole.feed(&stream);
        let expected: Vec<RawFrame> = whole.drain_frames().collect();
        assert_eq!(expected.len(), 3);

        for split in 1..stream.len() {
            let mut parser = StreamParser::new();
            parser.feed(&stream[..split]);
            parser.feed(&stream[split..]);
            let got: Vec<RawFrame> = parser.drain_frames().collect();
            assert_eq!(got, expected, "split at byte {split} changed the frames");
        }
    }

    #[test]
    fn test_ascii_frame_extraction() {
        let mut parser = StreamParser::new();
        parser.feed(b"\r\n*HQ,1234567890,V1,123045,A#\r\n");

        assert_eq!(
            expect_ascii(parser.next_frame()),
            "HQ,1234567890,V1,123045,A"
        );
    }

    #[test]
    fn test_ascii_and_binary_interleaved() {
        let mut parser = StreamParser::new();
        let mut data = binary_frame(&[0x10]);
        data.extend_from_slice(b"*HQ,1,LK#");
        data.extend_from_slice(&binary_frame(&[0x20]));
        parser.feed(&data);

        assert_eq!(&expect_binary(parser.next_frame())[..], &[0x10]);
        assert_eq!(expect_ascii(parser.next_frame()), "HQ,1,LK");
        assert_eq!(&expect_binary(parser.next_frame())[..], &[0x20]);
    }

    #[test]
    fn test_ascii_non_ascii_interior_discarded() {
        let mut parser = StreamParser::new();
        let mut data = b"*HQ,".to_vec();
        data.push(0xFF);
        data.push(ASCII_END);
        parser.feed(&data);

        assert_eq!(parser.frames_available(), 0);
    }

    #[test]
    fn test_binary_accumulator_truncated_at_cap() {
        let mut parser = StreamParser::new();
        parser.feed(&[FRAME_DELIMITER]);

        let chunk = vec![0x41u8; 16 * 1024];
        for _ in 0..5 {
            parser.feed(&chunk);
        }

        assert_eq!(parser.frames_available(), 0);
        assert!(parser.buffer.len() <= BINARY_KEEP_TAIL + chunk.len());

        // Reframing recovers once well-formed frames arrive
        parser.feed(&binary_frame(&[0x07]));
        assert_eq!(&expect_binary(parser.next_frame())[..], &[0x07]);
    }

    #[test]
    fn test_ascii_accumulator_truncated_at_tighter_cap() {
        let mut parser = StreamParser::new();
        parser.feed(&[ASCII_START]);

        // 3 * 4 KiB = 12 KiB of comma noise without a terminator
        let chunk = vec![b','; 4 * 1024];
        for _ in 0..3 {
            parser.feed(&chunk);
        }

        assert_eq!(parser.frames_available(), 0);
        assert!(parser.buffer.len() <= ASCII_KEEP_TAIL + chunk.len());

        parser.feed(b"*HQ,1,LK#");
        assert_eq!(expect_ascii(parser.next_frame()), "HQ,1,LK");
    }

    #[test]
    fn test_clear_resets_parser() {
        let mut parser = StreamParser::new();
        parser.feed(&[FRAME_DELIMITER, 0x01, 0x02]);
        parser.clear();

        assert_eq!(parser.frames_available(), 0);
        parser.feed(&binary_frame(&[0x09]));
        assert_eq!(&expect_binary(parser.next_frame())[..], &[0x09]);
    }

    #[test]
    fn test_drain_frames_iterator() {
        let mut parser = StreamParser::new();
        let mut data = binary_frame(&[0x01]);
        data.extend_from_slice(&binary_frame(&[0x02]));
        data.extend_from_slice(&binary_frame(&[0x03]));
        parser.feed(&data);

        let mut iter = parser.drain_frames();
        assert_eq!(iter.len(), 3);
        assert!(iter.next().is_some());
        assert_eq!(iter.size_hint(), (2, Some(2)));

        let rest: Vec<_> = iter.collect();
        assert_eq!(rest.len(), 2);
        assert_eq!(parser.frames_available(), 0);
    }
}
