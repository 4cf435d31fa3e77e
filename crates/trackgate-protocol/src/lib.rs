pub mod ascii;
pub mod codec;
pub mod codecs;
pub mod frame;
pub mod header;
pub mod location;
pub mod response;
pub mod stream_parser;

pub use ascii::{alarm_label, parse_line, AsciiRecord};
pub use codec::TrackerCodec;
pub use codecs::{bcd_datetime, escape, hex_dump, hex_str, unescape, xor_checksum};
pub use frame::{open_binary, seal, RawFrame};
pub use header::{FrameHeader, SubpackageInfo};
pub use location::{LocationExtras, LocationRecord, STATUS_SOUTH_LATITUDE, STATUS_WEST_LONGITUDE};
pub use response::Response;
pub use stream_parser::{DrainFrames, StreamParser};
