/// Frame sentinel for the binary variant
pub const FRAME_DELIMITER: u8 = 0x7E;

/// Transparent-byte escape marker
pub const ESCAPE_BYTE: u8 = 0x7D;
/// 0x7D 0x01 decodes to 0x7D
pub const ESCAPED_ESCAPE: u8 = 0x01;
/// 0x7D 0x02 decodes to 0x7E
pub const ESCAPED_DELIMITER: u8 = 0x02;

/// Frame sentinels for the legacy ASCII variant
pub const ASCII_START: u8 = b'*';
pub const ASCII_END: u8 = b'#';

/// Header layout (bytes)
pub const HEADER_LEN: usize = 12;
pub const HEADER_LEN_SUBPACKAGE: usize = 16;

/// Terminal identifier wire form
pub const TERMINAL_BCD_LEN: usize = 6;
pub const TERMINAL_DIGITS: usize = 12;

/// Properties word bit layout
pub const PROPS_BODY_LEN_MASK: u16 = 0x03FF;
pub const PROPS_SUBPACKAGE_FLAG: u16 = 1 << 13;

/// Fixed prefix of a location report body (bytes)
pub const LOCATION_PREFIX_LEN: usize = 28;

/// Reframer accumulator bounds. A stream that grows past the cap without
/// yielding a frame is truncated to the keep-tail, never disconnected.
pub const MAX_BINARY_ACCUMULATOR: usize = 65_536;
pub const BINARY_KEEP_TAIL: usize = 4_096;
pub const MAX_ASCII_ACCUMULATOR: usize = 10_000;
pub const ASCII_KEEP_TAIL: usize = 1_000;

/// Result code in platform/registration acknowledgements
pub const RESULT_OK: u8 = 0;

/// Token echoed in the registration response unless configured otherwise
pub const DEFAULT_REGISTER_TOKEN: &str = "OK";

/// Legacy ASCII variant reports speed in knots
pub const KNOTS_TO_KMH: f64 = 1.852;
