use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Protocol errors
    #[error("Framing error: {message}")]
    Framing { message: String },

    #[error("Checksum mismatch: computed {computed:#04x}, frame carries {received:#04x}")]
    Checksum { computed: u8, received: u8 },

    #[error("Length error: {message}")]
    Length { message: String },

    #[error("TLV 0x{tag:02x} declares {declared} value bytes but only {remaining} remain")]
    Tlv {
        tag: u8,
        declared: usize,
        remaining: usize,
    },

    #[error("Invalid terminal id: {message}")]
    Terminal { message: String },

    #[error("Invalid field: {message}")]
    Field { message: String },

    #[error("Invalid timestamp: {message}")]
    Timestamp { message: String },

    // Downstream errors
    #[error("Event sink rejected event: {0}")]
    Sink(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing configuration key: {0}")]
    MissingConfig(String),
}

impl Error {
    /// Short classification label used in structured parse-error events.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Framing { .. } => "framing",
            Error::Checksum { .. } => "checksum",
            Error::Length { .. } => "length",
            Error::Tlv { .. } => "tlv",
            Error::Terminal { .. } => "terminal",
            Error::Field { .. } => "field",
            Error::Timestamp { .. } => "timestamp",
            Error::Sink(_) => "sink",
            Error::Io(_) => "io",
            Error::Config(_) | Error::MissingConfig(_) => "config",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
