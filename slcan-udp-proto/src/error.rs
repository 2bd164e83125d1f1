use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

fn printable(c: &u8) -> char {
    char::from(*c)
}

/// Malformed wire data. The offending frame is always discarded as a whole.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid frame type {:?}", printable(.0))]
    InvalidType(u8),

    #[error("Invalid hex digit {:?}", printable(.0))]
    InvalidDigit(u8),

    #[error("Invalid data length {0} (max 8)")]
    InvalidLength(u8),

    #[error("Identifier {0:#x} does not fit in 29 bits")]
    IdOutOfRange(u32),

    #[error("Frame truncated: need {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("Missing CR terminator")]
    MissingTerminator,
}

/// A frame that cannot be represented on the wire.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Invalid data length {0} (max 8)")]
    InvalidLength(usize),

    #[error("Identifier {0:#x} does not fit in 29 bits")]
    IdOutOfRange(u32),

    #[error("Standard (11 bit) identifiers are not supported")]
    StandardId,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO Error: {0}")]
    IOError(#[from] std::io::Error),

    #[error("Parse Error: {0}")]
    Parse(#[from] ParseError),

    #[error("Encode Error: {0}")]
    Encode(#[from] EncodeError),
}
