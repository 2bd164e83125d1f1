use slcan_udp_proto::{EncodeError, ParseError};
use thiserror::Error;

use crate::queue::QueueFull;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO Error: {0}")]
    IOError(#[from] std::io::Error),

    #[error("Protocol Error: {0}")]
    Parse(#[from] ParseError),

    #[error("Invalid frame: {0}")]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    QueueFull(#[from] QueueFull),

    #[error("Gateway is not connected")]
    NotConnected,

    #[error("Gateway failed, reset required")]
    Failed,

    #[error("Could not resolve {addr}: {source}")]
    Resolve {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No address of the local endpoint's family for {addr}")]
    NoAddress { addr: String },

    #[error("Background reader exited")]
    ReaderClosed,
}
