//! Queue, flush and receive [`CanFrame`]s through a UDP SLCAN gateway.

pub mod error;
mod gateway;
pub mod queue;
pub mod transport;
mod util;

pub use error::*;
pub use gateway::{Gateway, GatewayConfig, GatewayState, DEFAULT_READ_BUFFER};
pub use queue::{FlushError, FlushReport, OutboundQueue, QueueFull};
pub use transport::{Transport, UdpTransport, CAN_PORT};

pub use slcan_udp_proto as proto;
pub use slcan_udp_proto::{CanFrame, HardwareFrame};
