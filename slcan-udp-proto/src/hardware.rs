//! The accessor contract through which driver-specific frame types reach the
//! codec, plus adapters for the `embedded-can` HAL traits.

use embedded_can::{ExtendedId, Id};

use crate::frame::{CanFrame, EXTENDED_ID_MASK};
use crate::EncodeError;

/// Read access to a frame owned by a hardware driver.
pub trait HardwareFrame {
    /// Raw identifier bits.
    fn extended_id(&self) -> u32;

    /// False if the driver holds an 11 bit standard identifier.
    fn is_extended(&self) -> bool {
        true
    }

    fn is_remote_request(&self) -> bool;

    fn data_length(&self) -> usize;

    fn payload_bytes(&self) -> &[u8];
}

impl HardwareFrame for CanFrame {
    fn extended_id(&self) -> u32 {
        self.id
    }

    fn is_remote_request(&self) -> bool {
        self.remote_request
    }

    fn data_length(&self) -> usize {
        self.data_length.into()
    }

    fn payload_bytes(&self) -> &[u8] {
        self.data()
    }
}

impl CanFrame {
    pub fn from_hardware<H: HardwareFrame + ?Sized>(frame: &H) -> Result<Self, EncodeError> {
        if !frame.is_extended() {
            return Err(EncodeError::StandardId);
        }

        let dlc = frame.data_length();
        if frame.is_remote_request() {
            return CanFrame::new_remote(frame.extended_id(), dlc);
        }

        let data = frame
            .payload_bytes()
            .get(..dlc)
            .ok_or(EncodeError::InvalidLength(dlc))?;
        CanFrame::new(frame.extended_id(), data)
    }
}

/// Wraps any `embedded_can::Frame` so it can be handed to the gateway.
#[derive(Debug, Clone)]
pub struct Embedded<F>(pub F);

impl<F: embedded_can::Frame> HardwareFrame for Embedded<F> {
    fn extended_id(&self) -> u32 {
        match self.0.id() {
            Id::Extended(id) => id.as_raw(),
            Id::Standard(id) => id.as_raw().into(),
        }
    }

    fn is_extended(&self) -> bool {
        self.0.is_extended()
    }

    fn is_remote_request(&self) -> bool {
        self.0.is_remote_frame()
    }

    fn data_length(&self) -> usize {
        self.0.dlc()
    }

    fn payload_bytes(&self) -> &[u8] {
        self.0.data()
    }
}

/// Lets HAL code consume decoded frames directly. Standard identifiers are
/// refused.
impl embedded_can::Frame for CanFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        match id.into() {
            Id::Extended(id) => CanFrame::new(id.as_raw(), data).ok(),
            Id::Standard(_) => None,
        }
    }

    fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        match id.into() {
            Id::Extended(id) => CanFrame::new_remote(id.as_raw(), dlc).ok(),
            Id::Standard(_) => None,
        }
    }

    fn is_extended(&self) -> bool {
        true
    }

    fn is_remote_frame(&self) -> bool {
        self.remote_request
    }

    fn id(&self) -> Id {
        // out of range ids are masked here, encode still rejects them
        ExtendedId::new(self.id & EXTENDED_ID_MASK)
            .unwrap_or(ExtendedId::MAX)
            .into()
    }

    fn dlc(&self) -> usize {
        self.data_length.into()
    }

    fn data(&self) -> &[u8] {
        CanFrame::data(self)
    }
}
