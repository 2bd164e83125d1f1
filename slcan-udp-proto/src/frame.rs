use std::fmt;

use crate::EncodeError;

/// Highest data length code of a classic CAN frame.
pub const MAX_DLC: usize = 8;

/// Significant bits of an extended identifier.
pub const EXTENDED_ID_MASK: u32 = 0x1FFF_FFFF;

/// A classic CAN frame with a 29 bit identifier.
///
/// Only the first `data_length` bytes of `payload` are meaningful; the rest
/// never takes part in comparisons or encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanFrame {
    pub id: u32,
    pub remote_request: bool,
    pub data_length: u8,
    pub payload: [u8; MAX_DLC],
}

impl CanFrame {
    pub fn new(id: u32, data: &[u8]) -> Result<Self, EncodeError> {
        check_id(id)?;
        if data.len() > MAX_DLC {
            return Err(EncodeError::InvalidLength(data.len()));
        }

        let mut payload = [0u8; MAX_DLC];
        payload[..data.len()].copy_from_slice(data);

        Ok(CanFrame {
            id,
            remote_request: false,
            data_length: data.len() as u8,
            payload,
        })
    }

    pub fn new_remote(id: u32, dlc: usize) -> Result<Self, EncodeError> {
        check_id(id)?;
        if dlc > MAX_DLC {
            return Err(EncodeError::InvalidLength(dlc));
        }

        Ok(CanFrame {
            id,
            remote_request: true,
            data_length: dlc as u8,
            payload: [0u8; MAX_DLC],
        })
    }

    /// The meaningful payload bytes. Empty if `data_length` is out of range.
    pub fn data(&self) -> &[u8] {
        self.payload
            .get(..usize::from(self.data_length))
            .unwrap_or(&[])
    }

    /// Checks the invariants a frame must hold before it goes on the wire.
    pub fn validate(&self) -> Result<(), EncodeError> {
        check_id(self.id)?;
        if usize::from(self.data_length) > MAX_DLC {
            return Err(EncodeError::InvalidLength(self.data_length.into()));
        }
        Ok(())
    }
}

fn check_id(id: u32) -> Result<(), EncodeError> {
    if id & !EXTENDED_ID_MASK != 0 {
        Err(EncodeError::IdOutOfRange(id))
    } else {
        Ok(())
    }
}

impl PartialEq for CanFrame {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.remote_request == other.remote_request
            && self.data_length == other.data_length
            && self.data() == other.data()
    }
}

impl Eq for CanFrame {}

/// candump style, e.g. `1ABCDEF0#010203` or `1ABCDEF0#R3`
impl fmt::Display for CanFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}#", self.id)?;
        if self.remote_request {
            write!(f, "R{}", self.data_length)
        } else {
            self.data().iter().try_for_each(|b| write!(f, "{b:02X}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_oversized_frames() {
        assert_eq!(
            CanFrame::new(0x2000_0000, &[]),
            Err(EncodeError::IdOutOfRange(0x2000_0000))
        );
        assert_eq!(
            CanFrame::new(0x10, &[0; 9]),
            Err(EncodeError::InvalidLength(9))
        );
        assert_eq!(
            CanFrame::new_remote(0x10, 9),
            Err(EncodeError::InvalidLength(9))
        );
    }

    #[test]
    fn equality_ignores_unused_payload() {
        let a = CanFrame::new(0x123, &[1, 2]).unwrap();
        let mut b = a;
        b.payload[5] = 0xAA;
        assert_eq!(a, b);

        b.payload[1] = 0xAA;
        assert_ne!(a, b);
    }

    #[test]
    fn data_never_panics_on_bad_length() {
        let frame = CanFrame {
            data_length: 12,
            ..CanFrame::default()
        };
        assert!(frame.data().is_empty());
        assert_eq!(frame.validate(), Err(EncodeError::InvalidLength(12)));
    }

    #[test]
    fn displays_candump_style() {
        let frame = CanFrame::new(0x1ABCDEF0, &[1, 2, 3]).unwrap();
        assert_eq!(frame.to_string(), "1ABCDEF0#010203");

        let remote = CanFrame::new_remote(0x42, 4).unwrap();
        assert_eq!(remote.to_string(), "00000042#R4");
    }
}
