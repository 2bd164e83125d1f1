//! Conversion between [`CanFrame`] and the extended SLCAN line format:
//!
//! ```text
//! +------+------------+-------+--------------+----+
//! | T/R  | id: 8 hex  | dlc:1 | data: 2*dlc  | CR |
//! +------+------------+-------+--------------+----+
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::frame::{CanFrame, EXTENDED_ID_MASK, MAX_DLC};
use crate::hex::{decode_byte, decode_hex, encode_hex};
use crate::{
    frame_len, EncodeError, ParseError, HEADER_LEN, ID_LEN, MAX_FRAME_LEN, MIN_FRAME_LEN,
    TERMINATOR, TYPE_DATA, TYPE_REMOTE,
};

/// An encoded frame, ready to be written as a single datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlcanWireFrame {
    bytes: Bytes,
}

impl SlcanWireFrame {
    /// Total length on the wire, `11 + 2 * dlc`.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

impl AsRef<[u8]> for SlcanWireFrame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

pub fn decode(wire: &[u8]) -> Result<CanFrame, ParseError> {
    let remote_request = match wire.first() {
        Some(&TYPE_DATA) => false,
        Some(&TYPE_REMOTE) => true,
        Some(&other) => return Err(ParseError::InvalidType(other)),
        None => {
            return Err(ParseError::Truncated {
                expected: MIN_FRAME_LEN,
                actual: 0,
            })
        }
    };

    if wire.len() < HEADER_LEN {
        return Err(ParseError::Truncated {
            expected: MIN_FRAME_LEN,
            actual: wire.len(),
        });
    }

    let id = decode_hex(&wire[1..], ID_LEN)?;
    if id & !EXTENDED_ID_MASK != 0 {
        return Err(ParseError::IdOutOfRange(id));
    }

    // a single nibble always fits into u8
    let dlc = decode_hex(&wire[1 + ID_LEN..], 1)? as u8;
    if usize::from(dlc) > MAX_DLC {
        return Err(ParseError::InvalidLength(dlc));
    }

    let expected = frame_len(dlc.into());
    if wire.len() < expected - 1 {
        return Err(ParseError::Truncated {
            expected,
            actual: wire.len(),
        });
    }

    let mut payload = [0u8; MAX_DLC];
    let data = &wire[HEADER_LEN..expected - 1];
    for (byte, pair) in payload.iter_mut().zip(data.chunks_exact(2)) {
        *byte = decode_byte(pair)?;
    }

    // anything after the terminator is datagram padding
    if wire.get(expected - 1) != Some(&TERMINATOR) {
        return Err(ParseError::MissingTerminator);
    }

    Ok(CanFrame {
        id,
        remote_request,
        data_length: dlc,
        payload,
    })
}

pub fn encode(frame: &CanFrame) -> Result<SlcanWireFrame, EncodeError> {
    let mut buf = BytesMut::with_capacity(MAX_FRAME_LEN);
    encode_into(frame, &mut buf)?;
    Ok(SlcanWireFrame {
        bytes: buf.freeze(),
    })
}

/// Appends the wire form of `frame` to `dst` and returns the number of bytes
/// written. Nothing is written if the frame is rejected.
pub fn encode_into(frame: &CanFrame, dst: &mut BytesMut) -> Result<usize, EncodeError> {
    frame.validate()?;

    let total = frame_len(frame.data_length.into());
    dst.reserve(total);

    dst.put_u8(if frame.remote_request {
        TYPE_REMOTE
    } else {
        TYPE_DATA
    });
    encode_hex(frame.id, ID_LEN, dst);
    encode_hex(frame.data_length.into(), 1, dst);
    for &byte in frame.data() {
        encode_hex(byte.into(), 2, dst);
    }
    dst.put_u8(TERMINATOR);

    Ok(total)
}
