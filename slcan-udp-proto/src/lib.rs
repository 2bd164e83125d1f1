//! Extended-identifier SLCAN framing as spoken by the motor controller
//! gateway, one frame per UDP datagram.

mod error;
mod frame;
mod hardware;
pub mod hex;
pub mod wire;

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

pub use error::*;
pub use frame::{CanFrame, EXTENDED_ID_MASK, MAX_DLC};
pub use hardware::{Embedded, HardwareFrame};
pub use wire::{decode, encode, encode_into, SlcanWireFrame};

pub const TYPE_DATA: u8 = b'T';
pub const TYPE_REMOTE: u8 = b'R';
pub const TERMINATOR: u8 = b'\r';

/// Hex digits of an extended identifier.
pub const ID_LEN: usize = 8;
/// Type, identifier and length characters.
pub const HEADER_LEN: usize = 1 + ID_LEN + 1;
pub const MIN_FRAME_LEN: usize = HEADER_LEN + 1;
pub const MAX_FRAME_LEN: usize = frame_len(MAX_DLC);

/// Length on the wire of a frame carrying `dlc` bytes, terminator included.
pub const fn frame_len(dlc: usize) -> usize {
    HEADER_LEN + 2 * dlc + 1
}

/// Line codec for carrying the same frames over a byte stream (serial
/// line, TCP) instead of datagrams. Malformed lines are logged and skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct SlcanCodec;

impl Decoder for SlcanCodec {
    type Item = CanFrame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        loop {
            // tolerate CR-LF line endings
            let skip = src.iter().take_while(|&&b| b == b'\n').count();
            let _ = src.split_to(skip);

            if src.is_empty() {
                return Ok(None);
            }

            let line_end = match src.iter().position(|&b| b == TERMINATOR) {
                Some(pos) => pos,
                None if src.len() >= MAX_FRAME_LEN => {
                    // no frame is this long; whatever follows up to the next
                    // CR is skipped as a malformed line
                    log::warn!("Dropping {} bytes without terminator", src.len());
                    src.clear();
                    return Ok(None);
                }
                None => return Ok(None),
            };

            let line = src.split_to(line_end + 1);
            if line.len() == 1 {
                // empty line
                continue;
            }

            match wire::decode(&line) {
                Ok(frame) => return Ok(Some(frame)),
                Err(e) => log::warn!("Dropping malformed line {:?}: {}", line, e),
            }
        }
    }
}

impl Encoder<CanFrame> for SlcanCodec {
    type Error = Error;

    fn encode(&mut self, item: CanFrame, dst: &mut BytesMut) -> Result<()> {
        encode_into(&item, dst)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_lengths() {
        assert_eq!(MIN_FRAME_LEN, 11);
        assert_eq!(MAX_FRAME_LEN, 27);
        assert_eq!(frame_len(3), 17);
    }

    #[test]
    fn stream_decoder_splits_lines() {
        let mut codec = SlcanCodec;
        let mut buf = BytesMut::from(&b"T1ABCDEF03010203\r\r\nR000000420\rT0000"[..]);

        let first = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(first, CanFrame::new(0x1ABCDEF0, &[1, 2, 3]).unwrap());

        let second = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(second, CanFrame::new_remote(0x42, 0).unwrap());

        // partial frame stays buffered
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(&buf[..], b"T0000");
    }

    #[test]
    fn stream_decoder_skips_garbage() {
        let mut codec = SlcanCodec;
        let mut buf = BytesMut::from(&b"X123\rT00000001F\rT000000010\rT1"[..]);

        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.id, 1);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(&buf[..], b"T1");
    }

    #[test]
    fn stream_decoder_drops_overlong_lines() {
        let mut codec = SlcanCodec;
        let mut buf = BytesMut::from(&[b'T'; 40][..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert!(buf.is_empty());

        // tail of the dropped line, then a good frame
        buf.extend_from_slice(b"TTTT\rT000000020\r");
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.id, 2);
    }

    #[test]
    fn stream_encoder_appends() {
        let mut codec = SlcanCodec;
        let mut buf = BytesMut::new();
        codec
            .encode(CanFrame::new(0x1, &[0xFF]).unwrap(), &mut buf)
            .unwrap();
        codec
            .encode(CanFrame::new_remote(0x2, 2).unwrap(), &mut buf)
            .unwrap();
        assert_eq!(&buf[..], b"T000000011FF\rR0000000220000\r");

        let mut bad = CanFrame::default();
        bad.data_length = 10;
        assert!(codec.encode(bad, &mut buf).is_err());
    }
}
