//! Nibble level conversion between ASCII hex digits and integers.

use bytes::BufMut;

use crate::ParseError;

const HEX_SET: &[u8; 16] = b"0123456789ABCDEF";

/// Value of a single ASCII hex digit, either case.
pub fn nibble(c: u8) -> Result<u8, ParseError> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'A'..=b'F' => Ok(10 + c - b'A'),
        b'a'..=b'f' => Ok(10 + c - b'a'),
        _ => Err(ParseError::InvalidDigit(c)),
    }
}

/// Reads `count` hex digits from the start of `chars`, most significant
/// nibble first.
///
/// `count` must not exceed 8, the width of the returned integer. Nothing is
/// returned if any digit is invalid.
pub fn decode_hex(chars: &[u8], count: usize) -> Result<u32, ParseError> {
    debug_assert!(count <= 8, "decode_hex reads at most 8 nibbles");

    let digits = chars.get(..count).ok_or(ParseError::Truncated {
        expected: count,
        actual: chars.len(),
    })?;

    digits
        .iter()
        .try_fold(0u32, |acc, &c| Ok((acc << 4) | u32::from(nibble(c)?)))
}

/// Reads one payload byte from a pair of hex digits.
pub fn decode_byte(chars: &[u8]) -> Result<u8, ParseError> {
    // two nibbles always fit
    decode_hex(chars, 2).map(|v| v as u8)
}

/// Appends exactly `width` uppercase hex digits of `value`, most
/// significant nibble first. Digits above bit 31 are written as `'0'`.
pub fn encode_hex<B: BufMut>(value: u32, width: usize, dst: &mut B) {
    for i in (0..width).rev() {
        let shift = u32::try_from(i * 4).unwrap_or(u32::MAX);
        let digit = value.checked_shr(shift).unwrap_or(0) & 0xf;
        dst.put_u8(HEX_SET[digit as usize]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    fn encoded(value: u32, width: usize) -> BytesMut {
        let mut buf = BytesMut::new();
        encode_hex(value, width, &mut buf);
        buf
    }

    #[test]
    fn encodes_deadbeef() {
        assert_eq!(&encoded(0xDEADBEEF, 8)[..], b"DEADBEEF");
    }

    #[test]
    fn encode_pads_and_truncates_to_width() {
        assert_eq!(&encoded(0x1A, 8)[..], b"0000001A");
        assert_eq!(&encoded(0x1A, 1)[..], b"A");
        assert_eq!(&encoded(0x7, 10)[..], b"0000000007");
        assert_eq!(&encoded(0xFFFF_FFFF, 10)[..], b"00FFFFFFFF");
        assert!(encoded(0x1234, 0).is_empty());
    }

    #[test]
    fn decodes_big_endian_any_case() {
        assert_eq!(decode_hex(b"DEADBEEF", 8), Ok(0xDEADBEEF));
        assert_eq!(decode_hex(b"deadBEEF", 8), Ok(0xDEADBEEF));
        assert_eq!(decode_hex(b"1ABCDEF03", 8), Ok(0x1ABCDEF0));
        assert_eq!(decode_hex(b"8", 1), Ok(8));
        assert_eq!(decode_byte(b"fF"), Ok(0xFF));
    }

    #[test]
    fn rejects_non_hex_digits() {
        for bad in [b'G', b'g', b' ', b'\r', b'-', 0x00, 0xFF, b'x'] {
            let input = [b'1', bad, b'2'];
            assert_eq!(decode_hex(&input, 3), Err(ParseError::InvalidDigit(bad)));
        }
    }

    #[test]
    fn reports_first_invalid_digit() {
        assert_eq!(decode_hex(b"1Z2Y", 4), Err(ParseError::InvalidDigit(b'Z')));
    }

    #[test]
    fn rejects_short_input() {
        assert_eq!(
            decode_hex(b"12", 8),
            Err(ParseError::Truncated {
                expected: 8,
                actual: 2
            })
        );
    }
}
