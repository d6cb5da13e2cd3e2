//! ULEB128/SLEB128 decoding for the integer widths the module format uses.
//! A 32-bit read consumes at most 5 bytes and a 64-bit read at most 10;
//! anything longer, or a value that does not fit the target width, is an
//! encoding error rather than a silent truncation.

use super::{cursor::Cursor, BinaryReadError, Result};

/// Decode an unsigned LEB128 as u32.
pub fn read_u32(cur: &mut Cursor) -> Result<u32> {
    unsigned(cur, 32).map(|v| v as u32)
}

/// Decode a signed LEB128 as i32.
pub fn read_i32(cur: &mut Cursor) -> Result<i32> {
    signed(cur, 32).map(|v| v as i32)
}

/// Decode a signed LEB128 as i64.
pub fn read_i64(cur: &mut Cursor) -> Result<i64> {
    signed(cur, 64)
}

fn max_bytes(bits: u8) -> u8 {
    bits.div_ceil(7)
}

fn unsigned(cur: &mut Cursor, bits: u8) -> Result<u64> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;
    let limit = max_bytes(bits);

    for _ in 0..limit {
        let byte = cur.read_u8()?;
        let payload = (byte & 0x7F) as u64;
        if shift >= 64 || (payload << shift) >> shift != payload {
            return Err(BinaryReadError::Leb128Overflow {
                target_bits: bits,
                offset: cur.offset(),
            });
        }
        result |= payload << shift;

        if byte & 0x80 == 0 {
            if bits < 64 && (result >> bits) != 0 {
                return Err(BinaryReadError::Leb128Overflow {
                    target_bits: bits,
                    offset: cur.offset(),
                });
            }
            return Ok(result);
        }
        shift += 7;
    }

    Err(BinaryReadError::Leb128TooManyBytes {
        limit,
        offset: cur.offset(),
    })
}

fn signed(cur: &mut Cursor, bits: u8) -> Result<i64> {
    let mut result: i64 = 0;
    let mut shift: u32 = 0;
    let limit = max_bytes(bits);

    for _ in 0..limit {
        let byte = cur.read_u8()?;
        result |= ((byte & 0x7F) as i64) << shift;
        shift += 7;

        if byte & 0x80 == 0 {
            // Sign-extend when the payload's sign bit is set and the full
            // width has not been filled yet.
            if byte & 0x40 != 0 && shift < bits as u32 {
                result |= !0i64 << shift;
            }
            if bits < 64 {
                let min = -(1i64 << (bits - 1));
                let max = (1i64 << (bits - 1)) - 1;
                if result < min || result > max {
                    return Err(BinaryReadError::Leb128Overflow {
                        target_bits: bits,
                        offset: cur.offset(),
                    });
                }
            }
            return Ok(result);
        }
    }

    Err(BinaryReadError::Leb128TooManyBytes {
        limit,
        offset: cur.offset(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_unsigned(mut v: u64) -> Vec<u8> {
        let mut out = Vec::new();
        loop {
            let byte = (v & 0x7F) as u8;
            v >>= 7;
            if v == 0 {
                out.push(byte);
                return out;
            }
            out.push(byte | 0x80);
        }
    }

    fn encode_signed(mut v: i64) -> Vec<u8> {
        let mut out = Vec::new();
        loop {
            let byte = (v & 0x7F) as u8;
            v >>= 7;
            let done = (v == 0 && byte & 0x40 == 0) || (v == -1 && byte & 0x40 != 0);
            if done {
                out.push(byte);
                return out;
            }
            out.push(byte | 0x80);
        }
    }

    #[test]
    fn unsigned_vectors() {
        let mut c = Cursor::new(&[0xE5, 0x8E, 0x26]);
        assert_eq!(read_u32(&mut c).unwrap(), 624_485);
        let mut c = Cursor::new(&[0x00]);
        assert_eq!(read_u32(&mut c).unwrap(), 0);
        let mut c = Cursor::new(&[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
        assert_eq!(read_u32(&mut c).unwrap(), u32::MAX);
    }

    #[test]
    fn signed_vectors() {
        let mut c = Cursor::new(&[0x9B, 0xF1, 0x59]);
        assert_eq!(read_i32(&mut c).unwrap(), -624_485);
        let mut c = Cursor::new(&[0x7F]);
        assert_eq!(read_i32(&mut c).unwrap(), -1);
        let mut c = Cursor::new(&[0x80, 0x80, 0x80, 0x80, 0x78]);
        assert_eq!(read_i32(&mut c).unwrap(), i32::MIN);
    }

    #[test]
    fn boundary_round_trips() {
        for v in [0u64, 1, 127, 128, u32::MAX as u64] {
            let bytes = encode_unsigned(v);
            let mut c = Cursor::new(&bytes);
            assert_eq!(read_u32(&mut c).unwrap() as u64, v);
            assert!(c.is_eof());
        }
        for v in [0i64, -1, 63, -64, i32::MAX as i64, i32::MIN as i64] {
            let bytes = encode_signed(v);
            let mut c = Cursor::new(&bytes);
            assert_eq!(read_i32(&mut c).unwrap() as i64, v);
        }
        for v in [i64::MAX, i64::MIN, -1i64, 0] {
            let bytes = encode_signed(v);
            let mut c = Cursor::new(&bytes);
            assert_eq!(read_i64(&mut c).unwrap(), v);
        }
    }

    #[test]
    fn rejects_overlong_and_truncated() {
        let mut c = Cursor::new(&[0xFF; 6]);
        assert!(matches!(
            read_u32(&mut c).unwrap_err(),
            BinaryReadError::Leb128TooManyBytes { .. } | BinaryReadError::Leb128Overflow { .. }
        ));

        let mut c = Cursor::new(&[0x80, 0x80]);
        assert!(matches!(
            read_u32(&mut c).unwrap_err(),
            BinaryReadError::UnexpectedEof { .. }
        ));
    }

    #[test]
    fn rejects_width_overflow() {
        // 2^32 encoded: fits in 5 bytes but not in 32 bits.
        let bytes = encode_unsigned(1u64 << 32);
        let mut c = Cursor::new(&bytes);
        assert!(matches!(
            read_u32(&mut c).unwrap_err(),
            BinaryReadError::Leb128Overflow { .. }
        ));
    }
}
