//! Composite reads shared by the section decoders: counted vectors,
//! length-prefixed byte strings, UTF-8 names.

use super::{cursor::Cursor, leb128, BinaryReadError, Result};

/// Read a ULEB128 length followed by that many raw bytes.
pub fn read_len_prefixed_bytes(cur: &mut Cursor) -> Result<Vec<u8>> {
    let len = leb128::read_u32(cur)? as usize;
    Ok(cur.read_bytes(len)?.to_vec())
}

/// Read a UTF-8 name (length-prefixed bytes).
pub fn read_name(cur: &mut Cursor) -> Result<String> {
    let bytes = read_len_prefixed_bytes(cur)?;
    String::from_utf8(bytes).map_err(|_| BinaryReadError::InvalidUtf8 {
        offset: cur.offset(),
    })
}

/// Read a ULEB128 count followed by that many elements.
pub fn read_vec<T, F>(cur: &mut Cursor, mut elem: F) -> Result<Vec<T>>
where
    F: FnMut(&mut Cursor) -> Result<T>,
{
    let count = leb128::read_u32(cur)? as usize;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(elem(cur)?);
    }
    Ok(out)
}
