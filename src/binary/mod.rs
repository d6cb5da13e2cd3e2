//! Binary-format reading for the WASM MVP subset: cursor, LEB128, vector
//! helpers, instruction and section decoders.
//! Errors at this layer carry the byte offset they were detected at; the
//! public API wraps them into crate::error::DecodeError.

pub mod cursor;
pub mod instruction;
pub mod leb128;
pub mod reader;
pub mod sections;

use thiserror::Error;

/// Result alias for binary reading operations.
pub type Result<T> = core::result::Result<T, BinaryReadError>;

/// Errors that can occur while reading a WASM binary stream.
#[derive(Debug, Error)]
pub enum BinaryReadError {
    #[error("unexpected EOF at offset {offset}")]
    UnexpectedEof { offset: usize },

    #[error("LEB128 overflow (target bits={target_bits}) at offset {offset}")]
    Leb128Overflow { target_bits: u8, offset: usize },

    #[error("too many bytes in LEB128 (limit={limit}) at offset {offset}")]
    Leb128TooManyBytes { limit: u8, offset: usize },

    #[error("invalid UTF-8 string at offset {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("invalid opcode 0x{opcode:02x} at offset {offset}")]
    InvalidOpcode { opcode: u8, offset: usize },

    #[error("malformed binary at offset {offset}: {msg}")]
    Malformed { offset: usize, msg: &'static str },
}
