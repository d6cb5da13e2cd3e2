//! Crate-level error types: decoding, instantiation, and execution traps.

use thiserror::Error;

/// Failure while decoding a module image. Fatal to instantiation.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Binary(#[from] crate::binary::BinaryReadError),
}

/// Failure while building a store from a decoded module.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("invalid type index {0}")]
    InvalidTypeIndex(u32),

    #[error("invalid export function index {0}")]
    InvalidExportIndex(u32),

    #[error("data segment refers to missing memory {0}")]
    MissingMemory(u32),

    #[error("unsupported instruction in constant expression")]
    UnsupportedConstExpr,

    #[error("data is too large to fit in memory")]
    DataSegmentOutOfBounds,
}

/// Failure while instantiating a runtime from raw bytes.
#[derive(Debug, Error)]
pub enum InstantiationError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Link(#[from] LinkError),
}

/// Execution failure. Aborts the current call; the runtime may be reused.
#[derive(Debug, Error)]
pub enum Trap {
    #[error("not found export function: {0}")]
    NotFoundExportFunction(String),

    #[error("not found module: {0}")]
    NotFoundModule(String),

    #[error("not found function: {0}")]
    NotFoundFunction(String),

    #[error("not found wasi function: {0}")]
    NotFoundWasiFunction(String),

    #[error("undefined function index {0}")]
    UndefinedFunction(u32),

    #[error("undefined local index {0}")]
    UndefinedLocal(u32),

    #[error("not found memory")]
    NotFoundMemory,

    #[error("type mismatch: expected {expected} on the stack")]
    TypeMismatch { expected: &'static str },

    #[error("stack underflow")]
    StackUnderflow,

    #[error("call stack underflow")]
    CallStackUnderflow,

    #[error("out of bounds memory access")]
    OutOfBoundsMemoryAccess,

    #[error("unmatched end for if")]
    UnmatchedEnd,

    #[error("bad file descriptor {0}")]
    BadFileDescriptor(u32),

    #[error("wasi i/o error: {0}")]
    Io(#[from] std::io::Error),
}
