//! Module-level IR: declarations, function bodies, and data segments as
//! decoded from the binary, before instantiation.

use super::instruction::Instruction;
use super::types::{Export, FuncType, Import, Limits, TypeIdx, ValueType};

/// Body of a defined function. Locals are already expanded from the
/// binary's run-length pairs into one entry per local.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Func {
    pub locals: Vec<ValueType>,
    pub body: Vec<Instruction>,
}

/// A memory declaration (limits in 64 KiB pages).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Memory {
    pub limits: Limits,
}

/// An active data segment: bytes copied into a memory at instantiation.
/// The offset is kept as its constant expression and evaluated by the
/// store builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSegment {
    pub memory_index: u32,
    pub offset_expr: Vec<Instruction>,
    pub init: Vec<u8>,
}

/// The decoded module: a plain structure holding each section's contents.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Module {
    pub types: Vec<FuncType>,
    pub imports: Vec<Import>,
    /// Type indices of defined functions, in code-section order.
    pub functions: Vec<TypeIdx>,
    pub memories: Vec<Memory>,
    pub exports: Vec<Export>,
    /// Bodies of defined functions (same length and order as `functions`).
    pub codes: Vec<Func>,
    pub data: Vec<DataSegment>,
}
