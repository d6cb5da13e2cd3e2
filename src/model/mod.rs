//! Decoded module IR: types, instructions, and the module structure itself.

pub mod instruction;
pub mod module;
pub mod types;

pub use instruction::{BlockType, Instruction};
pub use module::{DataSegment, Func, Memory, Module};
pub use types::{
    Export, ExportDesc, FuncIdx, FuncType, Import, ImportDesc, Limits, LocalIdx, TypeIdx, Value,
    ValueType,
};
