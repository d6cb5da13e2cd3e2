//! The store: everything a runtime needs after instantiation. Building a
//! store consumes the decoded module, interleaves imported and internal
//! functions into one index space, allocates linear memory, and applies
//! data segments.

use std::collections::HashMap;

use tracing::debug;

use super::instances::{ExportInst, ExternalFuncInst, FuncInst, InternalFuncInst, ModuleInst};
use super::memory::MemoryInst;
use crate::error::LinkError;
use crate::model::{ImportDesc, Instruction, Module};

#[derive(Debug, Default)]
pub struct Store {
    pub funcs: Vec<FuncInst>,
    pub memories: Vec<MemoryInst>,
    pub module: ModuleInst,
}

impl Store {
    pub fn new(module: Module) -> Result<Self, LinkError> {
        let func_type = |idx: u32| {
            module
                .types
                .get(idx as usize)
                .cloned()
                .ok_or(LinkError::InvalidTypeIndex(idx))
        };

        // Imports come first, preserving import order.
        let mut funcs = Vec::with_capacity(module.imports.len() + module.codes.len());
        for import in &module.imports {
            let ImportDesc::Func(type_idx) = import.desc;
            funcs.push(FuncInst::External(ExternalFuncInst {
                module: import.module.clone(),
                field: import.field.clone(),
                func_type: func_type(type_idx)?,
            }));
        }
        for (code, &type_idx) in module.codes.iter().zip(&module.functions) {
            funcs.push(FuncInst::Internal(InternalFuncInst {
                func_type: func_type(type_idx)?,
                code: code.clone(),
            }));
        }

        let mut exports = HashMap::with_capacity(module.exports.len());
        for export in &module.exports {
            let crate::model::ExportDesc::Func(idx) = export.desc;
            if idx as usize >= funcs.len() {
                return Err(LinkError::InvalidExportIndex(idx));
            }
            exports.insert(
                export.name.clone(),
                ExportInst {
                    name: export.name.clone(),
                    desc: export.desc,
                },
            );
        }

        let mut memories: Vec<MemoryInst> =
            module.memories.iter().map(MemoryInst::new).collect();

        for segment in &module.data {
            let offset = eval_const_expr(&segment.offset_expr)?;
            let memory = memories
                .get_mut(segment.memory_index as usize)
                .ok_or(LinkError::MissingMemory(segment.memory_index))?;
            let end = offset
                .checked_add(segment.init.len())
                .ok_or(LinkError::DataSegmentOutOfBounds)?;
            if end > memory.data.len() {
                return Err(LinkError::DataSegmentOutOfBounds);
            }
            memory.data[offset..end].copy_from_slice(&segment.init);
        }

        debug!(
            funcs = funcs.len(),
            exports = exports.len(),
            memories = memories.len(),
            "store built"
        );
        Ok(Self {
            funcs,
            memories,
            module: ModuleInst { exports },
        })
    }
}

/// Evaluate a data-segment offset expression. Only `i32.const` may
/// produce the offset in this subset.
fn eval_const_expr(insts: &[Instruction]) -> Result<usize, LinkError> {
    match insts {
        [Instruction::I32Const(v), Instruction::End] if *v >= 0 => Ok(*v as usize),
        _ => Err(LinkError::UnsupportedConstExpr),
    }
}
