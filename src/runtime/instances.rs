//! Runtime instance records: functions (module-defined or imported),
//! exports, and the per-module export map.

use std::collections::HashMap;

use crate::model::{ExportDesc, Func, FuncType};

/// A module-defined function: its signature plus its decoded body.
#[derive(Debug, Clone)]
pub struct InternalFuncInst {
    pub func_type: FuncType,
    pub code: Func,
}

/// An imported function: resolved at call time against the host registry
/// (or the WASI handler) by (module, field) name.
#[derive(Debug, Clone)]
pub struct ExternalFuncInst {
    pub module: String,
    pub field: String,
    pub func_type: FuncType,
}

/// A function instance. Imports occupy the low indices in import order;
/// module-defined functions follow in code-section order.
#[derive(Debug, Clone)]
pub enum FuncInst {
    Internal(InternalFuncInst),
    External(ExternalFuncInst),
}

impl FuncInst {
    pub fn func_type(&self) -> &FuncType {
        match self {
            FuncInst::Internal(f) => &f.func_type,
            FuncInst::External(f) => &f.func_type,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportInst {
    pub name: String,
    pub desc: ExportDesc,
}

/// Instance-level view of a module: its exports keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ModuleInst {
    pub exports: HashMap<String, ExportInst>,
}
