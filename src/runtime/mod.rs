//! Runtime instances: the store, function/export records, linear memory.

pub mod instances;
pub mod memory;
pub mod store;

pub use instances::{ExportInst, ExternalFuncInst, FuncInst, InternalFuncInst, ModuleInst};
pub use memory::{MemoryInst, PAGE_SIZE};
pub use store::Store;
