//! Host-side boundary: the import registry and the WASI handler.

pub mod wasi;

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Trap;
use crate::model::Value;
use crate::runtime::Store;

pub use wasi::WasiSnapshotPreview1;

/// A host function callable from module code. It receives the store (so
/// it may read or write linear memory) and its arguments by value, and
/// returns at most one value.
pub type HostFunc = dyn Fn(&mut Store, &[Value]) -> Result<Option<Value>, Trap> + Send + Sync;

/// Registry of host functions keyed by import module then field name.
/// The two levels keep "unknown module" and "unknown function" failures
/// distinguishable.
#[derive(Default)]
pub struct Imports {
    modules: HashMap<String, HashMap<String, Arc<HostFunc>>>,
}

impl Imports {
    /// Register or replace the host function bound to `(module, field)`.
    pub fn register<F>(&mut self, module: &str, field: &str, f: F)
    where
        F: Fn(&mut Store, &[Value]) -> Result<Option<Value>, Trap> + Send + Sync + 'static,
    {
        self.modules
            .entry(module.to_string())
            .or_default()
            .insert(field.to_string(), Arc::new(f));
    }

    pub fn resolve(&self, module: &str, field: &str) -> Result<Arc<HostFunc>, Trap> {
        let fields = self
            .modules
            .get(module)
            .ok_or_else(|| Trap::NotFoundModule(module.to_string()))?;
        fields
            .get(field)
            .cloned()
            .ok_or_else(|| Trap::NotFoundFunction(field.to_string()))
    }
}
