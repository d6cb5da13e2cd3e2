//! wasmini: a minimal WebAssembly MVP engine.
//!
//! The crate pairs a binary-format decoder with a stack-based
//! interpreter covering enough of the MVP instruction set for integer
//! arithmetic, locals, linear-memory stores, `if` blocks, calls, host
//! imports, and the `wasi_snapshot_preview1::fd_write` ABI.
//!
//! ```no_run
//! use wasmini::{Runtime, Value};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let wasm = std::fs::read("add.wasm")?;
//! let mut runtime = Runtime::instantiate(&wasm)?;
//! let sum = runtime.call("add", vec![Value::I32(2), Value::I32(3)])?;
//! assert_eq!(sum, Some(Value::I32(5)));
//! # Ok(())
//! # }
//! ```

pub mod binary;
pub mod error;
pub mod host;
pub mod model;
pub mod runtime;
pub mod vm;

pub use error::{DecodeError, InstantiationError, LinkError, Trap};
pub use host::{Imports, WasiSnapshotPreview1};
pub use model::{Module, Value, ValueType};
pub use runtime::Store;
pub use vm::Runtime;

/// Decode a module image into its IR without instantiating it.
pub fn parse(bytes: &[u8]) -> Result<Module, DecodeError> {
    Ok(binary::sections::decode_module(bytes)?)
}
