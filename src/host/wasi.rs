//! A small slice of `wasi_snapshot_preview1`: `fd_write` against an
//! indexed table of writers.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tracing::trace;

use crate::error::Trap;
use crate::model::Value;
use crate::runtime::Store;

/// Import-module name the handler answers for.
pub const MODULE_NAME: &str = "wasi_snapshot_preview1";

/// A shared writer slot in the file table. Shared so embedders and tests
/// can keep a handle and observe what the module wrote.
pub type SharedWriter = Arc<Mutex<dyn Write + Send>>;

pub struct WasiSnapshotPreview1 {
    file_table: Vec<SharedWriter>,
}

impl WasiSnapshotPreview1 {
    /// File table with the conventional descriptors: 0 = stdin (writes
    /// discarded), 1 = stdout, 2 = stderr.
    pub fn new() -> Self {
        Self {
            file_table: vec![
                Arc::new(Mutex::new(io::sink())),
                Arc::new(Mutex::new(io::stdout())),
                Arc::new(Mutex::new(io::stderr())),
            ],
        }
    }

    pub fn with_file_table(file_table: Vec<SharedWriter>) -> Self {
        Self { file_table }
    }

    /// Dispatch a WASI call by function name. Unknown names are fatal.
    pub fn invoke(
        &self,
        store: &mut Store,
        func: &str,
        args: &[Value],
    ) -> Result<Option<Value>, Trap> {
        match func {
            "fd_write" => self.fd_write(store, args),
            _ => Err(Trap::NotFoundWasiFunction(func.to_string())),
        }
    }

    /// fd_write(fd, iovs, iovs_len, rp) -> errno. Walks `iovs_len`
    /// (start, len) pairs in linear memory, writes each region to the
    /// descriptor, and stores the byte count at `rp`.
    fn fd_write(&self, store: &mut Store, args: &[Value]) -> Result<Option<Value>, Trap> {
        let [fd, iovs, iovs_len, rp] = expect_i32_args(args)?;

        let file = self
            .file_table
            .get(fd as usize)
            .cloned()
            .ok_or(Trap::BadFileDescriptor(fd as u32))?;
        let memory = store.memories.get_mut(0).ok_or(Trap::NotFoundMemory)?;
        let mut writer = file
            .lock()
            .map_err(|_| Trap::Io(io::Error::other("file table lock poisoned")))?;

        let mut cursor = iovs as u32;
        let mut nwritten = 0i32;
        for _ in 0..iovs_len {
            let start = memory.load_i32(cursor)? as u32;
            cursor += 4;
            let len = memory.load_i32(cursor)? as u32;
            cursor += 4;

            let begin = start as usize;
            let end = begin
                .checked_add(len as usize)
                .ok_or(Trap::OutOfBoundsMemoryAccess)?;
            let bytes = memory
                .data
                .get(begin..end)
                .ok_or(Trap::OutOfBoundsMemoryAccess)?;
            writer.write_all(bytes)?;
            nwritten = nwritten.wrapping_add(len as i32);
        }
        memory.store_i32(rp as u32, nwritten)?;

        trace!(fd, nwritten, "fd_write");
        Ok(Some(Value::I32(0)))
    }
}

impl Default for WasiSnapshotPreview1 {
    fn default() -> Self {
        Self::new()
    }
}

fn expect_i32_args(args: &[Value]) -> Result<[i32; 4], Trap> {
    let mut out = [0i32; 4];
    if args.len() != out.len() {
        return Err(Trap::TypeMismatch { expected: "i32" });
    }
    for (slot, arg) in out.iter_mut().zip(args) {
        match arg {
            Value::I32(v) => *slot = *v,
            Value::I64(_) => return Err(Trap::TypeMismatch { expected: "i32" }),
        }
    }
    Ok(out)
}
