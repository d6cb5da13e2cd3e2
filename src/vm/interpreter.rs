//! The step-loop interpreter and the embedder-facing `Runtime`.

use tracing::{debug, trace};

use super::frame::{Frame, Label, LabelKind};
use super::stack::ValueStack;
use crate::error::{InstantiationError, Trap};
use crate::host::{wasi, Imports, WasiSnapshotPreview1};
use crate::model::{ExportDesc, Instruction, Value};
use crate::runtime::{ExternalFuncInst, FuncInst, InternalFuncInst, Store};

/// A single-threaded execution engine over one instantiated module.
///
/// A `Runtime` owns its operand stack, call stack, store, and import
/// registry; it is not safe for concurrent mutation. Independent runtimes
/// do not interact.
pub struct Runtime {
    pub store: Store,
    pub stack: ValueStack,
    pub call_stack: Vec<Frame>,
    pub imports: Imports,
    pub wasi: Option<WasiSnapshotPreview1>,
}

impl Runtime {
    /// Decode `bytes`, build a store, and return a runtime with an empty
    /// import table and no WASI handler.
    pub fn instantiate(bytes: impl AsRef<[u8]>) -> Result<Self, InstantiationError> {
        let module = crate::parse(bytes.as_ref())?;
        let store = Store::new(module)?;
        Ok(Self {
            store,
            stack: ValueStack::new(),
            call_stack: Vec::new(),
            imports: Imports::default(),
            wasi: None,
        })
    }

    /// Like [`Runtime::instantiate`], with a WASI handler bound.
    pub fn instantiate_with_wasi(
        bytes: impl AsRef<[u8]>,
        wasi: WasiSnapshotPreview1,
    ) -> Result<Self, InstantiationError> {
        let mut runtime = Self::instantiate(bytes)?;
        runtime.wasi = Some(wasi);
        Ok(runtime)
    }

    /// Register or replace a host function under `(module, field)`.
    pub fn add_import<F>(&mut self, module: &str, field: &str, f: F)
    where
        F: Fn(&mut Store, &[Value]) -> Result<Option<Value>, Trap> + Send + Sync + 'static,
    {
        self.imports.register(module, field, f);
    }

    /// Invoke the named export with `args`. On failure the operand and
    /// call stacks are cleared so the runtime can be reused.
    pub fn call(&mut self, name: &str, args: Vec<Value>) -> Result<Option<Value>, Trap> {
        let export = self
            .store
            .module
            .exports
            .get(name)
            .ok_or_else(|| Trap::NotFoundExportFunction(name.to_string()))?;
        let ExportDesc::Func(idx) = export.desc;
        let func = self
            .store
            .funcs
            .get(idx as usize)
            .cloned()
            .ok_or(Trap::UndefinedFunction(idx))?;

        debug!(name, func = idx, "calling export");
        for arg in args {
            self.stack.push(arg);
        }
        let result = match func {
            FuncInst::Internal(f) => self.invoke_internal(f),
            FuncInst::External(f) => self.invoke_external(f),
        };
        if result.is_err() {
            self.stack.clear();
            self.call_stack.clear();
        }
        result
    }

    fn invoke_internal(&mut self, func: InternalFuncInst) -> Result<Option<Value>, Trap> {
        let arity = func.func_type.results.len();
        self.push_frame(&func)?;
        self.execute()?;
        if arity > 0 {
            Ok(Some(self.stack.pop()?))
        } else {
            Ok(None)
        }
    }

    /// Pop arguments and dispatch an imported function: the WASI handler
    /// when one is bound and the import targets it, otherwise the
    /// registered host import.
    fn invoke_external(&mut self, func: ExternalFuncInst) -> Result<Option<Value>, Trap> {
        let args = self.stack.pop_n(func.func_type.params.len())?;
        trace!(module = %func.module, field = %func.field, "host call");
        if func.module == wasi::MODULE_NAME {
            if let Some(handler) = &self.wasi {
                return handler.invoke(&mut self.store, &func.field, &args);
            }
        }
        let host = self.imports.resolve(&func.module, &func.field)?;
        host(&mut self.store, &args)
    }

    /// Turn the top of the operand stack into a callee frame: arguments
    /// become the leading locals, declared locals are zero-initialized.
    fn push_frame(&mut self, func: &InternalFuncInst) -> Result<(), Trap> {
        let mut locals = self.stack.pop_n(func.func_type.params.len())?;
        locals.extend(func.code.locals.iter().map(|&ty| Value::zero(ty)));
        self.call_stack.push(Frame {
            pc: -1,
            sp: self.stack.len(),
            insts: func.code.body.clone(),
            arity: func.func_type.results.len(),
            labels: Vec::new(),
            locals,
        });
        Ok(())
    }

    fn execute(&mut self) -> Result<(), Trap> {
        loop {
            let Some(frame) = self.call_stack.last_mut() else {
                break;
            };
            frame.pc += 1;
            let Some(inst) = frame.insts.get(frame.pc as usize).copied() else {
                break;
            };
            match inst {
                Instruction::LocalGet(idx) => {
                    let value = frame
                        .locals
                        .get(idx as usize)
                        .copied()
                        .ok_or(Trap::UndefinedLocal(idx))?;
                    self.stack.push(value);
                }
                Instruction::LocalSet(idx) => {
                    let value = self.stack.pop()?;
                    let slot = frame
                        .locals
                        .get_mut(idx as usize)
                        .ok_or(Trap::UndefinedLocal(idx))?;
                    *slot = value;
                }
                Instruction::I32Const(v) => self.stack.push(Value::I32(v)),
                Instruction::I32Add => {
                    let (left, right) = pop_i32_pair(&mut self.stack)?;
                    self.stack.push(Value::I32(left.wrapping_add(right)));
                }
                Instruction::I32Sub => {
                    let (left, right) = pop_i32_pair(&mut self.stack)?;
                    self.stack.push(Value::I32(left.wrapping_sub(right)));
                }
                Instruction::I32LtS => {
                    let (left, right) = pop_i32_pair(&mut self.stack)?;
                    self.stack.push(Value::I32((left < right) as i32));
                }
                Instruction::I32Store { offset, .. } => {
                    let value = pop_i32(&mut self.stack)?;
                    let addr = pop_i32(&mut self.stack)?;
                    let at = (addr as u32)
                        .checked_add(offset)
                        .ok_or(Trap::OutOfBoundsMemoryAccess)?;
                    let memory = self
                        .store
                        .memories
                        .get_mut(0)
                        .ok_or(Trap::NotFoundMemory)?;
                    memory.store_i32(at, value)?;
                }
                Instruction::If(block) => {
                    let cond = pop_i32(&mut self.stack)?;
                    // A false condition skips to the matching End; the
                    // label records whichever pc we continue from.
                    if cond == 0 {
                        frame.pc = find_matching_end(&frame.insts, frame.pc as usize)? as isize;
                    }
                    frame.labels.push(Label {
                        kind: LabelKind::If,
                        pc: frame.pc as usize,
                        sp: self.stack.len(),
                        arity: block.result_count(),
                    });
                }
                Instruction::Return => match frame.labels.pop() {
                    Some(label) => {
                        frame.pc = label.pc as isize;
                        self.stack.unwind(label.sp, label.arity)?;
                    }
                    None => {
                        let frame = self.call_stack.pop().ok_or(Trap::CallStackUnderflow)?;
                        self.stack.unwind(frame.sp, frame.arity)?;
                    }
                },
                Instruction::End => {
                    let frame = self.call_stack.pop().ok_or(Trap::CallStackUnderflow)?;
                    self.stack.unwind(frame.sp, frame.arity)?;
                }
                Instruction::Call(idx) => {
                    let func = self
                        .store
                        .funcs
                        .get(idx as usize)
                        .cloned()
                        .ok_or(Trap::UndefinedFunction(idx))?;
                    match func {
                        FuncInst::Internal(f) => self.push_frame(&f)?,
                        FuncInst::External(f) => {
                            if let Some(value) = self.invoke_external(f)? {
                                self.stack.push(value);
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn pop_i32(stack: &mut ValueStack) -> Result<i32, Trap> {
    match stack.pop()? {
        Value::I32(v) => Ok(v),
        _ => Err(Trap::TypeMismatch { expected: "i32" }),
    }
}

fn pop_i32_pair(stack: &mut ValueStack) -> Result<(i32, i32), Trap> {
    let right = pop_i32(stack)?;
    let left = pop_i32(stack)?;
    Ok((left, right))
}

/// Scan forward from `pc` for the End matching the If at `pc`, counting
/// nested If/End pairs.
fn find_matching_end(insts: &[Instruction], pc: usize) -> Result<usize, Trap> {
    let mut depth = 0u32;
    let mut pos = pc;
    loop {
        pos += 1;
        match insts.get(pos).ok_or(Trap::UnmatchedEnd)? {
            Instruction::If(_) => depth += 1,
            Instruction::End => {
                if depth == 0 {
                    return Ok(pos);
                }
                depth -= 1;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BlockType;

    fn runtime_of(wat: &str) -> Runtime {
        Runtime::instantiate(wat::parse_str(wat).unwrap()).unwrap()
    }

    #[test]
    fn matching_end_skips_nested_blocks() {
        use Instruction::*;
        let insts = [
            If(BlockType::Empty), // 0
            I32Const(1),          // 1
            If(BlockType::Empty), // 2
            End,                  // 3
            End,                  // 4
            End,                  // 5 (function end)
        ];
        assert_eq!(find_matching_end(&insts, 0).unwrap(), 4);
        assert_eq!(find_matching_end(&insts, 2).unwrap(), 3);
        assert!(find_matching_end(&insts, 5).is_err());
    }

    #[test]
    fn add_executes() {
        let mut rt = runtime_of(
            r#"(module
                 (func (export "add") (param i32 i32) (result i32)
                   (i32.add (local.get 0) (local.get 1))))"#,
        );
        let got = rt.call("add", vec![Value::I32(2), Value::I32(3)]).unwrap();
        assert_eq!(got, Some(Value::I32(5)));
        assert!(rt.stack.is_empty());
        assert!(rt.call_stack.is_empty());
    }

    #[test]
    fn unknown_export_is_reported() {
        let mut rt = runtime_of("(module)");
        let err = rt.call("nope", vec![]).unwrap_err();
        assert_eq!(err.to_string(), "not found export function: nope");
    }

    #[test]
    fn i64_operand_to_i32_add_is_a_type_mismatch() {
        let mut rt = runtime_of(
            r#"(module
                 (func (export "addi") (param i64 i64) (result i32)
                   (local.get 0)
                   (local.get 1)
                   i32.add))"#,
        );
        let err = rt
            .call("addi", vec![Value::I64(1), Value::I64(2)])
            .unwrap_err();
        assert!(err.to_string().starts_with("type mismatch"));
        // Aborted invocations leave the runtime clean.
        assert!(rt.stack.is_empty());
        assert!(rt.call_stack.is_empty());
    }

    #[test]
    fn wrapping_arithmetic() {
        let mut rt = runtime_of(
            r#"(module
                 (func (export "add") (param i32 i32) (result i32)
                   (i32.add (local.get 0) (local.get 1))))"#,
        );
        let got = rt
            .call("add", vec![Value::I32(i32::MAX), Value::I32(1)])
            .unwrap();
        assert_eq!(got, Some(Value::I32(i32::MIN)));
    }
}
