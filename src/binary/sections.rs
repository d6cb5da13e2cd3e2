//! Section ids, payload decoders, and the top-level module decoder.
//! Each section payload is bounded by its own cursor so a decoder that
//! under- or over-reads is caught instead of corrupting the stream.

use tracing::debug;

use super::{
    cursor::Cursor,
    instruction::read_instruction,
    leb128,
    reader::{read_len_prefixed_bytes, read_name, read_vec},
    BinaryReadError, Result,
};
use crate::model::{
    DataSegment, Export, ExportDesc, Func, FuncType, Import, ImportDesc, Instruction, Limits,
    Memory, Module, TypeIdx, ValueType,
};

const MAGIC: u32 = 0x6D73_6100; // "\0asm" little-endian
const VERSION: u32 = 0x0000_0001;

/// Section identifiers recognized by this subset. Table, Global, Start,
/// and Element sections are deliberately absent; their codes decode as
/// unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionId {
    Custom = 0,
    Type = 1,
    Import = 2,
    Function = 3,
    Memory = 5,
    Export = 7,
    Code = 10,
    Data = 11,
}

impl SectionId {
    pub fn from_byte(b: u8) -> Option<Self> {
        Some(match b {
            0 => SectionId::Custom,
            1 => SectionId::Type,
            2 => SectionId::Import,
            3 => SectionId::Function,
            5 => SectionId::Memory,
            7 => SectionId::Export,
            10 => SectionId::Code,
            11 => SectionId::Data,
            _ => return None,
        })
    }
}

fn read_value_type(cur: &mut Cursor) -> Result<ValueType> {
    let b = cur.read_u8()?;
    match b {
        0x7F => Ok(ValueType::I32),
        0x7E => Ok(ValueType::I64),
        _ => Err(BinaryReadError::Malformed {
            offset: cur.offset(),
            msg: "invalid value type",
        }),
    }
}

fn read_limits(cur: &mut Cursor) -> Result<Limits> {
    let flags = cur.read_u8()?;
    match flags {
        0x00 => {
            let min = leb128::read_u32(cur)?;
            Ok(Limits { min, max: None })
        }
        0x01 => {
            let min = leb128::read_u32(cur)?;
            let max = leb128::read_u32(cur)?;
            if max < min {
                return Err(BinaryReadError::Malformed {
                    offset: cur.offset(),
                    msg: "limits max < min",
                });
            }
            Ok(Limits { min, max: Some(max) })
        }
        _ => Err(BinaryReadError::Malformed {
            offset: cur.offset(),
            msg: "invalid limits flags",
        }),
    }
}

fn read_func_type(cur: &mut Cursor) -> Result<FuncType> {
    let form = cur.read_u8()?;
    if form != 0x60 {
        return Err(BinaryReadError::Malformed {
            offset: cur.offset(),
            msg: "expected functype (0x60)",
        });
    }
    let params = read_vec(cur, read_value_type)?;
    let results = read_vec(cur, read_value_type)?;
    Ok(FuncType { params, results })
}

/// Read a constant expression: instructions up to and including End.
/// Offset producers beyond i32.const are rejected at evaluation time.
fn read_const_expr(cur: &mut Cursor) -> Result<Vec<Instruction>> {
    let mut insts = Vec::new();
    loop {
        let inst = read_instruction(cur)?;
        let done = inst == Instruction::End;
        insts.push(inst);
        if done {
            return Ok(insts);
        }
    }
}

/* ---------- Section payload readers ---------- */

fn read_type_section(cur: &mut Cursor) -> Result<Vec<FuncType>> {
    read_vec(cur, read_func_type)
}

fn read_import_section(cur: &mut Cursor) -> Result<Vec<Import>> {
    read_vec(cur, |c| {
        let module = read_name(c)?;
        let field = read_name(c)?;
        let kind = c.read_u8()?;
        if kind != 0x00 {
            return Err(BinaryReadError::Malformed {
                offset: c.offset(),
                msg: "only function imports are supported",
            });
        }
        let type_idx = leb128::read_u32(c)?;
        Ok(Import {
            module,
            field,
            desc: ImportDesc::Func(type_idx),
        })
    })
}

fn read_function_section(cur: &mut Cursor) -> Result<Vec<TypeIdx>> {
    read_vec(cur, leb128::read_u32)
}

fn read_memory_section(cur: &mut Cursor) -> Result<Vec<Memory>> {
    let memories = read_vec(cur, |c| Ok(Memory { limits: read_limits(c)? }))?;
    if memories.len() > 1 {
        return Err(BinaryReadError::Malformed {
            offset: cur.offset(),
            msg: "multiple memories are not supported",
        });
    }
    Ok(memories)
}

fn read_export_section(cur: &mut Cursor) -> Result<Vec<Export>> {
    read_vec(cur, |c| {
        let name = read_name(c)?;
        let kind = c.read_u8()?;
        if kind != 0x00 {
            return Err(BinaryReadError::Malformed {
                offset: c.offset(),
                msg: "only function exports are supported",
            });
        }
        let idx = leb128::read_u32(c)?;
        Ok(Export {
            name,
            desc: ExportDesc::Func(idx),
        })
    })
}

fn read_code_section(cur: &mut Cursor) -> Result<Vec<Func>> {
    let count = leb128::read_u32(cur)? as usize;
    let mut codes = Vec::with_capacity(count);
    for _ in 0..count {
        let body_size = leb128::read_u32(cur)? as usize;
        let mut body = Cursor::new(cur.read_bytes(body_size)?);

        // Local runs: (count, type) pairs expanded to one entry per local.
        let run_count = leb128::read_u32(&mut body)? as usize;
        let mut locals = Vec::new();
        for _ in 0..run_count {
            let n = leb128::read_u32(&mut body)?;
            let ty = read_value_type(&mut body)?;
            locals.extend(std::iter::repeat(ty).take(n as usize));
        }

        // The rest of the window is the instruction stream; the body's
        // terminating End is part of it.
        let mut insts = Vec::new();
        while !body.is_eof() {
            insts.push(read_instruction(&mut body)?);
        }
        codes.push(Func { locals, body: insts });
    }
    Ok(codes)
}

fn read_data_section(cur: &mut Cursor) -> Result<Vec<DataSegment>> {
    read_vec(cur, |c| {
        let memory_index = leb128::read_u32(c)?;
        let offset_expr = read_const_expr(c)?;
        let init = read_len_prefixed_bytes(c)?;
        Ok(DataSegment {
            memory_index,
            offset_expr,
            init,
        })
    })
}

/* ---------- Top-level module decoder ---------- */

/// Decode a complete module image.
pub fn decode_module(bytes: &[u8]) -> Result<Module> {
    let mut cur = Cursor::new(bytes);

    let magic = cur.read_u32_le()?;
    if magic != MAGIC {
        return Err(BinaryReadError::Malformed {
            offset: 0,
            msg: "bad magic header",
        });
    }
    let version = cur.read_u32_le()?;
    if version != VERSION {
        return Err(BinaryReadError::Malformed {
            offset: 4,
            msg: "unsupported version",
        });
    }

    let mut module = Module::default();
    let mut seen = [false; 12];
    let mut last_id: u8 = 0;

    while !cur.is_eof() {
        let id_offset = cur.offset();
        let id_byte = cur.read_u8()?;
        let id = SectionId::from_byte(id_byte).ok_or(BinaryReadError::Malformed {
            offset: id_offset,
            msg: "unknown section id",
        })?;
        let payload_len = leb128::read_u32(&mut cur)? as usize;
        let payload_offset = cur.offset();
        let mut payload = Cursor::new(cur.read_bytes(payload_len)?);

        if id == SectionId::Custom {
            // Skipped entirely; the payload bytes were already consumed.
            continue;
        }

        // Standard sections appear at most once, in non-decreasing order.
        if (id as u8) < last_id {
            return Err(BinaryReadError::Malformed {
                offset: payload_offset,
                msg: "section out of order",
            });
        }
        last_id = id as u8;
        if seen[id as usize] {
            return Err(BinaryReadError::Malformed {
                offset: payload_offset,
                msg: "duplicate section",
            });
        }
        seen[id as usize] = true;

        match id {
            SectionId::Type => module.types = read_type_section(&mut payload)?,
            SectionId::Import => module.imports = read_import_section(&mut payload)?,
            SectionId::Function => module.functions = read_function_section(&mut payload)?,
            SectionId::Memory => module.memories = read_memory_section(&mut payload)?,
            SectionId::Export => module.exports = read_export_section(&mut payload)?,
            SectionId::Code => module.codes = read_code_section(&mut payload)?,
            SectionId::Data => module.data = read_data_section(&mut payload)?,
            SectionId::Custom => unreachable!(),
        }

        if payload.remaining() != 0 {
            return Err(BinaryReadError::Malformed {
                offset: payload_offset + payload.offset(),
                msg: "section payload not fully consumed",
            });
        }
    }

    if module.functions.len() != module.codes.len() {
        return Err(BinaryReadError::Malformed {
            offset: cur.offset(),
            msg: "function and code section length mismatch",
        });
    }

    debug!(
        types = module.types.len(),
        imports = module.imports.len(),
        funcs = module.codes.len(),
        memories = module.memories.len(),
        exports = module.exports.len(),
        data_segments = module.data.len(),
        "module decoded"
    );
    Ok(module)
}
