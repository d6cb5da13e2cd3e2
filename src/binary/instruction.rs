//! Opcode constants and the single-instruction decoder.

use super::{cursor::Cursor, leb128, BinaryReadError, Result};
use crate::model::{BlockType, Instruction, ValueType};

/// Opcodes of the supported subset.
pub mod op {
    pub const IF: u8 = 0x04;
    pub const END: u8 = 0x0B;
    pub const RETURN: u8 = 0x0F;
    pub const CALL: u8 = 0x10;

    pub const LOCAL_GET: u8 = 0x20;
    pub const LOCAL_SET: u8 = 0x21;

    pub const I32_STORE: u8 = 0x36;

    pub const I32_CONST: u8 = 0x41;

    pub const I32_LT_S: u8 = 0x48;
    pub const I32_ADD: u8 = 0x6A;
    pub const I32_SUB: u8 = 0x6B;
}

fn read_block_type(cur: &mut Cursor) -> Result<BlockType> {
    let b = cur.read_u8()?;
    match b {
        0x40 => Ok(BlockType::Empty),
        0x7F => Ok(BlockType::Value(ValueType::I32)),
        0x7E => Ok(BlockType::Value(ValueType::I64)),
        _ => Err(BinaryReadError::Malformed {
            offset: cur.offset(),
            msg: "invalid block type",
        }),
    }
}

/// Decode one instruction: opcode byte plus its immediates.
pub fn read_instruction(cur: &mut Cursor) -> Result<Instruction> {
    let opcode_offset = cur.offset();
    let opcode = cur.read_u8()?;
    match opcode {
        op::IF => Ok(Instruction::If(read_block_type(cur)?)),
        op::END => Ok(Instruction::End),
        op::RETURN => Ok(Instruction::Return),
        op::CALL => Ok(Instruction::Call(leb128::read_u32(cur)?)),
        op::LOCAL_GET => Ok(Instruction::LocalGet(leb128::read_u32(cur)?)),
        op::LOCAL_SET => Ok(Instruction::LocalSet(leb128::read_u32(cur)?)),
        op::I32_STORE => {
            let align = leb128::read_u32(cur)?;
            let offset = leb128::read_u32(cur)?;
            Ok(Instruction::I32Store { align, offset })
        }
        op::I32_CONST => Ok(Instruction::I32Const(leb128::read_i32(cur)?)),
        op::I32_LT_S => Ok(Instruction::I32LtS),
        op::I32_ADD => Ok(Instruction::I32Add),
        op::I32_SUB => Ok(Instruction::I32Sub),
        _ => Err(BinaryReadError::InvalidOpcode {
            opcode,
            offset: opcode_offset,
        }),
    }
}
