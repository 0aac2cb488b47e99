use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use super::{Value, VmErrorKind};

// ── Instruction layout (32 bits, big-endian byte order) ─────────────
//
// ABC mode:  [OP:8 | A:8 | B:8 | C:8]
// AsBx mode: [OP:8 | A:8 | sBx:16]   LoadInt only

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum OpCode {
    GetGlobal = 0,
    LoadConst = 1,
    Call = 2,
    LoadNil = 3,
    LoadBool = 4,
    LoadInt = 5,
    Move = 6,
}

impl TryFrom<u8> for OpCode {
    type Error = VmErrorKind;

    fn try_from(op: u8) -> Result<Self, VmErrorKind> {
        Ok(match op {
            0 => OpCode::GetGlobal,
            1 => OpCode::LoadConst,
            2 => OpCode::Call,
            3 => OpCode::LoadNil,
            4 => OpCode::LoadBool,
            5 => OpCode::LoadInt,
            6 => OpCode::Move,
            _ => return Err(VmErrorKind::UnknownOpcode { op }),
        })
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One packed instruction: an opcode byte followed by three operand bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ByteCode(u32);

#[inline(always)]
fn encode_abc(op: OpCode, a: u8, b: u8, c: u8) -> ByteCode {
    ByteCode((op as u32) << 24 | (a as u32) << 16 | (b as u32) << 8 | c as u32)
}

#[inline(always)]
fn encode_asbx(op: OpCode, a: u8, sbx: i16) -> ByteCode {
    ByteCode((op as u32) << 24 | (a as u32) << 16 | sbx as u16 as u32)
}

impl ByteCode {
    pub fn get_global(dst: u8, name_index: u8) -> Self {
        encode_abc(OpCode::GetGlobal, dst, name_index, 0)
    }

    pub fn load_const(dst: u8, const_index: u8) -> Self {
        encode_abc(OpCode::LoadConst, dst, const_index, 0)
    }

    pub fn call(func_slot: u8, argc: u8) -> Self {
        encode_abc(OpCode::Call, func_slot, argc, 0)
    }

    pub fn load_nil(dst: u8) -> Self {
        encode_abc(OpCode::LoadNil, dst, 0, 0)
    }

    pub fn load_bool(dst: u8, value: bool) -> Self {
        encode_abc(OpCode::LoadBool, dst, value as u8, 0)
    }

    pub fn load_int(dst: u8, value: i16) -> Self {
        encode_asbx(OpCode::LoadInt, dst, value)
    }

    pub fn mov(dst: u8, src: u8) -> Self {
        encode_abc(OpCode::Move, dst, src, 0)
    }

    /// Raw wire form; the opcode byte is not validated until decoded.
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        ByteCode(u32::from_be_bytes(bytes))
    }

    pub fn to_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    pub fn op_byte(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub fn opcode(self) -> Result<OpCode, VmErrorKind> {
        OpCode::try_from(self.op_byte())
    }

    pub fn a(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub fn b(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn c(self) -> u8 {
        self.0 as u8
    }

    /// Operand bytes B and C read as one big-endian `i16`.
    pub fn sbx(self) -> i16 {
        (self.0 & 0xFFFF) as u16 as i16
    }
}

impl fmt::Display for ByteCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (a, b) = (self.a(), self.b());
        match self.opcode() {
            Ok(OpCode::GetGlobal) => write!(f, "GetGlobal R{a} K{b}"),
            Ok(OpCode::LoadConst) => write!(f, "LoadConst R{a} K{b}"),
            Ok(OpCode::Call) => write!(f, "Call R{a} {b}"),
            Ok(OpCode::LoadNil) => write!(f, "LoadNil R{a}"),
            Ok(OpCode::LoadBool) => match b {
                0 => write!(f, "LoadBool R{a} false"),
                1 => write!(f, "LoadBool R{a} true"),
                other => write!(f, "LoadBool R{a} {other}"),
            },
            Ok(OpCode::LoadInt) => write!(f, "LoadInt R{a} {}", self.sbx()),
            Ok(OpCode::Move) => write!(f, "Move R{a} R{b}"),
            Err(_) => write!(f, "Unknown(0x{:02x}) {a} {b} {}", self.op_byte(), self.c()),
        }
    }
}

impl fmt::Debug for ByteCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteCode({})", self)
    }
}

impl Serialize for ByteCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ByteCode", 4)?;
        match self.opcode() {
            Ok(op) => s.serialize_field("op", &op)?,
            Err(_) => s.serialize_field("op", &self.op_byte())?,
        }
        s.serialize_field("a", &self.a())?;
        s.serialize_field("b", &self.b())?;
        s.serialize_field("c", &self.c())?;
        s.end()
    }
}

/// Output of one compile pass: the constant pool and the instructions that
/// index into it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Chunk {
    pub constants: Vec<Value>,
    pub code: Vec<ByteCode>,
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "constants ({}):", self.constants.len())?;
        for (i, value) in self.constants.iter().enumerate() {
            match value {
                Value::String(s) => writeln!(f, "  K{:<3} {:<8} {:?}", i, value.type_name(), s)?,
                other => writeln!(f, "  K{:<3} {:<8} {}", i, other.type_name(), other)?,
            }
        }
        writeln!(f, "code ({}):", self.code.len())?;
        for (pc, inst) in self.code.iter().enumerate() {
            writeln!(f, "  {:04}  {}", pc, inst)?;
        }
        Ok(())
    }
}
