//! Bytecode container: a growable code buffer, parallel per-byte source
//! positions, and a bounded constant pool.

use enum_repr::EnumFromU8;

use crate::common::MAX_CONSTANTS;
use crate::utils::Init;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumFromU8)]
#[repr(u8)]
pub enum OpCode {
  Const,
  Null,
  True,
  False,
  SelfRef,
  Pop,
  Clu,
  Def,
  Gld,
  Gst,
  Ld,
  St,
  Uld,
  Ust,
  Eq,
  Lt,
  Le,
  Not,
  Neg,
  Add,
  Sub,
  Mul,
  Div,
  Jmp,
  Jmpf,
  Loop,
  Call,
  Ret,
  Clo,
  Puts,
}

#[derive(Debug, Default)]
pub struct Chunk {
  pub code: Vec<u8>,
  pub lines: Vec<u32>,
  pub cols: Vec<u32>,
  pub constants: Vec<Value>,
}

impl Init for Chunk {
  fn init() -> Self {
    Chunk::default()
  }
}

impl Chunk {
  pub fn write(&mut self, byte: u8, line: u32, col: u32) {
    self.code.push(byte);
    self.lines.push(line);
    self.cols.push(col);
  }

  pub fn write_op(&mut self, op: OpCode, line: u32, col: u32) {
    self.write(op as u8, line, col);
  }

  /// Adds a value to the constant pool, returning its index.
  ///
  /// Returns `None` if the pool is already at capacity (256 entries,
  /// addressable by a single byte).
  pub fn add_constant(&mut self, value: Value) -> Option<u8> {
    if self.constants.len() >= MAX_CONSTANTS {
      return None;
    }
    self.constants.push(value);
    Some((self.constants.len() - 1) as u8)
  }

  pub fn count(&self) -> usize {
    self.code.len()
  }
}
