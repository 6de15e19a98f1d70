//! Bytecode disassembler.
//!
//! Mirrors the teacher's `Debug` trait shape, but `line_number` actually
//! reads from `Chunk::lines`/`Chunk::cols` instead of the teacher's stub
//! (which always returned 0 because the teacher's `Chunk` had no line
//! vector at all).

use crate::chunk::{Chunk, OpCode};

pub fn disassemble_chunk(chunk: &Chunk, name: &str) {
  log::debug!("== {name} ==");
  let mut offset = 0;
  while offset < chunk.code.len() {
    offset = disassemble_instruction(chunk, offset);
  }
}

pub fn disassemble_instruction(chunk: &Chunk, offset: usize) -> usize {
  let line = chunk.lines[offset];
  let col = chunk.cols[offset];
  let prefix = if offset > 0 && chunk.lines[offset - 1] == line {
    "   |".to_string()
  } else {
    format!("{line:4}:{col}")
  };

  let op = OpCode::from(chunk.code[offset]);
  match op {
    OpCode::Const | OpCode::Clo => constant_instruction(&op, chunk, offset, &prefix),
    OpCode::Null
    | OpCode::True
    | OpCode::False
    | OpCode::SelfRef
    | OpCode::Pop
    | OpCode::Clu
    | OpCode::Eq
    | OpCode::Lt
    | OpCode::Le
    | OpCode::Not
    | OpCode::Neg
    | OpCode::Add
    | OpCode::Sub
    | OpCode::Mul
    | OpCode::Div
    | OpCode::Ret => simple_instruction(&op, offset, &prefix),
    OpCode::Def | OpCode::Gld | OpCode::Gst => byte_instruction(&op, chunk, offset, &prefix),
    OpCode::Ld | OpCode::St | OpCode::Uld | OpCode::Ust | OpCode::Call | OpCode::Puts => {
      byte_instruction(&op, chunk, offset, &prefix)
    }
    OpCode::Jmp | OpCode::Jmpf | OpCode::Loop => jump_instruction(&op, chunk, offset, &prefix),
  }
}

fn simple_instruction(op: &OpCode, offset: usize, prefix: &str) -> usize {
  log::debug!("{prefix} {offset:04} {op:?}");
  offset + 1
}

fn byte_instruction(op: &OpCode, chunk: &Chunk, offset: usize, prefix: &str) -> usize {
  let slot = chunk.code[offset + 1];
  log::debug!("{prefix} {offset:04} {op:?} {slot}");
  offset + 2
}

fn constant_instruction(op: &OpCode, chunk: &Chunk, offset: usize, prefix: &str) -> usize {
  let idx = chunk.code[offset + 1] as usize;
  let value = chunk.constants.get(idx);
  log::debug!("{prefix} {offset:04} {op:?} {idx} '{value:?}'");
  let mut next = offset + 2;
  if matches!(op, OpCode::Clo) {
    if let Some(crate::value::Value::Obj(crate::object::Obj::Function(func))) = value {
      for _ in 0..func.upvalue_count {
        let is_local = chunk.code[next];
        let index = chunk.code[next + 1];
        log::debug!(
          "{:04}      | {} {}",
          next,
          if is_local == 1 { "local" } else { "upvalue" },
          index
        );
        next += 2;
      }
    }
  }
  next
}

fn jump_instruction(op: &OpCode, chunk: &Chunk, offset: usize, prefix: &str) -> usize {
  let hi = chunk.code[offset + 1] as u16;
  let lo = chunk.code[offset + 2] as u16;
  let jump = (hi << 8) | lo;
  log::debug!("{prefix} {offset:04} {op:?} -> {}", offset + 3 + jump as usize);
  offset + 3
}
