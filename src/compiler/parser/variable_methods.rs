//! Variable declaration and name resolution: locals, globals, and upvalues.
//!
//! Fixes two defects observed in the teacher's `variable_methods.rs`:
//! `mark_initialized` there sets `is_captured = true` on the newest local
//! instead of setting its `depth` (conflating "initialized" with
//! "captured"); and `resolve_local` in the original C keeps scanning and
//! *still returns the slot* after reporting the own-initializer error,
//! which this module replicates exactly.

use crate::chunk::OpCode;
use crate::compiler::{FunctionType, Local, UpvalueDescriptor};
use crate::scanner::{Token, TokenType};

use super::Parser;

impl<'a> Parser<'a> {
  /// Declares the identifier just consumed: as a local if the current
  /// scope is non-global, otherwise returns a constant-pool index for its
  /// name. Returns `None` when the variable was declared as a local (no
  /// constant slot needed).
  pub fn parse_variable(&mut self, message: &str) -> Option<u8> {
    self.consume(TokenType::Identifier, message);
    let name = self.previous;

    if self.compiler.current().scope_depth > 0 {
      self.declare_variable(name);
      return None;
    }

    Some(self.identifier_constant(name))
  }

  pub fn identifier_constant(&mut self, name: Token<'a>) -> u8 {
    let interned = self.interner.intern(name.lexeme);
    self.make_constant(crate::value::Value::Obj(crate::object::Obj::StringLit(interned)))
  }

  fn identifiers_equal(a: &str, b: &str) -> bool {
    a == b
  }

  pub fn declare_variable(&mut self, name: Token<'a>) {
    if self.compiler.current().scope_depth == 0 {
      return;
    }

    let current_depth = self.compiler.current().scope_depth;
    let mut duplicate = false;
    for local in self.compiler.current().locals.iter().rev() {
      if local.depth != -1 && local.depth < current_depth {
        break;
      }
      if Self::identifiers_equal(local.name.as_ref(), name.lexeme) {
        duplicate = true;
        break;
      }
    }
    if duplicate {
      self.error("Already a variable with this name in this scope.");
      return;
    }

    self.add_local(name);
  }

  pub fn add_local(&mut self, name: Token<'a>) {
    if self.compiler.locals_at_capacity() {
      self.error("Too many local variables in function.");
      return;
    }
    self.compiler.current_mut().locals.push(Local {
      name: std::rc::Rc::from(name.lexeme),
      depth: -1,
      is_captured: false,
    });
  }

  /// Sets the topmost local's depth to the current scope depth, marking it
  /// initialized and readable.
  pub fn mark_initialized(&mut self) {
    let depth = self.compiler.current().scope_depth;
    if depth == 0 {
      return;
    }
    if let Some(local) = self.compiler.current_mut().locals.last_mut() {
      local.depth = depth;
    }
  }

  pub fn define_variable(&mut self, global: Option<u8>, line: u32, col: u32) {
    match global {
      None => self.mark_initialized(),
      Some(idx) => self.emit_op_byte(OpCode::Def, idx, line, col),
    }
  }

  /// Resolves `name` against the locals of `frame_index`. A match whose
  /// depth is still `-1` (own initializer) is reported but its slot is
  /// still returned, matching the original C's `resolveLocal`.
  pub fn resolve_local(&mut self, frame_index: usize, name: &str) -> Option<u8> {
    let locals = &self.compiler.frames[frame_index].locals;
    for (i, local) in locals.iter().enumerate().rev() {
      if Self::identifiers_equal(local.name.as_ref(), name) {
        if local.depth == -1 {
          self.error("Can't read local variable in its own initializer.");
        }
        return Some(i as u8);
      }
    }
    None
  }

  /// Recursively resolves `name` as an upvalue starting from the frame
  /// enclosing `frame_index`. Returns `None` if no enclosing frame binds
  /// `name` as a local or upvalue (i.e. it must be a global).
  pub fn resolve_upvalue(&mut self, frame_index: usize, name: &str) -> Option<u8> {
    if frame_index == 0 {
      return None;
    }
    let enclosing = frame_index - 1;

    if let Some(local_index) = self.resolve_local(enclosing, name) {
      self.compiler.frames[enclosing].locals[local_index as usize].is_captured = true;
      return Some(self.add_upvalue(frame_index, local_index, true));
    }

    if let Some(upvalue_index) = self.resolve_upvalue(enclosing, name) {
      return Some(self.add_upvalue(frame_index, upvalue_index, false));
    }

    None
  }

  /// Adds an upvalue descriptor to `frame_index`, deduplicating by
  /// `(index, is_local)`.
  pub fn add_upvalue(&mut self, frame_index: usize, index: u8, is_local: bool) -> u8 {
    let upvalue_count = self.compiler.frames[frame_index].upvalues.len();
    for (i, up) in self.compiler.frames[frame_index].upvalues.iter().enumerate() {
      if up.index == index && up.is_local == is_local {
        return i as u8;
      }
    }

    if self.compiler.upvalues_at_capacity(frame_index) {
      self.error("Too many closure variables in function.");
      return 0;
    }

    self.compiler.frames[frame_index]
      .upvalues
      .push(UpvalueDescriptor { index, is_local });
    self.compiler.frames[frame_index].function.upvalue_count = (upvalue_count + 1) as u8;
    upvalue_count as u8
  }

  /// Reads or assigns `name` in expression position, choosing local /
  /// upvalue / global resolution in that order.
  pub fn named_variable(&mut self, name: Token<'a>, can_assign: bool) {
    let frame_index = self.compiler.depth() - 1;
    let line = name.line;
    let col = name.column;

    let (get_op, set_op, arg) = if let Some(slot) = self.resolve_local(frame_index, name.lexeme) {
      (OpCode::Ld, OpCode::St, slot)
    } else if let Some(slot) = self.resolve_upvalue(frame_index, name.lexeme) {
      (OpCode::Uld, OpCode::Ust, slot)
    } else {
      let idx = self.identifier_constant(name);
      (OpCode::Gld, OpCode::Gst, idx)
    };

    if can_assign && self.match_token(TokenType::Equal) {
      self.expression();
      self.emit_op_byte(set_op, arg, line, col);
    } else {
      self.emit_op_byte(get_op, arg, line, col);
    }
  }

  /// `var name [= initializer];`
  pub fn var_declaration(&mut self) {
    let line = self.previous.line;
    let col = self.previous.column;
    let global = self.parse_variable("Expect variable name.");

    if self.match_token(TokenType::Equal) {
      self.expression();
    } else {
      self.emit_op(OpCode::Null, line, col);
    }
    self.consume(TokenType::Semicolon, "Expect ';' after variable declaration.");
    self.define_variable(global, line, col);
  }

  /// `global name [= expr] (',' name [= expr])* ';'`
  ///
  /// Always interns and `DEF`s each name regardless of scope depth,
  /// bypassing local declaration entirely.
  pub fn global_declaration(&mut self) {
    loop {
      let line = self.current.line;
      let col = self.current.column;
      self.consume(TokenType::Identifier, "Expect variable name.");
      let idx = self.identifier_constant(self.previous);

      if self.match_token(TokenType::Equal) {
        self.expression();
      } else {
        self.emit_op(OpCode::Null, line, col);
      }
      self.emit_op_byte(OpCode::Def, idx, line, col);

      if !self.match_token(TokenType::Comma) {
        break;
      }
    }
    self.consume(TokenType::Semicolon, "Expect ';' after global declaration.");
  }

  /// `fun name(params) { body }`
  pub fn fun_declaration(&mut self) {
    let global = self.parse_variable("Expect function name.");
    self.mark_initialized();
    self.compile_function(FunctionType::Function);
    let line = self.previous.line;
    let col = self.previous.column;
    self.define_variable(global, line, col);
  }
}
