//! Function literal compilation: enters a fresh compiler frame, parses the
//! parameter list and body, then emits either a bare `CONST` (no captured
//! variables) or a `CLO` followed by its upvalue descriptor pairs.

use std::rc::Rc;

use crate::chunk::OpCode;
use crate::common::MAX_PARAMS;
use crate::compiler::FunctionType;
use crate::object::{Obj, ObjFunction};
use crate::scanner::TokenType;
use crate::value::Value;

use super::Parser;

impl<'a> Parser<'a> {
  pub fn compile_function(&mut self, function_type: FunctionType) {
    let name: Rc<str> = Rc::from(self.previous.lexeme);
    self.compiler.push_frame(function_type, Some(name));
    self.begin_scope();

    self.consume(TokenType::LeftParen, "Expect '(' after function name.");
    if !self.check(TokenType::RightParen) {
      loop {
        if (self.compiler.current().function.arity as usize) >= MAX_PARAMS {
          self.error_at_current("Can't have more than 255 parameters.");
        } else {
          self.compiler.current_mut().function.arity += 1;
        }
        let param = self.parse_variable("Expect parameter name.");
        let line = self.previous.line;
        let col = self.previous.column;
        self.define_variable(param, line, col);
        if !self.match_token(TokenType::Comma) {
          break;
        }
      }
    }
    self.consume(TokenType::RightParen, "Expect ')' after parameters.");
    self.consume(TokenType::LeftBrace, "Expect '{' before function body.");
    self.block();

    let line = self.previous.line;
    let col = self.previous.column;
    self.emit_return(line, col);

    #[cfg(feature = "debug_print_code")]
    if !self.diagnostics.had_error {
      crate::debug::disassemble_chunk(
        &self.compiler.current().function.chunk,
        self
          .compiler
          .current()
          .function
          .name
          .as_deref()
          .unwrap_or("<fn>"),
      );
    }

    let frame = self.compiler.pop_frame();
    let upvalues = frame.upvalues.clone();
    let const_idx = self.make_constant(Value::Obj(Obj::Function(Rc::new(frame.function))));

    if upvalues.is_empty() {
      self.emit_op_byte(OpCode::Const, const_idx, line, col);
    } else {
      self.emit_op_byte(OpCode::Clo, const_idx, line, col);
      for up in &upvalues {
        self.emit_bytes(up.is_local as u8, up.index, line, col);
      }
    }
  }
}
