//! Statement grammar: `puts`, `if`/`else`, `while`, `return`, bare
//! expression statements, and panic-mode synchronization.

use crate::chunk::OpCode;
use crate::common::MAX_ARGS;
use crate::compiler::FunctionType;
use crate::scanner::TokenType;

use super::Parser;

impl<'a> Parser<'a> {
  pub fn expression_statement(&mut self) {
    self.expression();
    let line = self.previous.line;
    let col = self.previous.column;
    self.consume(TokenType::Semicolon, "Expect ';' after expression.");
    self.emit_op(OpCode::Pop, line, col);
  }

  /// `puts expr (',' expr)* ';'`
  pub fn puts_statement(&mut self) {
    let line = self.previous.line;
    let col = self.previous.column;
    let mut count: usize = 0;
    loop {
      self.expression();
      count += 1;
      if count > MAX_ARGS {
        self.error("Can't puts more than 255 values.");
      }
      if !self.match_token(TokenType::Comma) {
        break;
      }
    }
    self.consume(TokenType::Semicolon, "Expect ';' after value.");
    self.emit_op_byte(OpCode::Puts, count as u8, line, col);
    for _ in 0..count {
      self.emit_op(OpCode::Pop, line, col);
    }
  }

  pub fn if_statement(&mut self) {
    let line = self.previous.line;
    let col = self.previous.column;
    self.consume(TokenType::LeftParen, "Expect '(' after 'if'.");
    self.expression();
    self.consume(TokenType::RightParen, "Expect ')' after condition.");

    let then_jump = self.emit_jump(OpCode::Jmpf, line, col);
    self.emit_op(OpCode::Pop, line, col);
    self.statement();

    let else_jump = self.emit_jump(OpCode::Jmp, line, col);
    self.patch_jump(then_jump);
    self.emit_op(OpCode::Pop, line, col);

    if self.match_token(TokenType::Else) {
      self.statement();
    }
    self.patch_jump(else_jump);
  }

  pub fn while_statement(&mut self) {
    let line = self.previous.line;
    let col = self.previous.column;
    let loop_start = self.compiler.current().function.chunk.count();

    self.consume(TokenType::LeftParen, "Expect '(' after 'while'.");
    self.expression();
    self.consume(TokenType::RightParen, "Expect ')' after condition.");

    let exit_jump = self.emit_jump(OpCode::Jmpf, line, col);
    self.emit_op(OpCode::Pop, line, col);
    self.statement();
    self.emit_loop(loop_start, line, col);

    self.patch_jump(exit_jump);
    self.emit_op(OpCode::Pop, line, col);
  }

  pub fn return_statement(&mut self) {
    let line = self.previous.line;
    let col = self.previous.column;
    if self.compiler.current().function_type == FunctionType::Script {
      self.error("Can't return from top-level code.");
    }

    if self.match_token(TokenType::Semicolon) {
      self.emit_return(line, col);
    } else {
      self.expression();
      self.consume(TokenType::Semicolon, "Expect ';' after return value.");
      self.emit_op(OpCode::Ret, line, col);
    }
  }

  pub fn synchronize(&mut self) {
    self.diagnostics.panic_mode = false;

    while self.current.token_type != TokenType::Eof {
      if self.previous.token_type == TokenType::Semicolon {
        return;
      }
      match self.current.token_type {
        TokenType::Class
        | TokenType::Fun
        | TokenType::Var
        | TokenType::Global
        | TokenType::For
        | TokenType::If
        | TokenType::While
        | TokenType::Puts
        | TokenType::Return => return,
        _ => {}
      }
      self.advance();
    }
  }
}
