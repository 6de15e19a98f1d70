//! Diagnostic reporting, rewritten against a sink instead of the teacher's
//! `Result<(), InterpretError>` handlers.

use crate::scanner::TokenType;

use super::Parser;

impl<'a> Parser<'a> {
  pub fn error_at_current(&mut self, message: &str) {
    let tok = self.current;
    self.error_at(tok.token_type, tok.line, tok.column, tok.lexeme, message);
  }

  pub fn error(&mut self, message: &str) {
    let tok = self.previous;
    self.error_at(tok.token_type, tok.line, tok.column, tok.lexeme, message);
  }

  fn error_at(&mut self, token_type: TokenType, line: u32, column: u32, lexeme: &str, message: &str) {
    let at = match token_type {
      TokenType::Eof => Some(String::new()),
      TokenType::Error => None,
      _ => Some(lexeme.to_string()),
    };
    self.diagnostics.report(line, column, at, message);
  }
}
