//! Parser driver and Pratt expression engine.
//!
//! Keeps the teacher crate's shape (a static `RULES` table built once with
//! `once_cell`, a `Parser` struct driving a `Scanner` one token ahead) but
//! replaces its `Result<(), InterpretError>` / `?`-propagation error model:
//! here every parse method returns normally and errors are written to
//! `self.diagnostics`, so `panic_mode` + `synchronize` can actually recover
//! mid-parse instead of unwinding out of `parse_precedence` on the first
//! error.

pub mod compile_time_error_handlers;
pub mod emit_methods;
pub mod function_methods;
pub mod ops_after_get_parse_rule;
pub mod statement_methods;
pub mod variable_methods;

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::chunk::OpCode;
use crate::compiler::{Compiler, Precedence};
use crate::diagnostic::Diagnostics;
use crate::object::ObjFunction;
use crate::scanner::{Scanner, Token, TokenType};
use crate::table::StringInterner;

pub type ParseFn = fn(&mut Parser<'_>, bool);

#[derive(Clone, Copy)]
pub struct ParseRule {
  pub prefix: Option<ParseFn>,
  pub infix: Option<ParseFn>,
  pub precedence: Precedence,
}

fn rule(prefix: Option<ParseFn>, infix: Option<ParseFn>, precedence: Precedence) -> ParseRule {
  ParseRule {
    prefix,
    infix,
    precedence,
  }
}

pub static RULES: Lazy<HashMap<TokenType, ParseRule>> = Lazy::new(|| {
  use ops_after_get_parse_rule::*;
  use Precedence::*;
  use TokenType::*;

  let mut m = HashMap::new();
  m.insert(LeftParen, rule(Some(grouping), Some(call), Call));
  m.insert(RightParen, rule(None, None, None));
  m.insert(LeftBrace, rule(None, None, None));
  m.insert(RightBrace, rule(None, None, None));
  m.insert(Comma, rule(None, None, None));
  m.insert(Dot, rule(None, None, None));
  m.insert(Minus, rule(Some(unary), Some(binary), Term));
  m.insert(Plus, rule(None, Some(binary), Term));
  m.insert(Semicolon, rule(None, None, None));
  m.insert(Slash, rule(None, Some(binary), Factor));
  m.insert(Star, rule(None, Some(binary), Factor));
  m.insert(Bang, rule(Some(unary), None, None));
  m.insert(BangEqual, rule(None, Some(binary), Equality));
  m.insert(Equal, rule(None, None, None));
  m.insert(EqualEqual, rule(None, Some(binary), Equality));
  m.insert(Greater, rule(None, Some(binary), Comparison));
  m.insert(GreaterEqual, rule(None, Some(binary), Comparison));
  m.insert(Less, rule(None, Some(binary), Comparison));
  m.insert(LessEqual, rule(None, Some(binary), Comparison));
  m.insert(Identifier, rule(Some(variable), None, None));
  m.insert(StringLit, rule(Some(string), None, None));
  m.insert(Number, rule(Some(number), None, None));
  m.insert(Integer, rule(Some(integer), None, None));
  m.insert(Hexadecimal, rule(Some(integer), None, None));
  m.insert(And, rule(None, Some(and_), And));
  m.insert(Class, rule(None, None, None));
  m.insert(Else, rule(None, None, None));
  m.insert(ElseIf, rule(None, None, None));
  m.insert(End, rule(None, None, None));
  m.insert(EndIf, rule(None, None, None));
  m.insert(False, rule(Some(literal), None, None));
  m.insert(For, rule(None, None, None));
  m.insert(Fun, rule(Some(literal), None, None));
  m.insert(Global, rule(None, None, None));
  m.insert(If, rule(None, None, None));
  m.insert(Local, rule(None, None, None));
  m.insert(Null, rule(Some(literal), None, None));
  m.insert(Or, rule(None, Some(or_), Or));
  m.insert(Puts, rule(None, None, None));
  m.insert(Return, rule(None, None, None));
  m.insert(Super, rule(None, None, None));
  m.insert(Then, rule(None, None, None));
  m.insert(This, rule(None, None, None));
  m.insert(True, rule(Some(literal), None, None));
  m.insert(Var, rule(None, None, None));
  m.insert(While, rule(None, None, None));
  m.insert(Error, rule(None, None, None));
  m.insert(Eof, rule(None, None, None));
  m
});

pub fn get_rule(token_type: TokenType) -> ParseRule {
  *RULES
    .get(&token_type)
    .unwrap_or(&ParseRule {
      prefix: None,
      infix: None,
      precedence: Precedence::None,
    })
}

pub struct Parser<'a> {
  pub scanner: Scanner<'a>,
  pub previous: Token<'a>,
  pub current: Token<'a>,
  pub diagnostics: Diagnostics,
  pub compiler: Compiler,
  pub interner: StringInterner,
}

impl<'a> Parser<'a> {
  pub fn bind(source: &'a str) -> Self {
    let mut parser = Parser {
      scanner: Scanner::bind(source),
      previous: Token::default(),
      current: Token::default(),
      diagnostics: Diagnostics::default(),
      compiler: Compiler::new(),
      interner: StringInterner::default(),
    };
    parser.advance();
    parser
  }

  pub fn advance(&mut self) {
    self.previous = self.current;
    loop {
      self.current = self.scanner.scan_token();
      if !self.current.is_error() {
        break;
      }
      let tok = self.current;
      self.error_at_current(tok.lexeme);
    }
  }

  pub fn check(&self, token_type: TokenType) -> bool {
    self.current.token_type == token_type
  }

  pub fn match_token(&mut self, token_type: TokenType) -> bool {
    if !self.check(token_type) {
      return false;
    }
    self.advance();
    true
  }

  pub fn consume(&mut self, token_type: TokenType, message: &str) {
    if self.current.token_type == token_type {
      self.advance();
      return;
    }
    self.error_at_current(message);
  }

  pub fn parse_precedence(&mut self, precedence: Precedence) {
    self.advance();
    let prefix_rule = get_rule(self.previous.token_type).prefix;
    let Some(prefix_rule) = prefix_rule else {
      self.error("Expect expression.");
      return;
    };
    let can_assign = precedence <= Precedence::Assignment;
    prefix_rule(self, can_assign);

    while precedence <= get_rule(self.current.token_type).precedence {
      self.advance();
      let infix_rule = get_rule(self.previous.token_type)
        .infix
        .expect("infix rule must exist when precedence matched");
      infix_rule(self, can_assign);
    }

    if can_assign && self.match_token(TokenType::Equal) {
      self.error("Invalid assignment target.");
    }
  }

  pub fn expression(&mut self) {
    self.parse_precedence(Precedence::Assignment);
  }

  pub fn block(&mut self) {
    while !self.check(TokenType::RightBrace) && !self.check(TokenType::Eof) {
      self.declaration();
    }
    self.consume(TokenType::RightBrace, "Expect '}' after block.");
  }

  pub fn begin_scope(&mut self) {
    self.compiler.current_mut().scope_depth += 1;
  }

  pub fn end_scope(&mut self) {
    let line = self.previous.line;
    let col = self.previous.column;
    self.compiler.current_mut().scope_depth -= 1;
    let depth = self.compiler.current().scope_depth;

    while let Some(local) = self.compiler.current().locals.last() {
      if local.depth <= depth {
        break;
      }
      if local.is_captured {
        self.emit_op(OpCode::Clu, line, col);
      } else {
        self.emit_op(OpCode::Pop, line, col);
      }
      self.compiler.current_mut().locals.pop();
    }
  }

  pub fn declaration(&mut self) {
    if self.match_token(TokenType::Var) {
      self.var_declaration();
    } else if self.match_token(TokenType::Global) {
      self.global_declaration();
    } else if self.match_token(TokenType::Fun) {
      // `fun` at the start of a declaration is always a function
      // declaration; the bare self-reference literal only ever appears
      // nested inside an expression, never as a whole statement's first
      // token.
      self.fun_declaration();
    } else {
      self.statement();
    }

    if self.diagnostics.panic_mode {
      self.synchronize();
    }
  }

  pub fn statement(&mut self) {
    if self.match_token(TokenType::Puts) {
      self.puts_statement();
    } else if self.match_token(TokenType::If) {
      self.if_statement();
    } else if self.match_token(TokenType::While) {
      self.while_statement();
    } else if self.match_token(TokenType::Return) {
      self.return_statement();
    } else if self.match_token(TokenType::LeftBrace) {
      self.begin_scope();
      self.block();
      self.end_scope();
    } else {
      self.expression_statement();
    }
  }
}

/// Compiles `source` into a top-level function, or returns the collected
/// diagnostics if compilation failed. This is the sole entry point the host
/// calls (`compile(vm, source)` in the specification).
pub fn compile(source: &str) -> Result<ObjFunction, Vec<crate::diagnostic::Diagnostic>> {
  let mut parser = Parser::bind(source);

  while !parser.match_token(TokenType::Eof) {
    parser.declaration();
  }

  let line = parser.previous.line;
  let col = parser.previous.column;
  parser.emit_return(line, col);

  #[cfg(feature = "debug_print_code")]
  if !parser.diagnostics.had_error {
    crate::debug::disassemble_chunk(
      &parser.compiler.current().function.chunk,
      parser
        .compiler
        .current()
        .function
        .name
        .as_deref()
        .unwrap_or("<script>"),
    );
  }

  if parser.diagnostics.had_error {
    Err(parser.diagnostics.items)
  } else {
    Ok(parser.compiler.pop_frame().function)
  }
}
