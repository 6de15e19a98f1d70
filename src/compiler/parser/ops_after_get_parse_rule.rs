//! Prefix and infix parse-rule implementations dispatched by the Pratt
//! table in `parser.rs`.
//!
//! Binary-operator lowering follows the specification exactly: `!=` lowers
//! to `EQ, NOT`; `>` to `LE, NOT`; `>=` to `LT, NOT`. The teacher crate
//! instead emits distinct `NotEqual`/`Greater`/`GreaterEqual` opcodes —
//! that shortcut is not reproduced here.

use crate::chunk::OpCode;
use crate::common::MAX_ARGS;
use crate::compiler::Precedence;
use crate::object::Obj;
use crate::scanner::TokenType;
use crate::value::Value;

use super::Parser;

pub fn number(p: &mut Parser<'_>, _can_assign: bool) {
  let tok = p.previous;
  let value: f64 = tok.lexeme.parse().unwrap_or(0.0);
  p.emit_constant(Value::Number(value), tok.line, tok.column);
}

pub fn integer(p: &mut Parser<'_>, _can_assign: bool) {
  let tok = p.previous;
  let value = if tok.token_type == TokenType::Hexadecimal {
    i64::from_str_radix(tok.lexeme.trim_start_matches("0x").trim_start_matches("0X"), 16).unwrap_or(0)
  } else {
    tok.lexeme.parse().unwrap_or(0)
  };
  p.emit_constant(Value::Integer(value), tok.line, tok.column);
}

pub fn string(p: &mut Parser<'_>, _can_assign: bool) {
  let tok = p.previous;
  let inner = &tok.lexeme[1..tok.lexeme.len() - 1];
  let interned = p.interner.intern(inner);
  p.emit_constant(Value::Obj(Obj::StringLit(interned)), tok.line, tok.column);
}

pub fn variable(p: &mut Parser<'_>, can_assign: bool) {
  let tok = p.previous;
  p.named_variable(tok, can_assign);
}

pub fn grouping(p: &mut Parser<'_>, _can_assign: bool) {
  p.expression();
  p.consume(TokenType::RightParen, "Expect ')' after expression.");
}

pub fn unary(p: &mut Parser<'_>, _can_assign: bool) {
  let op_type = p.previous.token_type;
  let line = p.previous.line;
  let col = p.previous.column;

  p.parse_precedence(Precedence::Unary);

  match op_type {
    TokenType::Bang => p.emit_op(OpCode::Not, line, col),
    TokenType::Minus => p.emit_op(OpCode::Neg, line, col),
    _ => unreachable!("unary() called with non-unary operator"),
  }
}

pub fn binary(p: &mut Parser<'_>, _can_assign: bool) {
  let op_type = p.previous.token_type;
  let line = p.previous.line;
  let col = p.previous.column;
  let rule = super::get_rule(op_type);

  p.parse_precedence(rule.precedence.next());

  match op_type {
    TokenType::BangEqual => {
      p.emit_op(OpCode::Eq, line, col);
      p.emit_op(OpCode::Not, line, col);
    }
    TokenType::EqualEqual => p.emit_op(OpCode::Eq, line, col),
    TokenType::Greater => {
      p.emit_op(OpCode::Le, line, col);
      p.emit_op(OpCode::Not, line, col);
    }
    TokenType::GreaterEqual => {
      p.emit_op(OpCode::Lt, line, col);
      p.emit_op(OpCode::Not, line, col);
    }
    TokenType::Less => p.emit_op(OpCode::Lt, line, col),
    TokenType::LessEqual => p.emit_op(OpCode::Le, line, col),
    TokenType::Plus => p.emit_op(OpCode::Add, line, col),
    TokenType::Minus => p.emit_op(OpCode::Sub, line, col),
    TokenType::Star => p.emit_op(OpCode::Mul, line, col),
    TokenType::Slash => p.emit_op(OpCode::Div, line, col),
    _ => unreachable!("binary() called with non-binary operator"),
  }
}

pub fn literal(p: &mut Parser<'_>, _can_assign: bool) {
  let tok = p.previous;
  match tok.token_type {
    TokenType::False => p.emit_op(OpCode::False, tok.line, tok.column),
    TokenType::Null => p.emit_op(OpCode::Null, tok.line, tok.column),
    TokenType::True => p.emit_op(OpCode::True, tok.line, tok.column),
    // Bare `fun` in expression position: self-reference to the closure
    // currently being compiled, enabling anonymous recursion.
    TokenType::Fun => p.emit_op(OpCode::SelfRef, tok.line, tok.column),
    _ => unreachable!("literal() called with non-literal token"),
  }
}

pub fn and_(p: &mut Parser<'_>, _can_assign: bool) {
  let line = p.previous.line;
  let col = p.previous.column;
  let end_jump = p.emit_jump(OpCode::Jmpf, line, col);
  p.emit_op(OpCode::Pop, line, col);
  p.parse_precedence(Precedence::And);
  p.patch_jump(end_jump);
}

pub fn or_(p: &mut Parser<'_>, _can_assign: bool) {
  let line = p.previous.line;
  let col = p.previous.column;
  let else_jump = p.emit_jump(OpCode::Jmpf, line, col);
  let end_jump = p.emit_jump(OpCode::Jmp, line, col);
  p.patch_jump(else_jump);
  p.emit_op(OpCode::Pop, line, col);
  p.parse_precedence(Precedence::Or);
  p.patch_jump(end_jump);
}

fn argument_list(p: &mut Parser<'_>) -> u8 {
  let mut count: usize = 0;
  if !p.check(TokenType::RightParen) {
    loop {
      p.expression();
      if count >= MAX_ARGS {
        p.error("Can't have more than 255 arguments.");
      } else {
        count += 1;
      }
      if !p.match_token(TokenType::Comma) {
        break;
      }
    }
  }
  p.consume(TokenType::RightParen, "Expect ')' after arguments.");
  count as u8
}

pub fn call(p: &mut Parser<'_>, _can_assign: bool) {
  let line = p.previous.line;
  let col = p.previous.column;
  let arg_count = argument_list(p);
  p.emit_op_byte(OpCode::Call, arg_count, line, col);
}
