//! Runtime object model.
//!
//! Object layout and garbage collection are explicitly out of scope for the
//! compiler core (see SPEC_FULL.md §1/§5): this module is a safe,
//! reference-counted stand-in sufficient to run what the compiler emits, not
//! a tracing collector. `Rc` handles take the place of the teacher's raw
//! `NonNull<Obj>` pointers.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::chunk::Chunk;
use crate::value::Value;

#[derive(Debug, Default)]
pub struct ObjFunction {
  pub arity: u8,
  pub upvalue_count: u8,
  pub chunk: Chunk,
  pub name: Option<Rc<str>>,
}

impl ObjFunction {
  pub fn named(name: Option<Rc<str>>) -> Self {
    ObjFunction {
      arity: 0,
      upvalue_count: 0,
      chunk: Chunk::default(),
      name,
    }
  }
}

impl fmt::Display for ObjFunction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.name {
      Some(name) => write!(f, "<fn {name}>"),
      None => write!(f, "<script>"),
    }
  }
}

/// A captured variable cell, shared between the defining frame and any
/// closures that captured it. `Open` points at a live stack slot; `Close`
/// copies the value out once that slot's scope ends (emitted as `OP_CLU`).
#[derive(Debug, Clone)]
pub enum Upvalue {
  Open(usize),
  Closed(Value),
}

#[derive(Debug)]
pub struct Closure {
  pub function: Rc<ObjFunction>,
  pub upvalues: Vec<Rc<RefCell<Upvalue>>>,
}

impl fmt::Display for Closure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.function)
  }
}

#[derive(Debug, Clone)]
pub enum Obj {
  StringLit(Rc<str>),
  Function(Rc<ObjFunction>),
  Closure(Rc<Closure>),
}

impl fmt::Display for Obj {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Obj::StringLit(s) => write!(f, "{s}"),
      Obj::Function(func) => write!(f, "{func}"),
      Obj::Closure(closure) => write!(f, "{closure}"),
    }
  }
}

impl Obj {
  pub fn as_string(&self) -> Option<&str> {
    match self {
      Obj::StringLit(s) => Some(s),
      _ => None,
    }
  }
}
