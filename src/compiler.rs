//! Lexical scope resolver: locals, globals, upvalues, and the stack of
//! nested function compilations.
//!
//! The teacher crate models "enclosing function" as a single `Compiler`
//! struct with no parent link at all (it never compiled nested functions).
//! Per the specification's own design notes (§9: "prefer an explicit vector
//! of frames indexed top-down... avoid self-referential owned types"), this
//! crate reifies the frame stack as `Vec<CompilerFrame>` rather than a
//! linked `enclosing: Option<Box<Compiler>>` chain: "enclosing frame" is
//! simply "the previous element of the vector."

pub mod parser;

use std::rc::Rc;

use crate::common::{MAX_LOCALS, MAX_UPVALUES};
use crate::object::ObjFunction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
  None,
  Assignment,
  Or,
  And,
  Equality,
  Comparison,
  Term,
  Factor,
  Unary,
  Call,
  Primary,
}

impl Precedence {
  pub fn next(self) -> Precedence {
    use Precedence::*;
    match self {
      None => Assignment,
      Assignment => Or,
      Or => And,
      And => Equality,
      Equality => Comparison,
      Comparison => Term,
      Term => Factor,
      Factor => Unary,
      Unary => Call,
      Call => Primary,
      Primary => Primary,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionType {
  Script,
  Function,
}

#[derive(Debug, Clone)]
pub struct Local {
  pub name: Rc<str>,
  /// `-1` while the local's initializer is still being parsed.
  pub depth: i32,
  pub is_captured: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct UpvalueDescriptor {
  pub index: u8,
  pub is_local: bool,
}

/// One nested function's compilation context: its function-under-
/// construction, locals, scope depth, and recorded upvalues.
pub struct CompilerFrame {
  pub function: ObjFunction,
  pub function_type: FunctionType,
  pub locals: Vec<Local>,
  pub scope_depth: i32,
  pub upvalues: Vec<UpvalueDescriptor>,
}

impl CompilerFrame {
  pub fn new(function_type: FunctionType, name: Option<Rc<str>>) -> Self {
    // Slot 0 is reserved and never user-accessible: for a function it
    // holds the callee's own closure (enabling `fun` self-reference), for
    // the top-level script it is simply inert.
    let reserved = Local {
      name: Rc::from(""),
      depth: 0,
      is_captured: false,
    };
    CompilerFrame {
      function: ObjFunction::named(name),
      function_type,
      locals: vec![reserved],
      scope_depth: 0,
      upvalues: Vec::new(),
    }
  }
}

/// Owns the stack of active function compilations.
pub struct Compiler {
  pub frames: Vec<CompilerFrame>,
}

impl Compiler {
  pub fn new() -> Self {
    Compiler {
      frames: vec![CompilerFrame::new(FunctionType::Script, None)],
    }
  }

  pub fn current(&self) -> &CompilerFrame {
    self.frames.last().expect("compiler always has a frame")
  }

  pub fn current_mut(&mut self) -> &mut CompilerFrame {
    self.frames.last_mut().expect("compiler always has a frame")
  }

  pub fn push_frame(&mut self, function_type: FunctionType, name: Option<Rc<str>>) {
    self.frames.push(CompilerFrame::new(function_type, name));
  }

  pub fn pop_frame(&mut self) -> CompilerFrame {
    self.frames.pop().expect("popped frame that was never pushed")
  }

  pub fn depth(&self) -> usize {
    self.frames.len()
  }

  pub fn locals_at_capacity(&self) -> bool {
    self.current().locals.len() >= MAX_LOCALS
  }

  pub fn upvalues_at_capacity(&self, frame_index: usize) -> bool {
    self.frames[frame_index].upvalues.len() >= MAX_UPVALUES
  }

  /// Walks `Vec<CompilerFrame>` top-down, marking every function-under-
  /// construction reachable. In this crate's `Rc`-based stand-in there is
  /// no tracing collector to feed, so this is kept only for interface
  /// parity with `original_source/src/parser.c`'s `au3_markCompilerRoots`
  /// (which walks `compiler->enclosing`) should a tracing GC replace the
  /// `Rc` model later.
  pub fn mark_compiler_roots(&self) {
    for frame in self.frames.iter().rev() {
      log::trace!("root: function under construction {:?}", frame.function.name);
    }
  }
}

impl Default for Compiler {
  fn default() -> Self {
    Self::new()
  }
}
