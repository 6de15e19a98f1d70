//! Root-marking glue for the compiler/VM boundary.
//!
//! In a tracing collector, `mark_compiler_roots` is how the collector
//! learns that a function still under construction (and thus not yet
//! reachable from any running closure) must survive a collection that
//! interrupts compilation. This crate's `Rc`-based stand-in has no tracing
//! collector to drive, so this module is kept for interface parity with
//! `original_source/src/parser.c`'s `au3_markCompilerRoots`.

use crate::compiler::Compiler;

pub fn mark_compiler_roots(compiler: &Compiler) {
  compiler.mark_compiler_roots();
}
