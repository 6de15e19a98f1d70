//! Compile-time diagnostics.
//!
//! Diagnostics are collected by a sink rather than raised by unwinding:
//! parser methods that hit trouble call `Diagnostics::report` and return
//! normally, so panic-mode recovery (`synchronize`) can still run. This
//! corrects the teacher crate's `compile_time_error_handlers.rs`, whose
//! `error_at` returns `Result<(), InterpretError>` and is `?`-propagated by
//! every caller — the first diagnostic would unwind straight out of
//! `parse_precedence` and abort the rest of the parse.

use std::fmt;

#[derive(Debug, Clone)]
pub struct Diagnostic {
  pub line: u32,
  pub column: u32,
  /// `None` for an `ERROR` token (the lexeme already *is* the message);
  /// `Some("")` renders as "at end" for `EOF`.
  pub at: Option<String>,
  pub message: String,
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "[line {}:{}] Error", self.line, self.column)?;
    match &self.at {
      None => {}
      Some(s) if s.is_empty() => write!(f, " at end")?,
      Some(s) => write!(f, " at '{s}'")?,
    }
    write!(f, ": {}", self.message)
  }
}

/// Accumulates diagnostics and tracks the panic-mode/had-error flags.
#[derive(Debug, Default)]
pub struct Diagnostics {
  pub items: Vec<Diagnostic>,
  pub had_error: bool,
  pub panic_mode: bool,
}

impl Diagnostics {
  pub fn report(&mut self, line: u32, column: u32, at: Option<String>, message: impl Into<String>) {
    if self.panic_mode {
      return;
    }
    self.panic_mode = true;
    self.had_error = true;
    let message = message.into();
    log::warn!("compile diagnostic at {line}:{column}: {message}");
    self.items.push(Diagnostic {
      line,
      column,
      at,
      message,
    });
  }
}
