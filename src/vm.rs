//! Minimal stack-based bytecode interpreter.
//!
//! The teacher's `vm.rs` has the right shape (`read_byte`/`read_constant`/
//! `read_u16`, a `run` dispatch loop, feature-gated trace output) but only
//! ever executed a single chunk with no call-frame stack at all, since the
//! teacher never compiled nested functions. This extends that shape with a
//! call-frame stack so `CALL`/`RET`/closures actually work; it remains an
//! "external collaborator" stand-in (see SPEC_FULL.md §1/§5), not a
//! production execution engine.

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

use crate::chunk::OpCode;
use crate::object::{Closure, Obj, ObjFunction, Upvalue};
use crate::table::{StringInterner, Table};
use crate::value::Value;

#[derive(Debug, Error)]
pub enum RuntimeError {
  #[error("[line {line}] runtime error: {message}")]
  Failed { line: u32, message: String },
}

struct CallFrame {
  closure: Rc<Closure>,
  ip: usize,
  slot_base: usize,
}

pub struct Vm {
  stack: Vec<Value>,
  frames: Vec<CallFrame>,
  globals: Table,
  interner: StringInterner,
  open_upvalues: Vec<(usize, Rc<RefCell<Upvalue>>)>,
}

impl Default for Vm {
  fn default() -> Self {
    Vm {
      stack: Vec::new(),
      frames: Vec::new(),
      globals: Table::default(),
      interner: StringInterner::default(),
      open_upvalues: Vec::new(),
    }
  }
}

impl Vm {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn interpret(&mut self, function: ObjFunction) -> Result<(), RuntimeError> {
    let closure = Rc::new(Closure {
      function: Rc::new(function),
      upvalues: Vec::new(),
    });
    self.stack.push(Value::Obj(Obj::Closure(closure.clone())));
    self.frames.push(CallFrame {
      closure,
      ip: 0,
      slot_base: 0,
    });
    self.run()
  }

  fn current_frame(&self) -> &CallFrame {
    self.frames.last().expect("run loop always has an active frame")
  }

  fn read_byte(&mut self) -> u8 {
    let frame = self.frames.last_mut().expect("active frame");
    let byte = frame.closure.function.chunk.code[frame.ip];
    frame.ip += 1;
    byte
  }

  fn read_u16(&mut self) -> u16 {
    let hi = self.read_byte() as u16;
    let lo = self.read_byte() as u16;
    (hi << 8) | lo
  }

  fn read_constant(&mut self) -> Value {
    let idx = self.read_byte() as usize;
    self.current_frame().closure.function.chunk.constants[idx].clone()
  }

  fn current_line(&self) -> u32 {
    let frame = self.current_frame();
    let ip = frame.ip.saturating_sub(1);
    *frame
      .closure
      .function
      .chunk
      .lines
      .get(ip)
      .unwrap_or(&0)
  }

  fn runtime_error(&self, message: impl Into<String>) -> RuntimeError {
    RuntimeError::Failed {
      line: self.current_line(),
      message: message.into(),
    }
  }

  fn binary_numeric(&mut self, op: OpCode) -> Result<(), RuntimeError> {
    let b = self.stack.pop().expect("operand");
    let a = self.stack.pop().expect("operand");
    let (a, b) = match (a.as_number(), b.as_number()) {
      (Some(a), Some(b)) => (a, b),
      _ => return Err(self.runtime_error("Operands must be numbers.")),
    };
    let result = match op {
      OpCode::Add => a + b,
      OpCode::Sub => a - b,
      OpCode::Mul => a * b,
      OpCode::Div => a / b,
      OpCode::Lt => {
        self.stack.push(Value::Bool(a < b));
        return Ok(());
      }
      OpCode::Le => {
        self.stack.push(Value::Bool(a <= b));
        return Ok(());
      }
      _ => unreachable!(),
    };
    self.stack.push(Value::Number(result));
    Ok(())
  }

  fn capture_upvalue(&mut self, stack_slot: usize) -> Rc<RefCell<Upvalue>> {
    if let Some((_, existing)) = self.open_upvalues.iter().find(|(slot, _)| *slot == stack_slot) {
      return existing.clone();
    }
    let upvalue = Rc::new(RefCell::new(Upvalue::Open(stack_slot)));
    self.open_upvalues.push((stack_slot, upvalue.clone()));
    upvalue
  }

  fn close_upvalues_from(&mut self, stack_slot: usize) {
    let value = self.stack.get(stack_slot).cloned();
    self.open_upvalues.retain(|(slot, cell)| {
      if *slot >= stack_slot {
        if let Some(v) = &value {
          *cell.borrow_mut() = Upvalue::Closed(v.clone());
        }
        false
      } else {
        true
      }
    });
  }

  fn run(&mut self) -> Result<(), RuntimeError> {
    loop {
      #[cfg(feature = "debug_trace_execution")]
      {
        let frame = self.current_frame();
        crate::debug::disassemble_instruction(&frame.closure.function.chunk, frame.ip);
      }
      #[cfg(feature = "debug_trace_stack")]
      log::trace!("stack: {:?}", self.stack.iter().map(|v| v.to_string()).collect::<Vec<_>>());

      let byte = self.read_byte();
      let op = OpCode::from(byte);
      match op {
        OpCode::Const => {
          let v = self.read_constant();
          self.stack.push(v);
        }
        OpCode::Null => self.stack.push(Value::Null),
        OpCode::True => self.stack.push(Value::Bool(true)),
        OpCode::False => self.stack.push(Value::Bool(false)),
        OpCode::SelfRef => {
          let slot_base = self.current_frame().slot_base;
          let v = self.stack[slot_base].clone();
          self.stack.push(v);
        }
        OpCode::Pop => {
          self.stack.pop();
        }
        OpCode::Clu => {
          let top = self.stack.len() - 1;
          self.close_upvalues_from(top);
          self.stack.pop();
        }
        OpCode::Def => {
          let name = self.read_constant();
          let name = name.as_obj().and_then(Obj::as_string).unwrap_or_default().to_string();
          let interned = self.interner.intern(&name);
          let value = self.stack.pop().expect("value to define");
          self.globals.set(interned, value);
        }
        OpCode::Gld => {
          let name = self.read_constant();
          let name = name.as_obj().and_then(Obj::as_string).unwrap_or_default().to_string();
          match self.globals.get(&name) {
            Some(v) => {
              let v = v.clone();
              self.stack.push(v);
            }
            None => return Err(self.runtime_error(format!("Undefined variable '{name}'."))),
          }
        }
        OpCode::Gst => {
          let name = self.read_constant();
          let name = name.as_obj().and_then(Obj::as_string).unwrap_or_default().to_string();
          if !self.globals.contains(&name) {
            return Err(self.runtime_error(format!("Undefined variable '{name}'.")));
          }
          let v = self.stack.last().expect("value to assign").clone();
          let interned = self.interner.intern(&name);
          self.globals.set(interned, v);
        }
        OpCode::Ld => {
          let slot = self.read_byte() as usize;
          let base = self.current_frame().slot_base;
          let v = self.stack[base + slot].clone();
          self.stack.push(v);
        }
        OpCode::St => {
          let slot = self.read_byte() as usize;
          let base = self.current_frame().slot_base;
          let v = self.stack.last().expect("value to assign").clone();
          self.stack[base + slot] = v;
        }
        OpCode::Uld => {
          let slot = self.read_byte() as usize;
          let closure = self.current_frame().closure.clone();
          let cell = closure.upvalues[slot].borrow();
          let v = match &*cell {
            Upvalue::Open(stack_slot) => self.stack[*stack_slot].clone(),
            Upvalue::Closed(v) => v.clone(),
          };
          drop(cell);
          self.stack.push(v);
        }
        OpCode::Ust => {
          let slot = self.read_byte() as usize;
          let v = self.stack.last().expect("value to assign").clone();
          let closure = self.current_frame().closure.clone();
          let mut cell = closure.upvalues[slot].borrow_mut();
          match &mut *cell {
            Upvalue::Open(stack_slot) => {
              let stack_slot = *stack_slot;
              drop(cell);
              self.stack[stack_slot] = v;
            }
            Upvalue::Closed(slot_value) => *slot_value = v,
          }
        }
        OpCode::Eq => {
          let b = self.stack.pop().expect("operand");
          let a = self.stack.pop().expect("operand");
          self.stack.push(Value::Bool(Value::values_equal(&a, &b)));
        }
        OpCode::Lt | OpCode::Le => self.binary_numeric(op)?,
        OpCode::Not => {
          let v = self.stack.pop().expect("operand");
          self.stack.push(Value::Bool(v.is_falsey()));
        }
        OpCode::Neg => {
          let v = self.stack.pop().expect("operand");
          let n = v.as_number().ok_or_else(|| self.runtime_error("Operand must be a number."))?;
          self.stack.push(Value::Number(-n));
        }
        OpCode::Add => {
          let b = self.stack.last().cloned();
          let a = self.stack.get(self.stack.len().wrapping_sub(2)).cloned();
          if let (Some(Value::Obj(Obj::StringLit(_))), Some(Value::Obj(Obj::StringLit(_)))) = (&a, &b) {
            let b = self.stack.pop().unwrap();
            let a = self.stack.pop().unwrap();
            let (a, b) = match (a, b) {
              (Value::Obj(Obj::StringLit(a)), Value::Obj(Obj::StringLit(b))) => (a, b),
              _ => unreachable!(),
            };
            let joined = format!("{a}{b}");
            let interned = self.interner.intern(&joined);
            self.stack.push(Value::Obj(Obj::StringLit(interned)));
          } else {
            self.binary_numeric(op)?;
          }
        }
        OpCode::Sub | OpCode::Mul | OpCode::Div => self.binary_numeric(op)?,
        OpCode::Jmp => {
          let offset = self.read_u16();
          self.frames.last_mut().unwrap().ip += offset as usize;
        }
        OpCode::Jmpf => {
          let offset = self.read_u16();
          let falsey = self.stack.last().expect("condition").is_falsey();
          if falsey {
            self.frames.last_mut().unwrap().ip += offset as usize;
          }
        }
        OpCode::Loop => {
          let offset = self.read_u16();
          self.frames.last_mut().unwrap().ip -= offset as usize;
        }
        OpCode::Call => {
          let arg_count = self.read_byte() as usize;
          self.call_value(arg_count)?;
        }
        OpCode::Ret => {
          let result = self.stack.pop().expect("return value");
          let frame = self.frames.pop().expect("frame to return from");
          self.close_upvalues_from(frame.slot_base);
          self.stack.truncate(frame.slot_base);
          if self.frames.is_empty() {
            self.stack.pop();
            return Ok(());
          }
          self.stack.push(result);
        }
        OpCode::Clo => {
          let constant = self.read_constant();
          let function = match constant {
            Value::Obj(Obj::Function(f)) => f,
            _ => return Err(self.runtime_error("CLO operand is not a function constant.")),
          };
          let mut upvalues = Vec::with_capacity(function.upvalue_count as usize);
          for _ in 0..function.upvalue_count {
            let is_local = self.read_byte();
            let index = self.read_byte() as usize;
            if is_local == 1 {
              let base = self.current_frame().slot_base;
              upvalues.push(self.capture_upvalue(base + index));
            } else {
              let closure = self.current_frame().closure.clone();
              upvalues.push(closure.upvalues[index].clone());
            }
          }
          let closure = Rc::new(Closure { function, upvalues });
          self.stack.push(Value::Obj(Obj::Closure(closure)));
        }
        OpCode::Puts => {
          let n = self.read_byte() as usize;
          let start = self.stack.len() - n;
          let rendered: Vec<String> = self.stack[start..].iter().map(|v| v.to_string()).collect();
          println!("{}", rendered.join(" "));
        }
      }
    }
  }

  fn call_value(&mut self, arg_count: usize) -> Result<(), RuntimeError> {
    let callee_slot = self.stack.len() - 1 - arg_count;
    let callee = self.stack[callee_slot].clone();
    match callee {
      Value::Obj(Obj::Closure(closure)) => {
        if arg_count != closure.function.arity as usize {
          return Err(self.runtime_error(format!(
            "Expected {} arguments but got {}.",
            closure.function.arity, arg_count
          )));
        }
        self.frames.push(CallFrame {
          closure,
          ip: 0,
          slot_base: callee_slot,
        });
        Ok(())
      }
      _ => Err(self.runtime_error("Can only call functions.")),
    }
  }
}
