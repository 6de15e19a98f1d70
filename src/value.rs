//! Runtime value representation.
//!
//! The teacher crate represents values with an unsafe tagged union
//! (`ValUnion`) and casts object payloads through `NonNull<Obj>`; that file
//! also referenced a `val_union.obj` field its own `ValueType`/`ValUnion`
//! never declared. Object layout is an external collaborator per the
//! specification, so this crate replaces that model with a plain safe enum.

use std::fmt;

use crate::object::Obj;

#[derive(Debug, Clone)]
pub enum Value {
  Bool(bool),
  Null,
  Number(f64),
  Integer(i64),
  Obj(Obj),
}

impl Default for Value {
  fn default() -> Self {
    Value::Null
  }
}

impl Value {
  pub fn is_bool(&self) -> bool {
    matches!(self, Value::Bool(_))
  }

  pub fn is_null(&self) -> bool {
    matches!(self, Value::Null)
  }

  pub fn is_number(&self) -> bool {
    matches!(self, Value::Number(_) | Value::Integer(_))
  }

  pub fn is_obj(&self) -> bool {
    matches!(self, Value::Obj(_))
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      Value::Bool(b) => Some(*b),
      _ => None,
    }
  }

  pub fn as_number(&self) -> Option<f64> {
    match self {
      Value::Number(n) => Some(*n),
      Value::Integer(n) => Some(*n as f64),
      _ => None,
    }
  }

  pub fn as_obj(&self) -> Option<&Obj> {
    match self {
      Value::Obj(o) => Some(o),
      _ => None,
    }
  }

  /// Truthiness used by `and`/`or`/`if`/`while`: only `null` and `false`
  /// are falsy, matching the rest of the "false and nil are falsey, and
  /// everything else is truthy" family of languages this core descends
  /// from.
  pub fn is_falsey(&self) -> bool {
    matches!(self, Value::Null | Value::Bool(false))
  }

  pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
      (Value::Bool(x), Value::Bool(y)) => x == y,
      (Value::Null, Value::Null) => true,
      (Value::Number(x), Value::Number(y)) => x == y,
      (Value::Integer(x), Value::Integer(y)) => x == y,
      (Value::Integer(x), Value::Number(y)) | (Value::Number(y), Value::Integer(x)) => {
        (*x as f64) == *y
      }
      (Value::Obj(Obj::StringLit(x)), Value::Obj(Obj::StringLit(y))) => x == y,
      _ => false,
    }
  }
}

impl From<bool> for Value {
  fn from(b: bool) -> Self {
    Value::Bool(b)
  }
}

impl From<f64> for Value {
  fn from(n: f64) -> Self {
    Value::Number(n)
  }
}

impl From<i64> for Value {
  fn from(n: i64) -> Self {
    Value::Integer(n)
  }
}

impl From<Obj> for Value {
  fn from(o: Obj) -> Self {
    Value::Obj(o)
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Bool(b) => write!(f, "{b}"),
      Value::Null => write!(f, "null"),
      Value::Number(n) => write!(f, "{n}"),
      Value::Integer(n) => write!(f, "{n}"),
      Value::Obj(o) => write!(f, "{o}"),
    }
  }
}
