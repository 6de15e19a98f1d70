//! Globals table and string interner.
//!
//! Keyed by content so two identical identifier or string-literal lexemes
//! share the same `Rc<str>` handle, as `original_source/src/parser.c`'s
//! `identifierConstant` assumes.

use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

#[derive(Debug, Default)]
pub struct Table(HashMap<Rc<str>, Value>);

impl Table {
  pub fn get(&self, key: &str) -> Option<&Value> {
    self.0.get(key)
  }

  pub fn set(&mut self, key: Rc<str>, value: Value) {
    self.0.insert(key, value);
  }

  pub fn contains(&self, key: &str) -> bool {
    self.0.contains_key(key)
  }
}

/// Content-addressed string interner: repeated calls with the same bytes
/// return the same `Rc<str>` handle.
#[derive(Debug, Default)]
pub struct StringInterner(HashMap<Rc<str>, Rc<str>>);

impl StringInterner {
  pub fn intern(&mut self, s: &str) -> Rc<str> {
    if let Some(existing) = self.0.get(s) {
      return existing.clone();
    }
    let rc: Rc<str> = Rc::from(s);
    self.0.insert(rc.clone(), rc.clone());
    rc
  }
}
