/// Types with a cheap, argument-less default constructor.
///
/// Mirrors the teacher crate's `Init` trait: used in place of bespoke `new()`
/// inherent methods for the handful of structs whose construction is just
/// `Self::default()`.
pub trait Init {
  fn init() -> Self;
}

impl<T: Default> Init for T {
  fn init() -> Self {
    Self::default()
  }
}
