//! Input accessors that decouple the drivers from the storage of the bases.
use crate::traits::InputAccessor;

/// Maps each logical index to a physical position in the base array.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RemappedInputs {
  positions: Vec<usize>,
}

impl RemappedInputs {
  /// `positions[i]` is the base-array position of logical input `i`.
  pub fn new(positions: Vec<usize>) -> Self {
    Self { positions }
  }

  /// Number of logical inputs.
  pub fn len(&self) -> usize {
    self.positions.len()
  }

  /// Whether there are no logical inputs.
  pub fn is_empty(&self) -> bool {
    self.positions.is_empty()
  }
}

impl<E: Copy> InputAccessor<E> for RemappedInputs {
  fn resolve(&self, logical_index: usize, inputs: &[E]) -> E {
    inputs[self.positions[logical_index]]
  }
}

/// Materializes each input on demand; the base array is ignored.
#[derive(Clone, Copy, Debug)]
pub struct LazyInputs<F> {
  materialize: F,
}

impl<F> LazyInputs<F> {
  /// Wraps `materialize`, which computes logical input `i`.
  pub fn new(materialize: F) -> Self {
    Self { materialize }
  }
}

impl<E, F> InputAccessor<E> for LazyInputs<F>
where
  F: Fn(usize) -> E + Send + Sync,
{
  fn resolve(&self, logical_index: usize, _inputs: &[E]) -> E {
    (self.materialize)(logical_index)
  }
}
