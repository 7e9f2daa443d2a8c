//! Typed buffers that carry elements through the three pipeline phases.
//!
//! A [`MultiexpBuffer`] owns two allocations: the live elements and a
//! scratch vector. Each phase writes its output into the scratch vector and
//! then swaps the two, so a full pipeline run reuses the same storage. The
//! layout parameter `L` records which phase produced the contents, and every
//! driver operation only accepts the layout it expects:
//!
//! `Bases` → `MultiproductInputs` → `BucketSums` → `Combined`
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Selects what `combine_multiproduct_outputs` emits for one output instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigitSelector {
  /// One value: the window values weighted by `2^(radix_log2 · window)` and summed
  All,
  /// One unweighted value per digit window, lowest window first
  PerDigit,
}

impl DigitSelector {
  /// Number of elements this selector emits for an instance with `num_windows` windows.
  pub fn num_values(self, num_windows: usize) -> usize {
    match self {
      DigitSelector::All => 1,
      DigitSelector::PerDigit => num_windows,
    }
  }
}

/// Layout of a buffer holding the raw bases (the idle state).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Bases;

/// Layout after `compute_multiproduct_inputs`: the gathered elements of
/// every window, stored back to back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultiproductInputs {
  radix_log2: usize,
  window_offsets: Vec<usize>,
}

impl MultiproductInputs {
  pub(crate) fn new(radix_log2: usize, window_offsets: Vec<usize>) -> Self {
    debug_assert!(!window_offsets.is_empty());
    Self {
      radix_log2,
      window_offsets,
    }
  }

  /// The digit width in bits.
  pub fn radix_log2(&self) -> usize {
    self.radix_log2
  }

  /// Number of digit windows.
  pub fn num_windows(&self) -> usize {
    self.window_offsets.len() - 1
  }

  /// Positions of window `w`'s elements in the buffer.
  pub fn window(&self, w: usize) -> Range<usize> {
    self.window_offsets[w]..self.window_offsets[w + 1]
  }

  /// Number of buckets per window (digit values `1..2^radix_log2`).
  pub fn buckets_per_window(&self) -> usize {
    (1 << self.radix_log2) - 1
  }
}

/// Layout after `compute_multiproduct`: one sum per bucket, ordered by
/// output, then window, then digit value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BucketSums {
  radix_log2: usize,
  num_windows: usize,
  num_outputs: usize,
}

impl BucketSums {
  pub(crate) fn new(radix_log2: usize, num_windows: usize, num_outputs: usize) -> Self {
    Self {
      radix_log2,
      num_windows,
      num_outputs,
    }
  }

  /// The digit width in bits.
  pub fn radix_log2(&self) -> usize {
    self.radix_log2
  }

  /// Number of digit windows.
  pub fn num_windows(&self) -> usize {
    self.num_windows
  }

  /// Number of batched output instances.
  pub fn num_outputs(&self) -> usize {
    self.num_outputs
  }

  /// Number of buckets per window (digit values `1..2^radix_log2`).
  pub fn buckets_per_window(&self) -> usize {
    (1 << self.radix_log2) - 1
  }

  /// Number of bucket sums belonging to one output instance.
  pub fn buckets_per_output(&self) -> usize {
    self.num_windows * self.buckets_per_window()
  }
}

/// Layout after `combine_multiproduct_outputs`: the results of every output
/// instance, back to back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Combined {
  output_offsets: Vec<usize>,
}

impl Combined {
  pub(crate) fn new(output_offsets: Vec<usize>) -> Self {
    Self { output_offsets }
  }

  /// Number of output instances.
  pub fn num_outputs(&self) -> usize {
    self.output_offsets.len() - 1
  }

  /// Positions of output `k`'s values in the buffer.
  pub fn output(&self, k: usize) -> Range<usize> {
    self.output_offsets[k]..self.output_offsets[k + 1]
  }
}

/// An exclusively owned element buffer in the pipeline state `L`.
#[derive(Clone, Debug)]
pub struct MultiexpBuffer<E, L = Bases> {
  data: Vec<E>,
  scratch: Vec<E>,
  layout: L,
}

impl<E> MultiexpBuffer<E, Bases> {
  /// Wraps the bases of a multiexponentiation request.
  pub fn new(bases: Vec<E>) -> Self {
    Self {
      data: bases,
      scratch: Vec::new(),
      layout: Bases,
    }
  }
}

impl<E> From<Vec<E>> for MultiexpBuffer<E, Bases> {
  fn from(bases: Vec<E>) -> Self {
    Self::new(bases)
  }
}

impl<E, L> MultiexpBuffer<E, L> {
  /// The elements currently held.
  pub fn as_slice(&self) -> &[E] {
    &self.data
  }

  /// Number of elements currently held.
  pub fn len(&self) -> usize {
    self.data.len()
  }

  /// Whether the buffer holds no elements.
  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  /// Describes how the current elements are laid out.
  pub fn layout(&self) -> &L {
    &self.layout
  }

  /// Moves to the next state: `fill` receives the current elements and an
  /// empty output vector, and the two allocations swap roles afterwards.
  pub(crate) fn advance<M>(
    self,
    layout: M,
    fill: impl FnOnce(&[E], &mut Vec<E>),
  ) -> MultiexpBuffer<E, M> {
    let MultiexpBuffer {
      data, mut scratch, ..
    } = self;
    scratch.clear();
    fill(&data, &mut scratch);
    MultiexpBuffer {
      data: scratch,
      scratch: data,
      layout,
    }
  }
}

impl<E> MultiexpBuffer<E, Combined> {
  /// Number of output instances.
  pub fn num_outputs(&self) -> usize {
    self.layout.num_outputs()
  }

  /// The values produced for output instance `k`.
  pub fn output(&self, k: usize) -> &[E] {
    &self.data[self.layout.output(k)]
  }

  /// Takes the values of every output instance, back to back.
  pub fn into_outputs(self) -> Vec<E> {
    self.data
  }
}
