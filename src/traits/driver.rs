//! This module defines the three-phase driver contract of the bucket method.
use crate::{
  buffer::{Bases, BucketSums, Combined, DigitSelector, MultiexpBuffer, MultiproductInputs},
  index_table::IndexTable,
  traits::MultiexpElement,
};

/// A backend that executes the phases of a bucket-method multiexponentiation.
///
/// The phases run in order, each consuming the buffer state left by the
/// previous one:
///
/// 1. [`compute_multiproduct_inputs`](Self::compute_multiproduct_inputs)
///    gathers the inputs of every digit window.
/// 2. [`compute_multiproduct`](Self::compute_multiproduct) sums every bucket.
/// 3. [`combine_multiproduct_outputs`](Self::combine_multiproduct_outputs)
///    weights and combines the bucket sums.
///
/// Every conforming backend accumulates in the same fixed order, so two
/// backends given identical inputs produce bit-identical outputs:
/// - a bucket is a left fold over its positions in table order, starting
///   from the first listed element; an empty bucket is the identity;
/// - a window value is the running sum over digit values from the highest
///   down (`running += S_d; total += running`), starting from the identity;
/// - an aggregate output applies `radix_log2` doublings and then adds the
///   next window value, from the highest window down, starting from the
///   identity.
///
/// No phase fails. Inputs that break the documented preconditions are caller
/// bugs; they are checked with debug assertions or panic on an out-of-range
/// index.
pub trait MultiexpDriver<E: MultiexpElement>: Send + Sync {
  /// Gathers, window by window, the elements named in `powers`.
  ///
  /// `powers[w]` lists the logical input indices that contribute to digit
  /// window `w`. The output holds those elements back to back in the order
  /// listed, each resolved through the driver's input accessor if it has one.
  ///
  /// # Preconditions
  /// - `radix_log2 > 0`
  /// - `powers` is non-empty
  /// - without an input accessor, every index is below `buffer.len()`
  fn compute_multiproduct_inputs(
    &self,
    buffer: MultiexpBuffer<E, Bases>,
    powers: &[Vec<usize>],
    radix_log2: usize,
  ) -> MultiexpBuffer<E, MultiproductInputs>;

  /// Replaces the gathered elements by one sum per bucket of `table`.
  ///
  /// Buckets are ordered by output instance, then window, then digit value
  /// `1..2^radix_log2`.
  ///
  /// # Preconditions
  /// - `table.num_buckets()` is a multiple of `num_windows · (2^radix_log2 − 1)`
  /// - every position is below `buffer.len()`
  fn compute_multiproduct(
    &self,
    buffer: MultiexpBuffer<E, MultiproductInputs>,
    table: &IndexTable,
  ) -> MultiexpBuffer<E, BucketSums>;

  /// Combines the bucket sums of every output instance.
  ///
  /// `output_digit_or_all[k]` selects whether instance `k` yields one
  /// aggregate value or one value per digit window.
  ///
  /// # Preconditions
  /// - `output_digit_or_all.len()` equals the number of output instances
  fn combine_multiproduct_outputs(
    &self,
    buffer: MultiexpBuffer<E, BucketSums>,
    output_digit_or_all: &[DigitSelector],
  ) -> MultiexpBuffer<E, Combined>;

  /// Whether inputs are resolved through an input accessor rather than
  /// read from the base array.
  fn has_input_accessor(&self) -> bool;
}
