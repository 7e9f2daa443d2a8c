//! Driver backends and the accumulation routines they share.
//!
//! Both backends call the helpers below for every bucket, window and output,
//! which fixes the order of additions and keeps their results bit-identical.
use crate::{
  buffer::{BucketSums, DigitSelector},
  traits::{InputAccessor, MultiexpElement},
};

mod cpu;
mod parallel;

pub use cpu::CpuDriver;
pub use parallel::ParallelDriver;

#[inline]
fn resolve_input<E: MultiexpElement>(
  input_accessor: Option<&dyn InputAccessor<E>>,
  index: usize,
  inputs: &[E],
) -> E {
  match input_accessor {
    Some(accessor) => accessor.resolve(index, inputs),
    None => inputs[index],
  }
}

/// Offsets of the per-window groups for the given spans.
fn window_offsets(powers: &[Vec<usize>]) -> Vec<usize> {
  let mut offsets = Vec::with_capacity(powers.len() + 1);
  offsets.push(0);
  let mut total = 0;
  for span in powers {
    total += span.len();
    offsets.push(total);
  }
  offsets
}

/// Number of output instances a table describes.
fn num_outputs(num_buckets: usize, num_windows: usize, radix_log2: usize) -> usize {
  let buckets_per_output = num_windows * ((1usize << radix_log2) - 1);
  debug_assert!(buckets_per_output > 0);
  debug_assert_eq!(
    num_buckets % buckets_per_output,
    0,
    "index table does not cover whole output instances"
  );
  num_buckets / buckets_per_output
}

/// Offsets of the per-output groups of the combined buffer.
fn output_offsets(selectors: &[DigitSelector], num_windows: usize) -> Vec<usize> {
  let mut offsets = Vec::with_capacity(selectors.len() + 1);
  offsets.push(0);
  let mut total = 0;
  for selector in selectors {
    total += selector.num_values(num_windows);
    offsets.push(total);
  }
  offsets
}

/// Sums the elements at `positions` as a left fold in table order.
#[inline]
pub(crate) fn accumulate_bucket<E: MultiexpElement>(inputs: &[E], positions: &[usize]) -> E {
  match positions.split_first() {
    None => E::identity(),
    Some((first, rest)) => rest
      .iter()
      .fold(inputs[*first], |acc, position| acc + inputs[*position]),
  }
}

/// Computes `Σ_d d · sums[d - 1]` with the running-sum method.
///
/// `sums[d - 1]` is the bucket sum of digit value `d`.
#[inline]
pub(crate) fn combine_window<E: MultiexpElement>(sums: &[E]) -> E {
  // Summation by parts
  // e.g. 3a + 2b + 1c = a +
  //                    (a) + b +
  //                    ((a) + b) + c
  let mut running_sum = E::identity();
  let mut total = E::identity();
  for sum in sums.iter().rev() {
    running_sum = running_sum + *sum;
    total = total + running_sum;
  }
  total
}

/// Emits the values one output instance produces into `out`.
///
/// `sums` holds the instance's bucket sums, window-major.
pub(crate) fn combine_output<E: MultiexpElement>(
  sums: &[E],
  layout: &BucketSums,
  selector: DigitSelector,
  out: &mut Vec<E>,
) {
  let window_values = sums
    .chunks_exact(layout.buckets_per_window())
    .map(combine_window);

  match selector {
    DigitSelector::PerDigit => out.extend(window_values),
    DigitSelector::All => {
      let window_values: Vec<E> = window_values.collect();
      // We're traversing windows from high to low.
      let total = window_values.iter().rev().fold(E::identity(), |mut acc, value| {
        for _ in 0..layout.radix_log2() {
          acc = acc.double();
        }
        acc + *value
      });
      out.push(total);
    }
  }
}

/// Runs `f` inside a four-thread rayon pool.
#[cfg(test)]
pub(crate) fn with_thread_pool<R: Send>(f: impl FnOnce() -> R + Send) -> R {
  rayon::ThreadPoolBuilder::new()
    .num_threads(4)
    .build()
    .unwrap()
    .install(f)
}
