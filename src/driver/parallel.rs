//! Thread-pool backend built on rayon.
//!
//! Work is split across buckets and output instances, never inside one, so
//! each bucket and each output is still accumulated by a single thread in
//! the shared fixed order. The calls block until the pool finishes.
use super::{
  accumulate_bucket, combine_output, num_outputs, output_offsets, resolve_input, window_offsets,
};
use crate::{
  buffer::{Bases, BucketSums, Combined, DigitSelector, MultiexpBuffer, MultiproductInputs},
  index_table::IndexTable,
  start_span,
  traits::{InputAccessor, MultiexpDriver, MultiexpElement},
};
use rayon::{current_num_threads, prelude::*};
use std::{fmt, time::Instant};
use tracing::{info, info_span};

/// Inputs below this many elements are processed serially.
const DEFAULT_MIN_PARALLEL_LEN: usize = 1 << 10;

/// Executes the phases on the global rayon pool.
#[derive(Clone, Copy)]
pub struct ParallelDriver<'a, E> {
  input_accessor: Option<&'a dyn InputAccessor<E>>,
  min_parallel_len: usize,
}

impl<E> Default for ParallelDriver<'_, E> {
  fn default() -> Self {
    Self::new()
  }
}

impl<E> fmt::Debug for ParallelDriver<'_, E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ParallelDriver")
      .field("input_accessor", &self.input_accessor.is_some())
      .field("min_parallel_len", &self.min_parallel_len)
      .finish()
  }
}

impl<'a, E> ParallelDriver<'a, E> {
  /// A driver that reads inputs straight from the base array.
  pub fn new() -> Self {
    Self {
      input_accessor: None,
      min_parallel_len: DEFAULT_MIN_PARALLEL_LEN,
    }
  }

  /// A driver that resolves every input index through `input_accessor`.
  pub fn with_input_accessor(input_accessor: &'a dyn InputAccessor<E>) -> Self {
    Self {
      input_accessor: Some(input_accessor),
      ..Self::new()
    }
  }

  /// Sets the size below which a phase runs on the calling thread.
  pub fn with_min_parallel_len(mut self, min_parallel_len: usize) -> Self {
    self.min_parallel_len = min_parallel_len;
    self
  }

  fn use_parallelism(&self, len: usize) -> bool {
    len >= self.min_parallel_len && current_num_threads() > 1
  }
}

impl<E: MultiexpElement> MultiexpDriver<E> for ParallelDriver<'_, E> {
  fn compute_multiproduct_inputs(
    &self,
    buffer: MultiexpBuffer<E, Bases>,
    powers: &[Vec<usize>],
    radix_log2: usize,
  ) -> MultiexpBuffer<E, MultiproductInputs> {
    debug_assert!(radix_log2 > 0, "radix_log2 must be positive");
    debug_assert!(!powers.is_empty(), "at least one digit window is required");

    let (_inputs_span, inputs_t) =
      start_span!("compute_multiproduct_inputs", windows = powers.len());
    let offsets = window_offsets(powers);
    let size = offsets[powers.len()];
    let input_accessor = self.input_accessor;
    let parallel = self.use_parallelism(size);

    let buffer = buffer.advance(MultiproductInputs::new(radix_log2, offsets), |inputs, out| {
      out.reserve(size);
      if parallel {
        out.par_extend(
          powers.par_iter().flat_map_iter(|span| {
            span
              .iter()
              .map(move |index| resolve_input(input_accessor, *index, inputs))
          }),
        );
      } else {
        out.extend(
          powers
            .iter()
            .flatten()
            .map(|index| resolve_input(input_accessor, *index, inputs)),
        );
      }
    });

    info!(
      elapsed_ms = %inputs_t.elapsed().as_millis(),
      size,
      parallel,
      "compute_multiproduct_inputs"
    );
    buffer
  }

  fn compute_multiproduct(
    &self,
    buffer: MultiexpBuffer<E, MultiproductInputs>,
    table: &IndexTable,
  ) -> MultiexpBuffer<E, BucketSums> {
    debug_assert!(
      table.max_position().is_none_or(|p| p < buffer.len()),
      "index table refers past the gathered inputs"
    );

    let (_multiproduct_span, multiproduct_t) =
      start_span!("compute_multiproduct", buckets = table.num_buckets());
    let layout = buffer.layout();
    let radix_log2 = layout.radix_log2();
    let num_windows = layout.num_windows();
    let sums = BucketSums::new(
      radix_log2,
      num_windows,
      num_outputs(table.num_buckets(), num_windows, radix_log2),
    );
    let parallel = self.use_parallelism(table.num_entries());

    let buffer = buffer.advance(sums, |inputs, out| {
      out.reserve(table.num_buckets());
      if parallel {
        out.par_extend(
          (0..table.num_buckets())
            .into_par_iter()
            .map(|b| accumulate_bucket(inputs, &table[b])),
        );
      } else {
        out.extend(table.iter().map(|bucket| accumulate_bucket(inputs, bucket)));
      }
    });

    info!(
      elapsed_ms = %multiproduct_t.elapsed().as_millis(),
      entries = table.num_entries(),
      parallel,
      "compute_multiproduct"
    );
    buffer
  }

  fn combine_multiproduct_outputs(
    &self,
    buffer: MultiexpBuffer<E, BucketSums>,
    output_digit_or_all: &[DigitSelector],
  ) -> MultiexpBuffer<E, Combined> {
    let layout = *buffer.layout();
    debug_assert_eq!(
      output_digit_or_all.len(),
      layout.num_outputs(),
      "one selector per output instance is required"
    );

    let (_combine_span, combine_t) =
      start_span!("combine_multiproduct_outputs", outputs = layout.num_outputs());
    let offsets = output_offsets(output_digit_or_all, layout.num_windows());
    let size = offsets[output_digit_or_all.len()];
    let parallel = self.use_parallelism(buffer.len()) && layout.num_outputs() > 1;

    let buffer = buffer.advance(Combined::new(offsets), |sums, out| {
      out.reserve(size);
      if parallel {
        let per_output: Vec<Vec<E>> = sums
          .par_chunks_exact(layout.buckets_per_output())
          .zip(output_digit_or_all.par_iter())
          .map(|(output_sums, selector)| {
            let mut values = Vec::with_capacity(selector.num_values(layout.num_windows()));
            combine_output(output_sums, &layout, *selector, &mut values);
            values
          })
          .collect();
        out.extend(per_output.into_iter().flatten());
      } else {
        for (output_sums, selector) in sums
          .chunks_exact(layout.buckets_per_output())
          .zip(output_digit_or_all)
        {
          combine_output(output_sums, &layout, *selector, out);
        }
      }
    });

    info!(
      elapsed_ms = %combine_t.elapsed().as_millis(),
      size,
      parallel,
      "combine_multiproduct_outputs"
    );
    buffer
  }

  fn has_input_accessor(&self) -> bool {
    self.input_accessor.is_some()
  }
}
