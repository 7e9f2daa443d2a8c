//! Single-threaded reference backend.
use super::{
  accumulate_bucket, combine_output, num_outputs, output_offsets, resolve_input, window_offsets,
};
use crate::{
  buffer::{Bases, BucketSums, Combined, DigitSelector, MultiexpBuffer, MultiproductInputs},
  index_table::IndexTable,
  start_span,
  traits::{InputAccessor, MultiexpDriver, MultiexpElement},
};
use std::{fmt, time::Instant};
use tracing::{info, info_span};

/// Executes every phase on the calling thread.
///
/// The driver holds nothing but the optional input accessor, so one value
/// can serve any number of concurrent calls on independent buffers.
#[derive(Clone, Copy)]
pub struct CpuDriver<'a, E> {
  input_accessor: Option<&'a dyn InputAccessor<E>>,
}

impl<E> Default for CpuDriver<'_, E> {
  fn default() -> Self {
    Self::new()
  }
}

impl<E> fmt::Debug for CpuDriver<'_, E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CpuDriver")
      .field("input_accessor", &self.input_accessor.is_some())
      .finish()
  }
}

impl<'a, E> CpuDriver<'a, E> {
  /// A driver that reads inputs straight from the base array.
  pub fn new() -> Self {
    Self {
      input_accessor: None,
    }
  }

  /// A driver that resolves every input index through `input_accessor`.
  pub fn with_input_accessor(input_accessor: &'a dyn InputAccessor<E>) -> Self {
    Self {
      input_accessor: Some(input_accessor),
    }
  }
}

impl<E: MultiexpElement> MultiexpDriver<E> for CpuDriver<'_, E> {
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

    let buffer = buffer.advance(MultiproductInputs::new(radix_log2, offsets), |inputs, out| {
      out.reserve(size);
      out.extend(
        powers
          .iter()
          .flatten()
          .map(|index| resolve_input(input_accessor, *index, inputs)),
      );
    });

    info!(elapsed_ms = %inputs_t.elapsed().as_millis(), size, "compute_multiproduct_inputs");
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

    let buffer = buffer.advance(sums, |inputs, out| {
      out.reserve(table.num_buckets());
      out.extend(table.iter().map(|bucket| accumulate_bucket(inputs, bucket)));
    });

    info!(
      elapsed_ms = %multiproduct_t.elapsed().as_millis(),
      entries = table.num_entries(),
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

    let buffer = buffer.advance(Combined::new(offsets), |sums, out| {
      out.reserve(size);
      for (output_sums, selector) in sums
        .chunks_exact(layout.buckets_per_output())
        .zip(output_digit_or_all)
      {
        combine_output(output_sums, &layout, *selector, out);
      }
    });

    info!(elapsed_ms = %combine_t.elapsed().as_millis(), size, "combine_multiproduct_outputs");
    buffer
  }

  fn has_input_accessor(&self) -> bool {
    self.input_accessor.is_some()
  }
}
