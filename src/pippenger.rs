//! Reference orchestration of the bucket method over a [`MultiexpDriver`].
//!
//! The orchestrator validates a request, slices every exponent into
//! `radix_log2`-bit digits, builds the power spans and the multiproduct
//! index table, and runs the three driver phases. Several exponent
//! sequences may be batched over the same bases; each yields its own
//! output values.
use crate::{
  buffer::{DigitSelector, MultiexpBuffer},
  errors::MultiexpError,
  index_table::IndexTable,
  start_span,
  traits::{MultiexpDriver, MultiexpElement},
};
use ff::PrimeField;
use itertools::Itertools;
use num_integer::Integer;
use std::time::Instant;
use tracing::{info, info_span, warn};

/// The largest digit width a request may use.
pub const MAX_RADIX_LOG2: usize = 16;

/// A sequence of exponents, each stored as `element_nbytes` little-endian bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExponentSequence {
  element_nbytes: usize,
  data: Vec<u8>,
}

impl ExponentSequence {
  /// Wraps `data`, which must split into exponents of `element_nbytes` bytes.
  pub fn new(element_nbytes: usize, data: Vec<u8>) -> Result<Self, MultiexpError> {
    if element_nbytes == 0 {
      return Err(MultiexpError::InvalidExponentWidth {
        reason: "exponents must be at least one byte wide".to_string(),
      });
    }
    if data.len() % element_nbytes != 0 {
      return Err(MultiexpError::InvalidExponentWidth {
        reason: format!(
          "{} bytes do not split into {element_nbytes}-byte exponents",
          data.len()
        ),
      });
    }
    Ok(Self {
      element_nbytes,
      data,
    })
  }

  /// Exponents given as small integers, stored in as few bytes as the
  /// largest of them needs.
  pub fn from_small<T: Integer + Into<u64> + Copy>(values: &[T]) -> Self {
    let max = values
      .iter()
      .map(|v| Into::<u64>::into(*v))
      .max()
      .unwrap_or(0);
    let num_bits = (u64::BITS - max.leading_zeros()) as usize;
    let element_nbytes = num_bits.div_ceil(8).max(1);
    let data = values
      .iter()
      .flat_map(|v| Into::<u64>::into(*v).to_le_bytes().into_iter().take(element_nbytes))
      .collect();
    Self {
      element_nbytes,
      data,
    }
  }

  /// Exponents given as field scalars, stored as their little-endian representation.
  pub fn from_scalars<F: PrimeField>(scalars: &[F]) -> Self {
    let element_nbytes = F::Repr::default().as_ref().len();
    let data = scalars
      .iter()
      .flat_map(|s| s.to_repr().as_ref().to_vec())
      .collect();
    Self {
      element_nbytes,
      data,
    }
  }

  /// Number of bytes per exponent.
  pub fn element_nbytes(&self) -> usize {
    self.element_nbytes
  }

  /// Number of exponents.
  pub fn len(&self) -> usize {
    self.data.len() / self.element_nbytes
  }

  /// Whether the sequence holds no exponents.
  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  /// The little-endian bytes of exponent `i`.
  pub fn exponent(&self, i: usize) -> &[u8] {
    &self.data[i * self.element_nbytes..(i + 1) * self.element_nbytes]
  }

  /// Number of significant bits of the largest exponent.
  pub fn num_bits(&self) -> usize {
    self
      .data
      .chunks_exact(self.element_nbytes)
      .map(|bytes| match bytes.iter().rposition(|b| *b != 0) {
        None => 0,
        Some(top) => 8 * top + (8 - bytes[top].leading_zeros() as usize),
      })
      .max()
      .unwrap_or(0)
  }

  /// The digit of exponent `i` in window `window`, i.e. bits
  /// `window · radix_log2 .. (window + 1) · radix_log2`.
  pub fn digit(&self, i: usize, window: usize, radix_log2: usize) -> usize {
    debug_assert!(radix_log2 <= MAX_RADIX_LOG2);
    let bytes = self.exponent(i);
    let skip_bits = window * radix_log2;
    let skip_bytes = skip_bits / 8;

    if skip_bytes >= bytes.len() {
      return 0;
    }

    let mut v = [0; 8];
    for (v, o) in v.iter_mut().zip(bytes[skip_bytes..].iter()) {
      *v = *o;
    }

    let mut tmp = u64::from_le_bytes(v);
    tmp >>= skip_bits - (skip_bytes * 8);
    tmp %= 1 << radix_log2;

    tmp as usize
  }
}

/// Picks a digit width for `n` inputs.
pub fn default_radix_log2(n: usize) -> usize {
  let c = if n < 4 {
    1
  } else if n < 32 {
    3
  } else {
    (n as f64).ln().ceil() as usize
  };
  c.min(MAX_RADIX_LOG2)
}

/// Number of digit windows needed to cover the largest exponent; at least one.
pub fn num_windows(sequences: &[ExponentSequence], radix_log2: usize) -> usize {
  let num_bits = sequences
    .iter()
    .map(ExponentSequence::num_bits)
    .max()
    .unwrap_or(0);
  num_bits.div_ceil(radix_log2).max(1)
}

/// For every window, the ascending indices of the inputs whose digit is
/// non-zero in at least one sequence.
pub fn build_power_spans(
  sequences: &[ExponentSequence],
  num_inputs: usize,
  num_windows: usize,
  radix_log2: usize,
) -> Vec<Vec<usize>> {
  (0..num_windows)
    .map(|w| {
      (0..num_inputs)
        .filter(|&i| {
          sequences
            .iter()
            .any(|s| i < s.len() && s.digit(i, w, radix_log2) != 0)
        })
        .collect_vec()
    })
    .collect()
}

/// Builds the table that buckets the gathered inputs by sequence, window
/// and digit value.
///
/// Within a bucket, positions are listed in ascending order, which is also
/// the order the drivers add them in.
pub fn build_index_table(
  sequences: &[ExponentSequence],
  powers: &[Vec<usize>],
  radix_log2: usize,
) -> IndexTable {
  let buckets_per_window = (1 << radix_log2) - 1;
  let total_entries: usize = powers.iter().map(Vec::len).sum();
  let mut table = IndexTable::with_capacity(
    sequences.len() * powers.len() * buckets_per_window,
    sequences.len() * total_entries,
  );

  for sequence in sequences {
    let mut offset = 0;
    for (w, span) in powers.iter().enumerate() {
      let entries = span.iter().enumerate().filter_map(move |(rank, &i)| {
        if i >= sequence.len() {
          return None;
        }
        match sequence.digit(i, w, radix_log2) {
          0 => None,
          d => Some((d - 1, offset + rank)),
        }
      });
      table.push_grouped(buckets_per_window, entries);
      offset += span.len();
    }
  }
  table
}

fn validate_request(
  has_input_accessor: bool,
  num_bases: usize,
  sequences: &[ExponentSequence],
  radix_log2: usize,
  selectors: &[DigitSelector],
) -> Result<(), MultiexpError> {
  if sequences.is_empty() {
    return Err(MultiexpError::EmptyExponents);
  }
  if selectors.len() != sequences.len() {
    return Err(MultiexpError::InvalidSelectorLength {
      actual: selectors.len(),
      expected: sequences.len(),
    });
  }
  if radix_log2 == 0 || radix_log2 > MAX_RADIX_LOG2 {
    return Err(MultiexpError::InvalidRadix {
      radix_log2,
      max: MAX_RADIX_LOG2,
    });
  }
  if let Some(sequence) = sequences
    .iter()
    .find(|s| !has_input_accessor && s.len() > num_bases)
  {
    return Err(MultiexpError::InvalidInputLength {
      actual: sequence.len(),
      max: num_bases,
    });
  }
  Ok(())
}

/// Computes `Σ_i exponent_i · base_i` for every sequence with `driver`.
///
/// `selectors[k]` shapes the output of sequence `k`: [`DigitSelector::All`]
/// yields one value, [`DigitSelector::PerDigit`] yields [`num_windows`]
/// unweighted window values, lowest window first. Outputs are concatenated
/// in sequence order.
///
/// # Errors
/// Returns `MultiexpError::EmptyExponents` if `sequences` is empty.
/// Returns `MultiexpError::InvalidSelectorLength` if `selectors` and `sequences` differ in length.
/// Returns `MultiexpError::InvalidRadix` if `radix_log2` is not in `1..=MAX_RADIX_LOG2`.
/// Returns `MultiexpError::InvalidInputLength` if a sequence is longer than
/// `bases` and the driver has no input accessor.
pub fn compute_multiexponentiation<E, D>(
  driver: &D,
  bases: Vec<E>,
  sequences: &[ExponentSequence],
  radix_log2: usize,
  selectors: &[DigitSelector],
) -> Result<Vec<E>, MultiexpError>
where
  E: MultiexpElement,
  D: MultiexpDriver<E>,
{
  let (_multiexp_span, multiexp_t) =
    start_span!("compute_multiexponentiation", outputs = sequences.len());

  validate_request(
    driver.has_input_accessor(),
    bases.len(),
    sequences,
    radix_log2,
    selectors,
  )
  .inspect_err(|e| warn!(error = %e, "rejected multiexponentiation request"))?;

  let num_inputs = sequences
    .iter()
    .map(ExponentSequence::len)
    .max()
    .unwrap_or(0);
  let num_windows = num_windows(sequences, radix_log2);
  let powers = build_power_spans(sequences, num_inputs, num_windows, radix_log2);
  let table = build_index_table(sequences, &powers, radix_log2);

  let buffer = driver.compute_multiproduct_inputs(MultiexpBuffer::new(bases), &powers, radix_log2);
  let buffer = driver.compute_multiproduct(buffer, &table);
  let outputs = driver
    .combine_multiproduct_outputs(buffer, selectors)
    .into_outputs();

  info!(
    elapsed_ms = %multiexp_t.elapsed().as_millis(),
    size = num_inputs,
    radix_log2,
    num_windows,
    "compute_multiexponentiation"
  );
  Ok(outputs)
}

/// Computes `Σ_i exponent_i · base_i` by plain double-and-add.
///
/// # Panics
/// Panics if `sequence` is longer than `bases`.
pub fn naive_multiexponentiation<E: MultiexpElement>(
  bases: &[E],
  sequence: &ExponentSequence,
) -> E {
  assert!(sequence.len() <= bases.len());
  (0..sequence.len()).fold(E::identity(), |acc, i| {
    let mut term = E::identity();
    for byte in sequence.exponent(i).iter().rev() {
      for bit in (0..8).rev() {
        term = term.double();
        if (byte >> bit) & 1 == 1 {
          term = term + bases[i];
        }
      }
    }
    acc + term
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    driver::{CpuDriver, ParallelDriver, with_thread_pool},
    field::Element,
  };

  fn elements(values: &[u64]) -> Vec<Element> {
    values.iter().map(|v| Element::from_u64(*v)).collect()
  }

  #[test]
  fn test_digit_spans_bytes() {
    // 0x0f0f: digits of width 6 straddle the byte boundary
    let sequence = ExponentSequence::new(2, vec![0x0f, 0x0f]).unwrap();
    assert_eq!(sequence.digit(0, 0, 6), 0x0f);
    assert_eq!(sequence.digit(0, 1, 6), 0x3c);
    assert_eq!(sequence.digit(0, 2, 6), 0);
    assert_eq!(sequence.digit(0, 9, 6), 0);
    assert_eq!(sequence.num_bits(), 12);
  }

  #[test]
  fn test_from_small() {
    let sequence = ExponentSequence::from_small(&[3u32, 300, 0]);
    assert_eq!(sequence.element_nbytes(), 2);
    assert_eq!(sequence.len(), 3);
    assert_eq!(sequence.exponent(1), &[44, 1]);
    assert_eq!(sequence.num_bits(), 9);

    let zeros = ExponentSequence::from_small(&[0u8, 0]);
    assert_eq!(zeros.element_nbytes(), 1);
    assert_eq!(zeros.num_bits(), 0);
  }

  #[test]
  fn test_new_rejects_bad_width() {
    assert!(matches!(
      ExponentSequence::new(0, vec![]),
      Err(MultiexpError::InvalidExponentWidth { .. })
    ));
    assert!(matches!(
      ExponentSequence::new(4, vec![0; 6]),
      Err(MultiexpError::InvalidExponentWidth { .. })
    ));
  }

  #[test]
  fn test_default_radix_log2() {
    assert_eq!(default_radix_log2(0), 1);
    assert_eq!(default_radix_log2(16), 3);
    assert_eq!(default_radix_log2(1 << 10), 7);
    assert!(default_radix_log2(usize::MAX) <= MAX_RADIX_LOG2);
  }

  #[test]
  fn test_four_bases_two_windows() {
    let bases = elements(&[2, 3, 5, 7]);
    let sequence = ExponentSequence::from_small(&[5u8, 15, 8, 3]);
    let sequences = [sequence];
    let radix_log2 = 2;

    assert_eq!(num_windows(&sequences, radix_log2), 2);
    let powers = build_power_spans(&sequences, 4, 2, radix_log2);
    assert_eq!(powers, vec![vec![0, 1, 3], vec![0, 1, 2]]);

    // gathered: [b0, b1, b3 | b0, b1, b2]
    let table = build_index_table(&sequences, &powers, radix_log2);
    assert_eq!(table.num_buckets(), 6);
    let buckets: Vec<&[usize]> = table.iter().collect();
    let expected: Vec<&[usize]> = vec![&[0], &[], &[1, 2], &[3], &[5], &[4]];
    assert_eq!(buckets, expected);

    let result = compute_multiexponentiation(
      &CpuDriver::new(),
      bases.clone(),
      &sequences,
      radix_log2,
      &[DigitSelector::All],
    )
    .unwrap();
    let expected = Element::from_u64(5 * 2 + 15 * 3 + 8 * 5 + 3 * 7);
    assert_eq!(result, vec![expected]);
    assert_eq!(naive_multiexponentiation(&bases, &sequences[0]), expected);
  }

  #[test]
  fn test_batched_sequences_share_bases() {
    let bases = Element::from_label(b"batched", 6);
    let sequences = [
      ExponentSequence::from_small(&[1u16, 0, 900, 4, 17, 3]),
      ExponentSequence::from_small(&[65535u16, 2]),
      ExponentSequence::from_small(&[0u16; 6]),
    ];
    for radix_log2 in [1, 3, 5] {
      let result = with_thread_pool(|| {
        compute_multiexponentiation(
          &ParallelDriver::new().with_min_parallel_len(0),
          bases.clone(),
          &sequences,
          radix_log2,
          &[DigitSelector::All; 3],
        )
      })
      .unwrap();
      let expected = sequences
        .iter()
        .map(|s| naive_multiexponentiation(&bases, s))
        .collect::<Vec<_>>();
      assert_eq!(result, expected);
      assert_eq!(result[2], Element::ZERO);
    }
  }

  #[test]
  fn test_rejects_malformed_requests() {
    let driver = CpuDriver::new();
    let bases = elements(&[1, 2]);
    let sequences = [ExponentSequence::from_small(&[1u8, 2, 3])];

    let all = [DigitSelector::All];

    assert_eq!(
      compute_multiexponentiation(&driver, bases.clone(), &[], 2, &[]),
      Err(MultiexpError::EmptyExponents)
    );
    assert_eq!(
      compute_multiexponentiation(&driver, bases.clone(), &sequences, 2, &[]),
      Err(MultiexpError::InvalidSelectorLength {
        actual: 0,
        expected: 1
      })
    );
    assert_eq!(
      compute_multiexponentiation(&driver, bases.clone(), &sequences, 0, &all),
      Err(MultiexpError::InvalidRadix {
        radix_log2: 0,
        max: MAX_RADIX_LOG2
      })
    );
    assert_eq!(
      compute_multiexponentiation(&driver, bases.clone(), &sequences, 17, &all),
      Err(MultiexpError::InvalidRadix {
        radix_log2: 17,
        max: MAX_RADIX_LOG2
      })
    );
    assert_eq!(
      compute_multiexponentiation(&driver, bases, &sequences, 2, &all),
      Err(MultiexpError::InvalidInputLength { actual: 3, max: 2 })
    );
  }
}
