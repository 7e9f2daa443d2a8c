//! This module defines errors returned by the library.
use thiserror::Error;

/// Errors returned when a multiexponentiation request is malformed.
///
/// Drivers never return these: requests are validated before any phase runs.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum MultiexpError {
  /// returned if the digit width is zero or too large
  #[error("InvalidRadix: {radix_log2} is not in 1..={max}")]
  InvalidRadix {
    /// The requested digit width in bits
    radix_log2: usize,
    /// The largest supported digit width
    max: usize,
  },
  /// returned if an exponent sequence is longer than the supplied bases
  #[error("InvalidInputLength: {actual} exponents for {max} bases")]
  InvalidInputLength {
    /// The length of the offending exponent sequence
    actual: usize,
    /// The number of bases available
    max: usize,
  },
  /// returned if no exponent sequence is supplied
  #[error("EmptyExponents")]
  EmptyExponents,
  /// returned if the number of digit selectors differs from the number of sequences
  #[error("InvalidSelectorLength: {actual} selectors for {expected} sequences")]
  InvalidSelectorLength {
    /// The number of selectors supplied
    actual: usize,
    /// The number of exponent sequences
    expected: usize,
  },
  /// returned if exponent bytes do not split into elements of the declared width
  #[error("InvalidExponentWidth: {reason}")]
  InvalidExponentWidth {
    /// The reason the width is invalid
    reason: String,
  },
}
