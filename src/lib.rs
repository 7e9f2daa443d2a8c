//! This library implements multi-exponentiation with the bucket (Pippenger) method.
//! The computation is split into three phases behind a driver trait, so that
//! interchangeable backends (single-threaded, rayon) produce bit-identical results.
#![deny(
  warnings,
  unused,
  future_incompatible,
  nonstandard_style,
  rust_2018_idioms,
  missing_docs
)]
#![allow(clippy::type_complexity)]
#![forbid(unsafe_code)]

// public modules
pub mod accessor;
pub mod buffer;
pub mod driver;
pub mod errors;
pub mod field;
pub mod index_table;
pub mod pippenger;
pub mod provider;
pub mod traits;

/// Start a span + timer, return `(Span, Instant)`.
macro_rules! start_span {
    ($name:expr $(, $($fmt:tt)+)?) => {{
        let span       = info_span!($name $(, $($fmt)+)?);
        let span_clone = span.clone();    // lives as long as the guard
        let _guard      = span_clone.enter();
        (span, Instant::now())
    }};
}
pub(crate) use start_span;

pub use buffer::{DigitSelector, MultiexpBuffer};
pub use driver::{CpuDriver, ParallelDriver};
pub use errors::MultiexpError;
pub use pippenger::{ExponentSequence, compute_multiexponentiation};
pub use traits::{InputAccessor, MultiexpDriver, MultiexpElement};
