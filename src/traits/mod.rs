//! This module defines the traits that elements, input accessors and drivers implement.
use core::{fmt::Debug, ops::Add};

pub mod driver;

pub use driver::MultiexpDriver;

/// Represents an element of the additive group a multiexponentiation runs over.
///
/// Implementations must be deterministic: the same sequence of `add`/`double`
/// calls on the same inputs yields the same representation, so that backends
/// following the same accumulation order produce bit-identical results.
pub trait MultiexpElement:
  Clone + Copy + Debug + Send + Sync + Sized + PartialEq + Add<Output = Self>
{
  /// Returns the identity of the group
  fn identity() -> Self;

  /// Returns `self + self`
  fn double(&self) -> Self;
}

/// Resolves a logical input index to a concrete element.
///
/// Drivers constructed with an accessor call it for every index named by the
/// power spans instead of reading the base array directly, which lets the
/// inputs live in another layout or be materialized on demand.
pub trait InputAccessor<E>: Send + Sync {
  /// Returns the element at `logical_index`; `inputs` is the base array
  /// handed to the driver, which may be empty.
  fn resolve(&self, logical_index: usize, inputs: &[E]) -> E;
}
