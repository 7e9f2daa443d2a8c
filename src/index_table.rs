//! Compressed storage for the multiproduct index table.
//!
//! The table is an ordered list of buckets, each an ordered list of
//! positions into the rearranged input buffer. It is stored in compressed
//! sparse row form:
//! - `offsets[b]..offsets[b+1]` defines the entries of bucket b
//! - `entries` contains all positions back-to-back
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Ordered buckets of buffer positions whose elements are summed together.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexTable {
  offsets: Vec<usize>,
  entries: Vec<usize>,
}

impl Default for IndexTable {
  fn default() -> Self {
    Self::new()
  }
}

impl IndexTable {
  /// Create an empty table.
  pub fn new() -> Self {
    Self::with_capacity(0, 0)
  }

  /// Create an empty table with pre-allocated capacity.
  ///
  /// # Arguments
  /// * `num_buckets` - Expected number of buckets
  /// * `total_entries` - Expected total entries across all buckets
  pub fn with_capacity(num_buckets: usize, total_entries: usize) -> Self {
    let mut offsets = Vec::with_capacity(num_buckets + 1);
    offsets.push(0);
    Self {
      offsets,
      entries: Vec::with_capacity(total_entries),
    }
  }

  /// Builds a table from explicit buckets.
  pub fn from_buckets<B: AsRef<[usize]>>(buckets: impl IntoIterator<Item = B>) -> Self {
    let mut table = Self::new();
    for bucket in buckets {
      table.push_bucket(bucket.as_ref());
    }
    table
  }

  /// Append a new bucket with the given positions.
  pub fn push_bucket(&mut self, positions: &[usize]) {
    self.entries.extend_from_slice(positions);
    self.offsets.push(self.entries.len());
  }

  /// Appends `num_groups` buckets filled from `(group, position)` pairs.
  ///
  /// Pairs are distributed with a counting sort, so each bucket keeps the
  /// positions in the order the iterator yields them.
  pub fn push_grouped<I>(&mut self, num_groups: usize, items: I)
  where
    I: IntoIterator<Item = (usize, usize)>,
    I::IntoIter: Clone,
  {
    let items = items.into_iter();
    let base = self.entries.len();

    let mut counts = vec![0usize; num_groups];
    for (group, _) in items.clone() {
      counts[group] += 1;
    }

    let mut cursors = Vec::with_capacity(num_groups);
    let mut end = base;
    for count in counts {
      cursors.push(end);
      end += count;
      self.offsets.push(end);
    }

    self.entries.resize(end, 0);
    for (group, position) in items {
      self.entries[cursors[group]] = position;
      cursors[group] += 1;
    }
  }

  /// Number of buckets.
  #[inline]
  pub fn num_buckets(&self) -> usize {
    self.offsets.len() - 1
  }

  /// Total number of positions across all buckets.
  #[inline]
  pub fn num_entries(&self) -> usize {
    self.entries.len()
  }

  /// Largest position referenced by any bucket.
  pub fn max_position(&self) -> Option<usize> {
    self.entries.iter().copied().max()
  }

  /// Iterate over all buckets in table order.
  pub fn iter(&self) -> impl Iterator<Item = &[usize]> + '_ {
    (0..self.num_buckets()).map(move |b| &self[b])
  }
}

impl Index<usize> for IndexTable {
  type Output = [usize];

  #[inline]
  fn index(&self, b: usize) -> &Self::Output {
    &self.entries[self.offsets[b]..self.offsets[b + 1]]
  }
}
