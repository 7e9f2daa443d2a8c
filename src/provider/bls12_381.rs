// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the multiexp project.

//! BLS12-381 G1 points as multiexponentiation elements.
use crate::{
  buffer::DigitSelector,
  errors::MultiexpError,
  pippenger::{ExponentSequence, compute_multiexponentiation, default_radix_log2},
  traits::{MultiexpDriver, MultiexpElement},
};
use group::Group;
use halo2curves::bls12381::{G1, G1Affine};

/// Re-exports of the BLS12-381 G1 types used with this backend
pub mod g1 {
  pub use halo2curves::bls12381::{Fq as Base, Fr as Scalar, G1 as Point, G1Affine as Affine};
}

impl MultiexpElement for G1 {
  fn identity() -> Self {
    <G1 as Group>::identity()
  }

  fn double(&self) -> Self {
    Group::double(self)
  }
}

/// Computes `Σ_i scalars[i] · bases[i]` over G1 with `driver`, using the
/// default digit width for `scalars.len()`.
pub fn msm<D: MultiexpDriver<G1>>(
  driver: &D,
  scalars: &[g1::Scalar],
  bases: &[G1Affine],
) -> Result<G1, MultiexpError> {
  let sequences = [ExponentSequence::from_scalars(scalars)];
  let points = bases.iter().map(|b| G1::from(*b)).collect();
  let outputs = compute_multiexponentiation(
    driver,
    points,
    &sequences,
    default_radix_log2(scalars.len()),
    &[DigitSelector::All],
  )?;
  Ok(outputs[0])
}
