// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the multiexp project.

//! Ristretto255 points as multiexponentiation elements.
use crate::{
  buffer::DigitSelector,
  errors::MultiexpError,
  pippenger::{ExponentSequence, compute_multiexponentiation, default_radix_log2},
  traits::{MultiexpDriver, MultiexpElement},
};
use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar, traits::Identity};

/// Size of a canonical scalar encoding in bytes.
const SCALAR_NBYTES: usize = 32;

impl MultiexpElement for RistrettoPoint {
  fn identity() -> Self {
    <RistrettoPoint as Identity>::identity()
  }

  fn double(&self) -> Self {
    self + self
  }
}

/// Exponents given as Ristretto scalars, stored as their little-endian encoding.
pub fn exponents(scalars: &[Scalar]) -> Result<ExponentSequence, MultiexpError> {
  ExponentSequence::new(
    SCALAR_NBYTES,
    scalars.iter().flat_map(Scalar::to_bytes).collect(),
  )
}

/// Computes `Σ_i scalars[i] · points[i]` with `driver`, using the default
/// digit width for `scalars.len()`.
pub fn msm<D: MultiexpDriver<RistrettoPoint>>(
  driver: &D,
  scalars: &[Scalar],
  points: &[RistrettoPoint],
) -> Result<RistrettoPoint, MultiexpError> {
  let sequences = [exponents(scalars)?];
  let outputs = compute_multiexponentiation(
    driver,
    points.to_vec(),
    &sequences,
    default_radix_log2(scalars.len()),
    &[DigitSelector::All],
  )?;
  Ok(outputs[0])
}
