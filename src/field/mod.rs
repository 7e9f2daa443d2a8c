// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the multiexp project.

//! BLS12-381 base field elements with lazily reduced limbs.
//!
//! [`Element`] stores six 64-bit limbs in Montgomery form (`R = 2^384`).
//! Addition only subtracts the modulus while the sum overflows 384 bits, so
//! a value may sit anywhere in `[0, 2^384)` and is not guaranteed to be
//! canonical. Equality, hashing into bytes and printing always reduce first.
use crate::traits::MultiexpElement;
use core::{
  fmt,
  ops::{Add, AddAssign, Mul, Neg, Sub},
};
use digest::{ExtendableOutput, Update, XofReader};
use num_bigint::BigUint;
use num_traits::Zero;
use sha3::Shake256;
use subtle::{Choice, ConstantTimeEq};

mod limbs;

use limbs::{add_6, gte_6, montgomery_reduce_12, mul_6_by_6_ext, sub_6};

/// Number of bytes in the canonical encoding of an [`Element`].
pub const NUM_BYTES: usize = 48;

/// The field modulus p = 0x1a0111ea...ffffaaab, little-endian limbs.
pub const MODULUS: [u64; 6] = [
  0xb9fe_ffff_ffff_aaab,
  0x1eab_fffe_b153_ffff,
  0x6730_d2a0_f6b0_f624,
  0x6477_4b84_f385_12bf,
  0x4b1b_a7b6_434b_acd7,
  0x1a01_11ea_397f_e69a,
];

/// -p⁻¹ mod 2^64
const INV: u64 = 0x89f3_fffc_fffc_fffd;

/// R = 2^384 mod p
const R: [u64; 6] = [
  0x7609_0000_0002_fffd,
  0xebf4_000b_c40c_0002,
  0x5f48_9857_53c7_58ba,
  0x77ce_5853_7052_5745,
  0x5c07_1a97_a256_ec6d,
  0x15f6_5ec3_fa80_e493,
];

/// R² = 2^768 mod p
const R2: [u64; 6] = [
  0xf4df_1f34_1c34_1746,
  0x0a76_e6a6_09d1_04f1,
  0x8de5_476c_4c95_b6d5,
  0x67eb_88a9_939d_83c0,
  0x9a79_3e85_b519_952d,
  0x1198_8fe5_92ca_e3aa,
];

/// Suffix appended to the text form of an element.
const SUFFIX: &str = "_f12";

/// An element of the BLS12-381 base field in Montgomery form.
///
/// Limbs may hold any value below `2^384`; see the module documentation.
#[derive(Clone, Copy, Default)]
pub struct Element([u64; 6]);

impl Element {
  /// The additive identity.
  pub const ZERO: Self = Self([0; 6]);

  /// The multiplicative identity.
  pub const ONE: Self = Self(R);

  /// Builds an element from raw Montgomery limbs.
  ///
  /// The limbs may exceed the modulus; such values are congruent to their
  /// reduction and compare equal to it.
  pub const fn from_raw_limbs(limbs: [u64; 6]) -> Self {
    Self(limbs)
  }

  /// Returns the raw Montgomery limbs, exactly as stored.
  pub const fn limbs(&self) -> &[u64; 6] {
    &self.0
  }

  /// Converts a small integer into the field.
  pub fn from_u64(value: u64) -> Self {
    Self([value, 0, 0, 0, 0, 0]).mont_mul(&Self(R2))
  }

  /// Returns the unique representative of `self` that is below the modulus.
  pub fn reduce(&self) -> Self {
    let mut limbs = self.0;
    while gte_6(&limbs, &MODULUS) {
      (limbs, _) = sub_6(&limbs, &MODULUS);
    }
    Self(limbs)
  }

  /// Whether the stored limbs are already below the modulus.
  pub fn is_canonical(&self) -> bool {
    !gte_6(&self.0, &MODULUS)
  }

  /// Doubles `self`.
  pub fn double(&self) -> Self {
    *self + *self
  }

  /// Encodes the canonical value as 48 big-endian bytes.
  pub fn to_bytes(&self) -> [u8; NUM_BYTES] {
    let mut wide = [0u64; 12];
    wide[..6].copy_from_slice(&self.0);
    let standard = montgomery_reduce_12(&wide, &MODULUS, INV);

    let mut bytes = [0u8; NUM_BYTES];
    for (chunk, limb) in bytes.chunks_exact_mut(8).zip(standard.iter().rev()) {
      chunk.copy_from_slice(&limb.to_be_bytes());
    }
    bytes
  }

  /// Decodes 48 big-endian bytes.
  ///
  /// Every input decodes: values at or above the modulus are taken modulo p.
  pub fn from_bytes(bytes: &[u8; NUM_BYTES]) -> Self {
    let mut limbs = [0u64; 6];
    for (limb, chunk) in limbs.iter_mut().rev().zip(bytes.chunks_exact(8)) {
      let mut word = [0u8; 8];
      word.copy_from_slice(chunk);
      *limb = u64::from_be_bytes(word);
    }
    Self(limbs).mont_mul(&Self(R2))
  }

  /// Derives `n` deterministic elements from a label using SHAKE256.
  pub fn from_label(label: &[u8], n: usize) -> Vec<Self> {
    let mut shake = Shake256::default();
    shake.update(label);
    let mut reader = shake.finalize_xof();
    (0..n)
      .map(|_| {
        let mut uniform_bytes = [0u8; NUM_BYTES];
        reader.read(&mut uniform_bytes);
        Self::from_bytes(&uniform_bytes)
      })
      .collect()
  }

  fn mont_mul(&self, other: &Self) -> Self {
    let wide = mul_6_by_6_ext(&self.0, &other.0);
    Self(montgomery_reduce_12(&wide, &MODULUS, INV))
  }
}

impl ConstantTimeEq for Element {
  fn ct_eq(&self, other: &Self) -> Choice {
    self.reduce().0[..].ct_eq(&other.reduce().0[..])
  }
}

impl PartialEq for Element {
  fn eq(&self, other: &Self) -> bool {
    bool::from(self.ct_eq(other))
  }
}

impl Eq for Element {}

impl Add for Element {
  type Output = Self;

  fn add(self, rhs: Self) -> Self {
    let (mut sum, mut carry) = add_6(&self.0, &rhs.0);
    // Keep the value below 2^384; it may still be at or above p.
    while carry != 0 {
      let borrow;
      (sum, borrow) = sub_6(&sum, &MODULUS);
      carry -= borrow;
    }
    Self(sum)
  }
}

impl AddAssign for Element {
  fn add_assign(&mut self, rhs: Self) {
    *self = *self + rhs;
  }
}

impl Neg for Element {
  type Output = Self;

  fn neg(self) -> Self {
    let reduced = self.reduce();
    if reduced.0 == [0; 6] {
      return reduced;
    }
    let (limbs, _) = sub_6(&MODULUS, &reduced.0);
    Self(limbs)
  }
}

impl Sub for Element {
  type Output = Self;

  fn sub(self, rhs: Self) -> Self {
    self + (-rhs)
  }
}

impl Mul for Element {
  type Output = Self;

  fn mul(self, rhs: Self) -> Self {
    self.mont_mul(&rhs)
  }
}

impl Zero for Element {
  fn zero() -> Self {
    Self::ZERO
  }

  fn is_zero(&self) -> bool {
    *self == Self::ZERO
  }
}

impl MultiexpElement for Element {
  fn identity() -> Self {
    Self::ZERO
  }

  fn double(&self) -> Self {
    Element::double(self)
  }
}

impl fmt::Display for Element {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let digits = BigUint::from_bytes_be(&self.to_bytes()).to_str_radix(16);
    write!(f, "0x{digits}{SUFFIX}")
  }
}

impl fmt::Debug for Element {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(self, f)
  }
}
