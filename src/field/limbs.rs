// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the multiexp project.

//! Limb arithmetic for 6-limb (384-bit) integers.
//!
//! Limbs are stored in little-endian order: `limbs[0]` is the least significant.

/// Add with carry: a + b + carry → (sum, carry_out)
#[inline(always)]
pub(crate) fn adc(a: u64, b: u64, carry: u64) -> (u64, u64) {
  let sum = (a as u128) + (b as u128) + (carry as u128);
  (sum as u64, (sum >> 64) as u64)
}

/// Subtract with borrow: a - b - borrow → (difference, borrow_out)
#[inline(always)]
pub(crate) fn sbb(a: u64, b: u64, borrow: u64) -> (u64, u64) {
  let (d1, b1) = a.overflowing_sub(b);
  let (d2, b2) = d1.overflowing_sub(borrow);
  (d2, (b1 as u64) + (b2 as u64))
}

/// Multiply-accumulate: acc + a * b + carry → (low, high)
#[inline(always)]
pub(crate) fn mac(acc: u64, a: u64, b: u64, carry: u64) -> (u64, u64) {
  let prod = (a as u128) * (b as u128) + (acc as u128) + (carry as u128);
  (prod as u64, (prod >> 64) as u64)
}

/// a + b, returning the 384-bit sum and the carry out of the top limb.
#[inline(always)]
pub(crate) fn add_6(a: &[u64; 6], b: &[u64; 6]) -> ([u64; 6], u64) {
  let mut out = [0u64; 6];
  let mut carry = 0u64;
  for i in 0..6 {
    (out[i], carry) = adc(a[i], b[i], carry);
  }
  (out, carry)
}

/// a - b, returning the wrapped difference and the borrow out of the top limb.
#[inline(always)]
pub(crate) fn sub_6(a: &[u64; 6], b: &[u64; 6]) -> ([u64; 6], u64) {
  let mut out = [0u64; 6];
  let mut borrow = 0u64;
  for i in 0..6 {
    (out[i], borrow) = sbb(a[i], b[i], borrow);
  }
  (out, borrow)
}

/// Check if 6-limb value a >= 6-limb value b.
#[inline(always)]
pub(crate) fn gte_6(a: &[u64; 6], b: &[u64; 6]) -> bool {
  for i in (0..6).rev() {
    if a[i] > b[i] {
      return true;
    }
    if a[i] < b[i] {
      return false;
    }
  }
  true
}

/// Multiply two 6-limb values, producing a 12-limb result.
#[inline(always)]
pub(crate) fn mul_6_by_6_ext(a: &[u64; 6], b: &[u64; 6]) -> [u64; 12] {
  let mut result = [0u64; 12];
  for i in 0..6 {
    let mut carry = 0u64;
    for j in 0..6 {
      (result[i + j], carry) = mac(result[i + j], a[i], b[j], carry);
    }
    result[i + 6] = carry;
  }
  result
}

/// Montgomery REDC of a 12-limb value: T × R⁻¹ mod p, with R = 2^384.
///
/// The result is fully reduced into `[0, p)` for any 12-limb input.
#[inline]
pub(crate) fn montgomery_reduce_12(t: &[u64; 12], modulus: &[u64; 6], inv: u64) -> [u64; 6] {
  // One extra limb tracks the overflow of the running sum.
  let mut r = [0u64; 13];
  r[..12].copy_from_slice(t);

  for i in 0..6 {
    let q = r[i].wrapping_mul(inv);

    let mut carry = 0u64;
    for j in 0..6 {
      (r[i + j], carry) = mac(r[i + j], q, modulus[j], carry);
    }
    for item in r[(i + 6)..13].iter_mut() {
      (*item, carry) = adc(*item, 0, carry);
      if carry == 0 {
        break;
      }
    }
  }

  let mut result = [r[6], r[7], r[8], r[9], r[10], r[11]];
  let mut top = r[12];
  while top > 0 || gte_6(&result, modulus) {
    let borrow;
    (result, borrow) = sub_6(&result, modulus);
    top -= borrow;
  }
  result
}
