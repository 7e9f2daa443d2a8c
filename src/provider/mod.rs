//! Curve backends for the bucket pipeline.
pub mod bls12_381;
pub mod ristretto;
