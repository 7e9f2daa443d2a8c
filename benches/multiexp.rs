use criterion::{Criterion, criterion_group, criterion_main};
use ff::Field;
use group::Group;
use halo2curves::bls12381::{Fr, G1};
use multiexp::{
  CpuDriver, DigitSelector, ExponentSequence, ParallelDriver, compute_multiexponentiation,
  field::Element, pippenger::default_radix_log2,
};

fn benchmarks_field_elements(c: &mut Criterion) {
  let mut group = c.benchmark_group("multiexp_f12");
  (8..=16).step_by(4).for_each(|i| {
    let n = 1usize << i;
    let bases = Element::from_label(b"bench", n);
    let scalars: Vec<Fr> = (0..n)
      .map(|_| Fr::random(&mut rand::thread_rng()))
      .collect();
    let sequences = [ExponentSequence::from_scalars(&scalars)];
    let radix_log2 = default_radix_log2(n);

    group.bench_function(format!("cpu/2^{i}"), |b| {
      b.iter(|| {
        compute_multiexponentiation(
          &CpuDriver::new(),
          bases.clone(),
          &sequences,
          radix_log2,
          &[DigitSelector::All],
        )
      });
    });
    group.bench_function(format!("parallel/2^{i}"), |b| {
      b.iter(|| {
        compute_multiexponentiation(
          &ParallelDriver::new(),
          bases.clone(),
          &sequences,
          radix_log2,
          &[DigitSelector::All],
        )
      });
    });
  });
}

fn benchmarks_g1(c: &mut Criterion) {
  let mut group = c.benchmark_group("multiexp_g1");
  group.sample_size(10);
  (8..=12).step_by(2).for_each(|i| {
    let n = 1usize << i;
    let bases: Vec<G1> = (0..n).map(|_| G1::random(&mut rand::thread_rng())).collect();
    let scalars: Vec<Fr> = (0..n)
      .map(|_| Fr::random(&mut rand::thread_rng()))
      .collect();
    let sequences = [ExponentSequence::from_scalars(&scalars)];
    let radix_log2 = default_radix_log2(n);

    group.bench_function(format!("parallel/2^{i}"), |b| {
      b.iter(|| {
        compute_multiexponentiation(
          &ParallelDriver::new(),
          bases.clone(),
          &sequences,
          radix_log2,
          &[DigitSelector::All],
        )
      });
    });
  });
}

criterion_group!(benches, benchmarks_field_elements, benchmarks_g1);
criterion_main!(benches);
