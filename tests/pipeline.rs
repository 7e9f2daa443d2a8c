use multiexp::{
  CpuDriver, DigitSelector, ExponentSequence, MultiexpDriver, ParallelDriver,
  accessor::{LazyInputs, RemappedInputs},
  compute_multiexponentiation,
  field::{Element, NUM_BYTES},
  pippenger::{naive_multiexponentiation, num_windows},
  traits::MultiexpElement,
};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

fn init_logging() {
  let _ = tracing_subscriber::fmt()
    .with_target(false)
    .with_env_filter(EnvFilter::from_default_env())
    .try_init();
}

fn with_thread_pool<R: Send>(f: impl FnOnce() -> R + Send) -> R {
  rayon::ThreadPoolBuilder::new()
    .num_threads(4)
    .build()
    .unwrap()
    .install(f)
}

fn random_element(rng: &mut StdRng) -> Element {
  let mut bytes = [0u8; NUM_BYTES];
  rng.fill(&mut bytes[..]);
  Element::from_bytes(&bytes)
}

fn random_sequence(rng: &mut StdRng, n: usize, element_nbytes: usize) -> ExponentSequence {
  let data = (0..n * element_nbytes).map(|_| rng.r#gen::<u8>()).collect();
  ExponentSequence::new(element_nbytes, data).unwrap()
}

fn run<D: MultiexpDriver<Element>>(
  driver: &D,
  bases: &[Element],
  sequences: &[ExponentSequence],
  radix_log2: usize,
  selector: DigitSelector,
) -> Vec<Element> {
  let selectors = vec![selector; sequences.len()];
  compute_multiexponentiation(driver, bases.to_vec(), sequences, radix_log2, &selectors).unwrap()
}

#[test]
fn zero_exponents_give_identity() {
  init_logging();
  let bases = Element::from_label(b"zeros", 8);
  let sequences = [ExponentSequence::from_small(&[0u32; 8])];

  let all = run(&CpuDriver::new(), &bases, &sequences, 4, DigitSelector::All);
  assert_eq!(all, vec![Element::ZERO]);

  // no significant bits still leaves one window
  let per_digit = run(&CpuDriver::new(), &bases, &sequences, 4, DigitSelector::PerDigit);
  assert_eq!(per_digit, vec![Element::ZERO]);
}

#[test]
fn printing() {
  assert_eq!(Element::ZERO.to_string(), "0x0_f12");
  assert_eq!(Element::from_u64(0xabc).to_string(), "0xabc_f12");

  let mut rng = StdRng::seed_from_u64(11);
  for _ in 0..32 {
    let e = random_element(&mut rng);
    let encoded = hex::encode(e.to_bytes());
    let digits = match encoded.trim_start_matches('0') {
      "" => "0",
      digits => digits,
    };
    assert_eq!(format!("{e}"), format!("0x{digits}_f12"));
    assert_eq!(format!("{e:?}"), format!("{e}"));
  }
}

proptest! {
  #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]

  #[test]
  fn matches_naive(
    n in 1usize..=16,
    radix_index in 0usize..3,
    element_nbytes in 1usize..=48,
    seed in any::<u64>(),
  ) {
    init_logging();
    let radix_log2 = [1, 4, 8][radix_index];
    let mut rng = StdRng::seed_from_u64(seed);
    let bases = (0..n).map(|_| random_element(&mut rng)).collect::<Vec<_>>();
    let sequences = [
      random_sequence(&mut rng, n, element_nbytes),
      random_sequence(&mut rng, n / 2, 2),
    ];

    let outputs = run(&CpuDriver::new(), &bases, &sequences, radix_log2, DigitSelector::All);
    prop_assert_eq!(outputs.len(), 2);
    for (output, sequence) in outputs.iter().zip(sequences.iter()) {
      prop_assert_eq!(*output, naive_multiexponentiation(&bases, sequence));
    }
  }

  #[test]
  fn backends_bit_identical(
    n in 1usize..=96,
    radix_log2 in 1usize..=8,
    num_sequences in 1usize..=3,
    per_digit in any::<bool>(),
    seed in any::<u64>(),
  ) {
    let mut rng = StdRng::seed_from_u64(seed);
    let bases = (0..n).map(|_| random_element(&mut rng)).collect::<Vec<_>>();
    let sequences = (0..num_sequences)
      .map(|k| random_sequence(&mut rng, n - k.min(n - 1), 8 + 8 * k))
      .collect::<Vec<_>>();
    let selector = if per_digit { DigitSelector::PerDigit } else { DigitSelector::All };

    let cpu = run(&CpuDriver::new(), &bases, &sequences, radix_log2, selector);
    let parallel = with_thread_pool(|| {
      run(
        &ParallelDriver::new().with_min_parallel_len(0),
        &bases,
        &sequences,
        radix_log2,
        selector,
      )
    });

    let cpu_limbs = cpu.iter().map(|e| *e.limbs()).collect::<Vec<_>>();
    let parallel_limbs = parallel.iter().map(|e| *e.limbs()).collect::<Vec<_>>();
    prop_assert_eq!(cpu_limbs, parallel_limbs);
  }

  #[test]
  fn per_digit_values_recombine(
    n in 1usize..=24,
    radix_log2 in 1usize..=6,
    seed in any::<u64>(),
  ) {
    let mut rng = StdRng::seed_from_u64(seed);
    let bases = (0..n).map(|_| random_element(&mut rng)).collect::<Vec<_>>();
    let sequences = [random_sequence(&mut rng, n, 4)];
    let windows = num_windows(&sequences, radix_log2);

    let all = run(&CpuDriver::new(), &bases, &sequences, radix_log2, DigitSelector::All);
    let per_digit = run(&CpuDriver::new(), &bases, &sequences, radix_log2, DigitSelector::PerDigit);
    prop_assert_eq!(per_digit.len(), windows);

    // Σ_i 2^(r·i) · PerDigit_i
    let recombined = per_digit.iter().rev().fold(Element::ZERO, |acc, value| {
      let shifted = (0..radix_log2).fold(acc, |acc, _| MultiexpElement::double(&acc));
      shifted + *value
    });
    prop_assert_eq!(all, vec![recombined]);
  }

  #[test]
  fn accessors_end_to_end(n in 1usize..=32, radix_log2 in 1usize..=5, seed in any::<u64>()) {
    let mut rng = StdRng::seed_from_u64(seed);
    let sequences = [random_sequence(&mut rng, n, 3)];
    let materialized = (0..n).map(|i| Element::from_u64(3 * i as u64 + 1)).collect::<Vec<_>>();
    let expected = naive_multiexponentiation(&materialized, &sequences[0]);

    let lazy = LazyInputs::new(|i: usize| Element::from_u64(3 * i as u64 + 1));
    let outputs = run(
      &CpuDriver::<Element>::with_input_accessor(&lazy),
      &[],
      &sequences,
      radix_log2,
      DigitSelector::All,
    );
    prop_assert_eq!(outputs, vec![expected]);

    // bases stored in reverse order
    let reversed = materialized.iter().rev().copied().collect::<Vec<_>>();
    let remap = RemappedInputs::new((0..n).rev().collect());
    let outputs = with_thread_pool(|| {
      run(
        &ParallelDriver::<Element>::with_input_accessor(&remap).with_min_parallel_len(0),
        &reversed,
        &sequences,
        radix_log2,
        DigitSelector::All,
      )
    });
    prop_assert_eq!(outputs, vec![expected]);
  }
}
