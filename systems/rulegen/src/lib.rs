#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic seed-to-rule-matrix generation.
//!
//! The generator is a pure function of `(seed, size)`. Each call constructs
//! its own ChaCha stream, so regeneration is bit-identical no matter what
//! other generators have run in between. Sharing a process-wide generator
//! here would silently break the validation engine's determinism contract.

use duelforge_core::{Matrix, RuleMatrix};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Generates the square rule matrix for a candidate seed.
///
/// Draws `size * size` uniform values in `[-1, 1]` in row-major order from a
/// ChaCha stream seeded by `seed`.
#[must_use]
pub fn generate(seed: i64, size: usize) -> RuleMatrix {
    let mut rng = ChaCha8Rng::seed_from_u64(seed as u64);
    let cells = (0..size * size)
        .map(|_| rng.gen::<f64>() * 2.0 - 1.0)
        .collect();
    let matrix =
        Matrix::from_values(size, size, cells).expect("generator draws exactly size * size cells");
    RuleMatrix::new(matrix).expect("generated matrix is square by construction")
}
