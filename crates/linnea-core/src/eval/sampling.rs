//! Seeded subset sampling for partial evaluation runs.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Pick `n` distinct indices from `0..len` with a fixed seed, sorted
/// ascending so samples are visited in dataset order.
///
/// When `n >= len`, returns all indices.
pub fn sample_indices(len: usize, n: usize, seed: u64) -> Vec<usize> {
    if n >= len {
        return (0..len).collect();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut indices = rand::seq::index::sample(&mut rng, len, n).into_vec();
    indices.sort_unstable();
    indices
}
