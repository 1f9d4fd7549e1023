use rand::{rngs::StdRng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Create a [`StdRng`] seeded from the `SEED` environment variable.
///
/// Each call uses a unique seed derived from the base seed and an
/// incrementing counter, so every layer gets a distinct but reproducible
/// weight stream.
pub fn rng_from_env() -> StdRng {
    let base = std::env::var("SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    let idx = COUNTER.fetch_add(1, Ordering::SeqCst);
    StdRng::seed_from_u64(layer_seed(base, idx))
}

// Seeds wrap so that any `SEED` value is accepted.
fn layer_seed(base: u64, idx: u64) -> u64 {
    base.wrapping_add(idx)
}

/// Deterministic generator for a fixed seed (dataset splits, shuffling).
pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn layer_seed_wraps_near_u64_max() {
        assert_eq!(layer_seed(u64::MAX, 0), u64::MAX);
        assert_eq!(layer_seed(u64::MAX, 1), 0);
        assert_eq!(layer_seed(u64::MAX - 1, 5), 3);
        assert_eq!(layer_seed(7, 3), 10);
    }

    #[test]
    fn seeded_is_reproducible() {
        let a: u64 = seeded(42).gen();
        let b: u64 = seeded(42).gen();
        assert_eq!(a, b);
    }
}
