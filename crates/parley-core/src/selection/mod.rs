//! Weighted random response selection.
//!
//! Both matching tiers and the general fallback pick a response the same way:
//! each option is chosen with probability `weight / total`, where negative and
//! non-finite weights count as zero. Selection never fails. An empty pool
//! yields [`EMPTY_POOL_RESPONSE`] and a pool whose weights sum to zero yields
//! its first option.

use rand::Rng;

use crate::types::ResponseOption;

/// Returned when a response pool has no options at all.
pub const EMPTY_POOL_RESPONSE: &str = "...";

/// Pick a response from `pool` using the thread-local RNG.
pub fn select(pool: &[ResponseOption]) -> String {
    let mut rng = rand::thread_rng();
    select_with_rng(&mut rng, pool)
}

/// Pick a response from `pool` with a provided RNG.
///
/// Useful for reproducible testing.
pub fn select_with_rng<R: Rng>(rng: &mut R, pool: &[ResponseOption]) -> String {
    let (first, last) = match (pool.first(), pool.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return EMPTY_POOL_RESPONSE.to_string(),
    };

    let total: f64 = pool.iter().map(|o| effective_weight(o.probability)).sum();
    if !total.is_finite() || total <= 0.0 {
        return first.response.clone();
    }

    // gen::<f64>() is in [0, 1), so the draw is in [0, total)
    let draw = rng.gen::<f64>() * total;
    let mut cumulative = 0.0;
    for option in pool {
        cumulative += effective_weight(option.probability);
        if cumulative > draw {
            return option.response.clone();
        }
    }

    // Rounding left the draw at or past the accumulated total.
    last.response.clone()
}

fn effective_weight(probability: f64) -> f64 {
    if probability.is_finite() {
        probability.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seeded_rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn make_pool(options: &[(f64, &str)]) -> Vec<ResponseOption> {
        options
            .iter()
            .map(|(p, r)| ResponseOption::new(*p, *r))
            .collect()
    }

    #[test]
    fn test_distribution_matches_weights() {
        let pool = make_pool(&[(0.4, "A"), (0.6, "B")]);
        let mut rng = seeded_rng();

        let draws = 10_000;
        let a_count = (0..draws)
            .filter(|_| select_with_rng(&mut rng, &pool) == "A")
            .count();
        let freq = a_count as f64 / draws as f64;

        assert!(
            (freq - 0.4).abs() < 0.03,
            "Frequency of A should be close to 0.4, got {}",
            freq
        );
    }

    #[test]
    fn test_unnormalized_weights() {
        let pool = make_pool(&[(1.0, "rare"), (3.0, "common")]);
        let mut rng = seeded_rng();

        let common = (0..4000)
            .filter(|_| select_with_rng(&mut rng, &pool) == "common")
            .count();
        let freq = common as f64 / 4000.0;
        assert!((freq - 0.75).abs() < 0.03, "got {}", freq);
    }

    #[test]
    fn test_empty_pool_returns_sentinel() {
        assert_eq!(select(&[]), EMPTY_POOL_RESPONSE);
    }

    #[test]
    fn test_zero_total_returns_first() {
        let pool = make_pool(&[(0.0, "first"), (0.0, "second")]);
        let mut rng = seeded_rng();
        for _ in 0..100 {
            assert_eq!(select_with_rng(&mut rng, &pool), "first");
        }
    }

    #[test]
    fn test_negative_and_nan_weights_are_ignored() {
        let pool = make_pool(&[(-5.0, "negative"), (f64::NAN, "nan"), (0.5, "valid")]);
        let mut rng = seeded_rng();
        for _ in 0..200 {
            assert_eq!(select_with_rng(&mut rng, &pool), "valid");
        }
    }

    #[test]
    fn test_infinite_weight_does_not_panic() {
        let pool = make_pool(&[(f64::INFINITY, "inf"), (1.0, "finite")]);
        assert_eq!(select(&pool), "finite");

        // Sum overflows to infinity
        let overflow = make_pool(&[(f64::MAX, "big-1"), (f64::MAX, "big-2")]);
        assert_eq!(select(&overflow), "big-1");
    }

    #[test]
    fn test_zero_weight_never_chosen_when_others_positive() {
        let pool = make_pool(&[(0.0, "never"), (1.0, "always")]);
        let mut rng = seeded_rng();
        for _ in 0..500 {
            assert_eq!(select_with_rng(&mut rng, &pool), "always");
        }
    }

    #[test]
    fn test_single_option() {
        let pool = make_pool(&[(0.4, "Hail, traveler.")]);
        for _ in 0..50 {
            assert_eq!(select(&pool), "Hail, traveler.");
        }
    }
}
