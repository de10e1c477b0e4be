//! ==============================================================================================
//! ============================ Multivariate Hypergeometric Sampling =============================
//! ==============================================================================================
//!
//! An event selects a subset of `n` (or `round(proportion * total)`)
//! individuals from a set of labeled compartments, without replacement, such
//! that compartment totals are preserved in expectation. A draw across
//! several compartments is a multivariate
//! hypergeometric distribution; it is realized here as a sequence of
//! univariate hypergeometric draws — at each compartment, draw how many of
//! the remaining selections come from it, then recurse on what's left. This
//! is the standard reduction from multivariate to univariate hypergeometric
//! sampling.

use rand::RngCore;
use rand_distr::{Distribution, Hypergeometric};

/// Draw `ndraw` individuals (capped at the total across `counts`) from the
/// compartments in `counts`, returning how many were drawn from each.
/// `counts[i]` must be non-negative.
pub fn sample_multivariate_hypergeometric<R: RngCore + ?Sized>(
    counts: &[i32],
    ndraw: u32,
    rng: &mut R,
) -> Vec<i32> {
    let mut remaining_total: u64 = counts.iter().map(|&c| c.max(0) as u64).sum();
    let mut ndraw = (ndraw as u64).min(remaining_total);
    let mut drawn = vec![0i32; counts.len()];

    for (i, &c) in counts.iter().enumerate() {
        if ndraw == 0 {
            break;
        }
        let c = c.max(0) as u64;
        if i + 1 == counts.len() {
            // Last compartment: everything left over must come from here.
            drawn[i] = ndraw.min(c) as i32;
            break;
        }
        let take = if remaining_total == 0 {
            0
        } else if c == 0 {
            0
        } else {
            // population = remaining_total, successes = c, draws = ndraw
            match Hypergeometric::new(remaining_total, c, ndraw) {
                Ok(dist) => dist.sample(rng),
                Err(_) => 0,
            }
        };
        drawn[i] = take as i32;
        ndraw -= take;
        remaining_total -= c;
    }

    drawn
}

/// Resolve how many individuals an event should move: verbatim `n` if
/// `proportion <= 0`, otherwise `round(proportion * total)`.
#[inline]
pub fn resolve_draw_count(n: u32, proportion: f64, total: i64) -> u32 {
    if proportion > 0.0 {
        ((proportion * total as f64).round().max(0.0)) as u32
    } else {
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn preserves_total_drawn() {
        let mut rng = SmallRng::seed_from_u64(1);
        let counts = [10, 20, 0, 5];
        let drawn = sample_multivariate_hypergeometric(&counts, 7, &mut rng);
        assert_eq!(drawn.iter().sum::<i32>(), 7);
        for (d, c) in drawn.iter().zip(counts.iter()) {
            assert!(*d <= *c);
        }
    }

    #[test]
    fn caps_at_available_total() {
        let mut rng = SmallRng::seed_from_u64(2);
        let counts = [1, 1];
        let drawn = sample_multivariate_hypergeometric(&counts, 100, &mut rng);
        assert_eq!(drawn.iter().sum::<i32>(), 2);
    }

    #[test]
    fn resolve_count_uses_proportion_when_positive() {
        assert_eq!(resolve_draw_count(5, 0.5, 10), 5);
        assert_eq!(resolve_draw_count(5, 0.0, 10), 5);
    }
}
