//! Uniform sampling helpers

use rand::seq::index;
use rand::Rng;

/// Pick `amount` items uniformly without replacement, keeping input order.
///
/// When `items` holds no more than `amount` entries all of them are returned.
pub fn sample_preserving_order<T: Clone, R: Rng + ?Sized>(items: &[T], amount: usize, rng: &mut R) -> Vec<T> {
    if items.len() <= amount {
        return items.to_vec();
    }

    let mut picked = index::sample(rng, items.len(), amount).into_vec();
    picked.sort_unstable();
    picked.into_iter().map(|i| items[i].clone()).collect()
}
