// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Splits encoded samples into two sets:
//   - Training set:   used to update model weights
//   - Validation set: used for the early-stopping signal
//
// Two strategies, both deterministic for a fixed input order:
//
//   Tail      — the last `validation_split` fraction is held out
//               and nothing is reordered. With 6 samples and a
//               split of 0.2: floor(6 * 0.8) = 4 train, 2 validation.
//
//   Shuffled  — a seeded Fisher-Yates shuffle first, then the
//               same tail split. Same seed → same partition.
//
// Reference: rand crate documentation (SeedableRng, SliceRandom)

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};

/// How samples are assigned to the validation set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SplitStrategy {
    /// Hold out the tail of the data in its given order.
    #[default]
    Tail,
    /// Shuffle with the given seed, then hold out the tail.
    Shuffled { seed: u64 },
}

/// Split `samples` into (train, validation).
///
/// `validation_split` is the held-out fraction, e.g. 0.2 = 20%.
pub fn split_train_val<T>(
    mut samples: Vec<T>,
    validation_split: f64,
    strategy: SplitStrategy,
) -> (Vec<T>, Vec<T>) {
    if let SplitStrategy::Shuffled { seed } = strategy {
        let mut rng = StdRng::seed_from_u64(seed);
        samples.shuffle(&mut rng);
    }

    let total = samples.len();
    let split_at = ((total as f64) * (1.0 - validation_split)).floor() as usize;
    let split_at = split_at.min(total);

    // After this: samples = [0..split_at], val = [split_at..total]
    let val = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split ({:?}): {} training, {} validation",
        strategy,
        samples.len(),
        val.len(),
    );

    (samples, val)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_split_holds_out_the_end() {
        let items: Vec<usize> = (0..6).collect();
        let (train, val) = split_train_val(items, 0.2, SplitStrategy::Tail);
        assert_eq!(train, vec![0, 1, 2, 3]);
        assert_eq!(val, vec![4, 5]);
    }

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let (train, val) = split_train_val(items, 0.2, SplitStrategy::Tail);
        assert_eq!(train.len(), 80);
        assert_eq!(val.len(), 20);
    }

    #[test]
    fn test_shuffled_split_is_reproducible() {
        let items: Vec<usize> = (0..50).collect();
        let strategy = SplitStrategy::Shuffled { seed: 7 };
        let first = split_train_val(items.clone(), 0.3, strategy);
        let second = split_train_val(items, 0.3, strategy);
        assert_eq!(first, second);
        assert_eq!(first.0.len() + first.1.len(), 50);
    }

    #[test]
    fn test_zero_split_keeps_everything_for_training() {
        let items: Vec<usize> = (0..10).collect();
        let (train, val) = split_train_val(items, 0.0, SplitStrategy::Tail);
        assert_eq!(train.len(), 10);
        assert!(val.is_empty());
    }

    #[test]
    fn test_empty_dataset() {
        let items: Vec<usize> = Vec::new();
        let (train, val) = split_train_val(items, 0.2, SplitStrategy::Tail);
        assert!(train.is_empty());
        assert!(val.is_empty());
    }
}
