//! Seeded fitting/evaluation split

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{SelectionError, SelectionResult};

/// Row indices of the two partitions, each in ascending order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `n_rows` row indices with `seed` and hold out a fraction
///
/// The held-out size is `ceil(n_rows * test_fraction)`, kept within
/// `[1, n_rows - 1]` so both sides are non-empty.
pub fn train_test_split(n_rows: usize, test_fraction: f64, seed: u64) -> SelectionResult<Partition> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(SelectionError::InvalidParameter(format!(
            "test_fraction must be in (0, 1), got {}",
            test_fraction
        )));
    }
    if n_rows < 2 {
        return Err(SelectionError::TooFewRows {
            rows: n_rows,
            required: 2,
        });
    }

    let n_test = ((n_rows as f64 * test_fraction).ceil() as usize).clamp(1, n_rows - 1);

    let mut indices: Vec<usize> = (0..n_rows).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let mut test = indices[..n_test].to_vec();
    let mut train = indices[n_test..].to_vec();
    test.sort_unstable();
    train.sort_unstable();

    Ok(Partition { train, test })
}
