use crate::{Dataset, FitResult};
use rand::prelude::{SeedableRng, SliceRandom, StdRng};

/// Random partition of the rows into a train set and a validation set.
///
/// The validation set has `ceil(test_size * n_rows)` rows, the train set the rest.
/// Returns (train indices, validation indices).
pub fn train_test_split(
    n_rows: usize,
    test_size: f64,
    seed: u64,
) -> FitResult<(Vec<usize>, Vec<usize>)> {
    if !(test_size > 0. && test_size < 1.) {
        return Err(format!("test_size must be in ]0, 1[, got {}", test_size).into());
    }
    let n_test = (test_size * n_rows as f64).ceil() as usize;
    let n_train = n_rows.saturating_sub(n_test);
    if n_test == 0 || n_train == 0 {
        return Err(format!(
            "With {} rows and test_size={}, the train set would have {} rows and the validation \
             set {}",
            n_rows, test_size, n_train, n_test
        )
        .into());
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut permutation: Vec<usize> = (0..n_rows).collect();
    permutation.shuffle(&mut rng);
    let train = permutation.split_off(n_test);
    Ok((train, permutation))
}

/// Split a dataset: features, target and weights keep the same row assignment.
pub fn split_dataset(
    dataset: &Dataset,
    test_size: f64,
    seed: u64,
) -> FitResult<(Dataset, Dataset)> {
    let (train, valid) = train_test_split(dataset.n_rows(), test_size, seed)?;
    Ok((dataset.select_rows(&train), dataset.select_rows(&valid)))
}
