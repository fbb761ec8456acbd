use crate::error::check_no_nan;
use crate::{prod_vec, split_value, ColumnMajorMatrix, FitResult, Loss};
use ordered_float::OrderedFloat;
use rayon::prelude::{IntoParallelIterator, ParallelIterator};
use std::f64::INFINITY;
use std::ops::Deref;

pub(crate) type BinType = u32;

/// Store the raw data.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Predictor for the learning
    pub features: ColumnMajorMatrix<f64>,
    /// Target, used for the learning
    pub target: Vec<f64>,
    /// Importance of every row
    pub weights: Vec<f64>,
}

impl Dataset {
    /// Dataset with checked dimensions and without NaN.
    pub fn new(
        features: ColumnMajorMatrix<f64>,
        target: Vec<f64>,
        weights: Vec<f64>,
    ) -> FitResult<Dataset> {
        if features.n_rows() != target.len() || target.len() != weights.len() {
            return Err(format!(
                "Inconsistent number of rows: {} features, {} target, {} weights",
                features.n_rows(),
                target.len(),
                weights.len()
            )
            .into());
        }
        check_no_nan(features.flat(), "features")?;
        check_no_nan(&target, "target")?;
        check_no_nan(&weights, "weights")?;
        if let Some(w) = weights.iter().find(|&&w| w < 0.) {
            return Err(format!("Found a negative weight: {}", w).into());
        }
        Ok(Dataset {
            features,
            target,
            weights,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.target.len()
    }

    /// New dataset with only the given rows.
    pub fn select_rows(&self, rows: &[usize]) -> Dataset {
        Dataset {
            features: self.features.select_rows(rows),
            target: rows.iter().map(|&i| self.target[i]).collect(),
            weights: rows.iter().map(|&i| self.weights[i]).collect(),
        }
    }

    /// Same dataset with other weights.
    pub fn with_weights(&self, weights: Vec<f64>) -> Dataset {
        assert_eq!(weights.len(), self.n_rows());
        Dataset {
            features: self.features.clone(),
            target: self.target.clone(),
            weights,
        }
    }

    /// Rank per columns: the smallest value will have the rank 0,
    /// two equals values will have the same rank.
    /// Also returns the number of distinct values per column.
    fn rank_features(&self) -> (ColumnMajorMatrix<usize>, Vec<usize>) {
        let mut n_uniques = Vec::with_capacity(self.features.n_cols());
        let columns = self
            .features
            .columns()
            .map(|column| {
                // First we sort the index according to the values
                let mut sorted_indices: Vec<usize> = (0..column.len()).collect();
                sorted_indices.sort_by_key(|&row_id| OrderedFloat::from(column[row_id]));

                // Then we give the same rank to equal values
                let mut ranks: Vec<usize> = vec![0; column.len()];
                let mut current_rank = 0;
                let mut last_val = None;
                for idx in sorted_indices {
                    let val = column[idx];
                    if let Some(last_val) = last_val {
                        if val != last_val {
                            current_rank += 1;
                        }
                    }
                    last_val = Some(val);
                    ranks[idx] = current_rank;
                }
                n_uniques.push(if column.is_empty() { 0 } else { current_rank + 1 });
                ranks
            })
            .collect();
        (
            ColumnMajorMatrix::from_columns(self.n_rows(), columns),
            n_uniques,
        )
    }

    /// Bin values: the smallest value will have the bin 0, the biggest n_bins - 1.
    /// Bins contain the same number of distinct values.
    /// Vec<usize> is the effective number of bins we have at the end.
    fn bin_features(
        features_rank: &ColumnMajorMatrix<usize>,
        n_uniques: &[usize],
        n_bins: usize,
    ) -> (ColumnMajorMatrix<BinType>, Vec<usize>) {
        let mut effective_n_bins = Vec::with_capacity(n_uniques.len());
        let columns = features_rank
            .columns()
            .zip(n_uniques)
            .map(|(column, &n_unique)| {
                let n_bins: usize = n_unique.min(n_bins);
                assert!(n_bins < (BinType::max_value()) as usize);
                effective_n_bins.push(n_bins);
                column
                    .iter()
                    .map(|&rank| (rank * n_bins / n_unique) as BinType)
                    .collect()
            })
            .collect();
        (
            ColumnMajorMatrix::from_columns(features_rank.n_rows(), columns),
            effective_n_bins,
        )
    }

    /// Pre-compute the thresholds when we split between two bins.
    ///
    /// The threshold after the bin `b` is between the biggest value of the bins `<= b`
    /// and the smallest value of the bins `> b`, so empty bins are not an issue.
    fn get_threshold_between_bins(values: &[f64], bins: &[BinType], n_bin: usize) -> Vec<f64> {
        if n_bin == 0 {
            return Vec::new();
        }
        let mut min_vals = vec![INFINITY; n_bin];
        let mut max_vals = vec![-INFINITY; n_bin];
        for (&val, &bin) in values.iter().zip(bins.iter()) {
            let bin = bin as usize;
            min_vals[bin] = min_vals[bin].min(val);
            max_vals[bin] = max_vals[bin].max(val);
        }
        for bin in 1..n_bin {
            max_vals[bin] = max_vals[bin].max(max_vals[bin - 1]);
        }
        for bin in (0..n_bin - 1).rev() {
            min_vals[bin] = min_vals[bin].min(min_vals[bin + 1]);
        }
        max_vals
            .into_iter()
            .zip(min_vals.into_iter().skip(1).chain(Some(INFINITY)))
            .map(|(a, b)| split_value(a, b))
            .collect()
    }

    /// Prepare the dataset for the training.
    /// * `n_bins` - Number of bins we want to use. Set it to 0 for exact training
    ///     Exact training is slower and more prone to over-fit.
    pub fn as_prepared_data(&self, n_bins: usize) -> PreparedDataset {
        let (features_rank, n_uniques) = self.rank_features();
        let binned = n_bins > 0;
        let (bins, n_bins) = Dataset::bin_features(&features_rank, &n_uniques, n_bins.max(1));

        let threshold_vals: Vec<_> = self
            .features
            .columns()
            .zip(bins.columns())
            .zip(n_bins.iter())
            .collect();

        let threshold_vals = threshold_vals
            .into_par_iter()
            .map(|((values, bins), &n_bin)| Self::get_threshold_between_bins(values, bins, n_bin))
            .collect();

        PreparedDataset {
            features: &self.features,
            target: &self.target,
            features_rank,
            binned,
            bins,
            n_bins,
            threshold_vals,
        }
    }
}

/// Dataset pre-computed for the training.
pub struct PreparedDataset<'a> {
    pub(crate) features: &'a ColumnMajorMatrix<f64>,
    pub(crate) target: &'a [f64],
    // Rank inside the dataset of a feature. Can contains duplicates if the values are equals.
    pub(crate) features_rank: ColumnMajorMatrix<usize>,
    // False for exact training
    pub(crate) binned: bool,
    pub(crate) bins: ColumnMajorMatrix<BinType>,
    pub(crate) n_bins: Vec<usize>,
    pub(crate) threshold_vals: Vec<Vec<f64>>,
}

impl<'a> PreparedDataset<'a> {
    pub fn n_rows(&self) -> usize {
        self.target.len()
    }

    pub fn n_features(&self) -> usize {
        self.features.n_cols()
    }

    /// Train set with the gradients computed at the given predictions.
    pub(crate) fn as_train_data(
        &'a self,
        loss: &impl Loss,
        predictions: &[f64],
        sample_weights: &[f64],
    ) -> TrainDataset<'a> {
        let columns: Vec<_> = (0..self.features.n_cols()).collect();
        let mut train = TrainDataset {
            grad: Vec::new(),
            hessian: Vec::new(),
            columns,
            data: self,
        };
        train.update_grad_hessian(loss, predictions, sample_weights);
        train
    }
}

pub(crate) struct TrainDataset<'a> {
    pub(crate) grad: Vec<f64>,
    pub(crate) hessian: Vec<f64>,
    // Columns that we want to train on
    pub(crate) columns: Vec<usize>,
    pub(crate) data: &'a PreparedDataset<'a>,
}

// With Deref we can use train_data_set.X if X is an attribute of PreparedDataset
impl<'a> Deref for TrainDataset<'a> {
    type Target = PreparedDataset<'a>;
    fn deref(&self) -> &Self::Target {
        self.data
    }
}

impl<'a> TrainDataset<'a> {
    /// Gradient and hessian of the loss at the predictions, multiplied by the weights.
    pub(crate) fn update_grad_hessian(
        &mut self,
        loss: &impl Loss,
        predictions: &[f64],
        sample_weights: &[f64],
    ) {
        assert_eq!(predictions.len(), sample_weights.len());
        let (grad, hessian) = loss.calc_gradient_hessian(&self.target, &predictions);
        self.grad = prod_vec(&grad, sample_weights);
        self.hessian = prod_vec(&hessian, sample_weights);
    }
}
