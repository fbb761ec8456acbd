use std::time::Instant;

use crate::{
    wmae, ColumnMajorMatrix, Dataset, FitResult, Loss, Node, StridedVecView, TreeParams,
    DEFAULT_LEARNING_RATE, DEFAULT_N_BINS, DEFAULT_N_ROUNDS,
};
use rayon::prelude::*;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BoosterParams {
    pub learning_rate: f64,
    /// Number of trees, there is no early stopping
    pub n_rounds: usize,
    /// Number of bins of the histograms. 0 for exact training
    pub n_bins: usize,
}

impl BoosterParams {
    pub fn new() -> Self {
        BoosterParams {
            learning_rate: DEFAULT_LEARNING_RATE,
            n_rounds: DEFAULT_N_ROUNDS,
            n_bins: DEFAULT_N_BINS,
        }
    }
}

impl Default for BoosterParams {
    fn default() -> Self {
        Self::new()
    }
}

/// Weighted MAE after a boosting round.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EvalRecord {
    pub iteration: usize,
    pub train_mae: f64,
    pub valid_mae: Option<f64>,
}

/// Gradient boosted trees.
#[derive(Debug, Clone)]
pub struct GBT<L: Loss> {
    models: Vec<Node>,
    initial_prediction: f64,
    booster_params: BoosterParams,
    tree_params: TreeParams,
    eval_history: Vec<EvalRecord>,
    loss: L,
}

impl<L: Loss> GBT<L> {
    /// Train on `train`, weighted by its weights.
    ///
    /// If `valid` is given, it's only monitored: its weighted MAE is recorded after every round
    /// but it doesn't change the model.
    pub fn build(
        booster_params: &BoosterParams,
        tree_params: &TreeParams,
        train: &Dataset,
        valid: Option<&Dataset>,
        loss: L,
    ) -> FitResult<GBT<L>> {
        if train.n_rows() == 0 {
            return Err("No data to train on".into());
        }
        if let Some(valid) = valid {
            if valid.features.n_cols() != train.features.n_cols() {
                return Err(format!(
                    "Validation set has {} features, expected {}",
                    valid.features.n_cols(),
                    train.features.n_cols()
                )
                .into());
            }
        }

        let train_start_time = Instant::now();
        let prepared = train.as_prepared_data(booster_params.n_bins);
        debug!(
            "Features binned in {:.03}s",
            train_start_time.elapsed().as_secs_f64()
        );

        let initial_prediction = loss.initial_prediction(&train.target, &train.weights);
        let mut train_scores = vec![initial_prediction; train.n_rows()];
        let mut val_scores: Option<Vec<f64>> =
            valid.map(|dataset| vec![initial_prediction; dataset.n_rows()]);

        let mut train_data = prepared.as_train_data(&loss, &train_scores, &train.weights);
        // Predictions per tree. We create it before so we don't have to allocate a new vector at
        // each iteration
        let mut tree_predictions = vec![0.; train.n_rows()];
        let indices: Vec<usize> = (0..train.n_rows()).collect();
        let learning_rate = booster_params.learning_rate;

        let mut models = Vec::with_capacity(booster_params.n_rounds);
        let mut eval_history = Vec::with_capacity(booster_params.n_rounds);
        for iteration in 0..booster_params.n_rounds {
            if iteration > 0 {
                train_data.update_grad_hessian(&loss, &train_scores, &train.weights);
            }

            let mut learner = Node::build_from_train_data(
                &train_data,
                &indices,
                &mut tree_predictions,
                tree_params,
            );
            learner.apply_shrinking(learning_rate);
            for (score, val) in train_scores.iter_mut().zip(&tree_predictions) {
                *score += val * learning_rate;
            }
            let train_mae = wmae(&train.target, &train_scores, &train.weights);

            let valid_mae = match (valid, val_scores.as_mut()) {
                (Some(valid), Some(val_scores)) => {
                    let tree_val_predictions = learner.par_predict(&valid.features);
                    for (score, val) in val_scores.iter_mut().zip(tree_val_predictions) {
                        *score += val;
                    }
                    Some(wmae(&valid.target, val_scores, &valid.weights))
                }
                _ => None,
            };

            match valid_mae {
                Some(valid_mae) => debug!(
                    "[{}] train-mae:{:.5} valid-mae:{:.5}",
                    iteration, train_mae, valid_mae
                ),
                None => debug!("[{}] train-mae:{:.5}", iteration, train_mae),
            }
            eval_history.push(EvalRecord {
                iteration,
                train_mae,
                valid_mae,
            });
            models.push(learner);
        }

        info!(
            "Training of {} trees finished. Elapsed: {:.2} secs",
            models.len(),
            train_start_time.elapsed().as_secs_f64()
        );

        Ok(GBT {
            models,
            initial_prediction,
            booster_params: booster_params.clone(),
            tree_params: tree_params.clone(),
            eval_history,
            loss,
        })
    }

    pub fn predict(&self, features: &StridedVecView<f64>) -> f64 {
        let o: f64 = self.models.iter().map(|model| model.predict(features)).sum();
        self.initial_prediction + o
    }

    pub fn par_predict(&self, features: &ColumnMajorMatrix<f64>) -> Vec<f64> {
        (0..features.n_rows())
            .into_par_iter()
            .map(|i| self.predict(&features.row(i)))
            .collect()
    }

    pub fn n_trees(&self) -> usize {
        self.models.len()
    }

    pub fn eval_history(&self) -> &[EvalRecord] {
        &self.eval_history
    }

    pub fn booster_params(&self) -> &BoosterParams {
        &self.booster_params
    }

    pub fn tree_params(&self) -> &TreeParams {
        &self.tree_params
    }

    pub fn loss(&self) -> &L {
        &self.loss
    }
}
