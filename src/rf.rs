use crate::{
    weighted_mean, ColumnMajorMatrix, Dataset, FitResult, LeafNode, Loss, Node, StridedVecView,
    TreeParams, DEFAULT_N_TREES,
};
use rand::prelude::Rng;
use rayon::prelude::*;
use std::time::Instant;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RFParams {
    pub n_trees: usize,
    /// Number of bins of the histograms. 0 for exact training
    pub n_bins: usize,
}

impl RFParams {
    pub fn new() -> Self {
        Self {
            n_trees: DEFAULT_N_TREES,
            n_bins: 0,
        }
    }
}

impl Default for RFParams {
    fn default() -> Self {
        Self::new()
    }
}

/// Random forest: trees on bootstrap samples, the prediction is their mean.
#[derive(Debug, Clone)]
pub struct RandomForest<L: Loss> {
    models: Vec<Node>,
    rf_params: RFParams,
    tree_params: TreeParams,
    loss: L,
}

impl<L: Loss> RandomForest<L> {
    /// Train on `train`. A row drawn k times in a bootstrap sample has the weight k * its weight.
    ///
    /// The trees are built in parallel, but every random draw is done before with `rng`, so the
    /// result only depends on the state of `rng`.
    pub fn build(
        train: &Dataset,
        rf_params: &RFParams,
        tree_params: &TreeParams,
        loss: L,
        rng: &mut impl Rng,
    ) -> FitResult<RandomForest<L>> {
        let n_rows = train.n_rows();
        if n_rows == 0 {
            return Err("No data to train on".into());
        }
        let train_start_time = Instant::now();

        // We have to compute the weights first because they depends on &mut rng
        let weights: Vec<Vec<f64>> = (0..rf_params.n_trees)
            .map(|_| {
                let mut counts = vec![0.; n_rows];
                for _ in 0..n_rows {
                    counts[rng.gen_range(0..n_rows)] += 1.;
                }
                counts
                    .iter()
                    .zip(&train.weights)
                    .map(|(count, weight)| count * weight)
                    .collect()
            })
            .collect();

        let prepared = train.as_prepared_data(rf_params.n_bins);
        // We don't do boosting so the initial value is just the default one
        let train_scores = vec![0.; n_rows];

        let models: Vec<_> = weights
            .par_iter()
            .map(|sample_weights| {
                // We filter the indices with non-null weights
                let indices: Vec<usize> = (0..n_rows).filter(|&i| sample_weights[i] > 0.).collect();
                if indices.is_empty() {
                    // Only rows without weight were drawn
                    let val = weighted_mean(&train.target, &train.weights);
                    return Node::Leaf(LeafNode { val });
                }

                // We update the data set to a train set according to the weights.
                let train = prepared.as_train_data(&loss, &train_scores, sample_weights);
                let mut tree_predictions = vec![0.; n_rows];

                // Let's build it!
                Node::build_from_train_data(&train, &indices, &mut tree_predictions, tree_params)
            })
            .collect();

        info!(
            "{} RF trees fit. Elapsed: {:.2} secs",
            models.len(),
            train_start_time.elapsed().as_secs_f64()
        );
        Ok(RandomForest {
            models,
            rf_params: rf_params.clone(),
            tree_params: tree_params.clone(),
            loss,
        })
    }

    pub fn predict(&self, features: &StridedVecView<f64>) -> f64 {
        let o: f64 = self
            .models
            .iter()
            .map(|model| model.predict(features))
            .sum();
        o / self.models.len() as f64
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

    pub fn rf_params(&self) -> &RFParams {
        &self.rf_params
    }

    pub fn tree_params(&self) -> &TreeParams {
        &self.tree_params
    }

    pub fn loss(&self) -> &L {
        &self.loss
    }
}

#[cfg(test)]
mod tests {
    use crate::*;
    use rand::prelude::{SeedableRng, StdRng};

    fn step_dataset(n_rows: usize) -> Dataset {
        let x: Vec<f64> = (0..n_rows).map(|i| i as f64).collect();
        let target = x.iter().map(|&x| if x < n_rows as f64 / 2. { 1. } else { 5. }).collect();
        let features = ColumnMajorMatrix::from_columns(n_rows, vec![x]);
        Dataset::new(features, target, vec![1.; n_rows]).unwrap()
    }

    fn build(train: &Dataset, seed: u64) -> RandomForest<RegLoss> {
        let mut rng = StdRng::seed_from_u64(seed);
        RandomForest::build(
            train,
            &RFParams::new(),
            &TreeParams::fully_grown(),
            RegLoss::default(),
            &mut rng,
        )
        .unwrap()
    }

    #[test]
    fn test_step_function() {
        let train = step_dataset(40);
        let rf = build(&train, 42);
        assert_eq!(rf.n_trees(), 100);

        // Far from the step, all the trees agree
        assert_eq!(rf.predict(&train.features.row(2)), 1.);
        assert_eq!(rf.predict(&train.features.row(37)), 5.);
        let yhat = rf.par_predict(&train.features);
        assert!(mae(&train.target, &yhat) < 0.2);
    }

    #[test]
    fn test_deterministic_with_seed() {
        let train = step_dataset(30);
        let a = build(&train, 42).par_predict(&train.features);
        let b = build(&train, 42).par_predict(&train.features);
        assert_eq!(a, b);
    }

    #[test]
    fn test_null_weights_are_ignored() {
        let mut train = step_dataset(20);
        // Rows with a null weight and a crazy target
        train.target[0] = 1000.;
        train.weights[0] = 0.;
        let rf = build(&train, 1);
        let yhat = rf.par_predict(&train.features);
        assert!(yhat.iter().all(|&e| e < 10.));
    }
}
