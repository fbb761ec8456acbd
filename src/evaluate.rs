use crate::{
    mae, mean, normalize_by_mean, split_dataset, wmae, BoosterParams, ColumnMajorMatrix, Column,
    Dataset, FitResult, RFParams, RandomForest, RegLoss, Table, TreeParams, DEFAULT_SEED,
    DEFAULT_TEST_SIZE, DEFAULT_WEIGHT_COL, GBT, TARGET_COL,
};
use failure::Error;
use itertools::Itertools;
use rand::prelude::{SeedableRng, StdRng};

/// How the rows are split between train and validation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SplitConfig {
    /// Fraction of the rows used for the validation
    pub test_size: f64,
    /// Column with the weight of every row. All the weights are 1 if it's absent from the table
    pub weight_col: String,
    /// Seed of the split and of the models
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        SplitConfig {
            test_size: DEFAULT_TEST_SIZE,
            weight_col: DEFAULT_WEIGHT_COL.to_string(),
            seed: DEFAULT_SEED,
        }
    }
}

/// Scores of a model on the validation set.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub mae: f64,
    /// Weighted by the original weights of the validation rows
    pub wmae: f64,
    pub n_features: usize,
}

/// Extract the target, the weights and the numeric features of a table.
///
/// Text columns are dropped from the features.
pub fn extract_dataset(table: &Table, weight_col: &str) -> Result<Dataset, Error> {
    let target = table.numeric_column(TARGET_COL)?.to_vec();
    let weights = if table.contains(weight_col) {
        table.numeric_column(weight_col)?.to_vec()
    } else {
        debug!("No column {}, all the weights are 1", weight_col);
        vec![1.; table.n_rows()]
    };

    let features = table.drop_columns(&[TARGET_COL, weight_col]);
    let dropped = features
        .iter()
        .filter(|(_, column)| !column.is_numeric())
        .map(|(name, _)| name)
        .join(", ");
    if !dropped.is_empty() {
        debug!("Text columns dropped from the features: {}", dropped);
    }
    let columns: Vec<Vec<f64>> = features
        .columns()
        .iter()
        .filter_map(|column| match column {
            Column::Numeric(values) => Some(values.clone()),
            Column::Text(_) => None,
        })
        .collect();
    if columns.is_empty() {
        warn!("No numeric feature left");
    }

    let features = ColumnMajorMatrix::from_columns(table.n_rows(), columns);
    Ok(Dataset::new(features, target, weights)?)
}

/// Weights divided by their mean, for the fitting only.
fn with_normalized_weights(dataset: &Dataset, name: &str) -> FitResult<Dataset> {
    if !(mean(&dataset.weights) > 0.) {
        return Err(format!("The weights of the {} set sum to zero", name).into());
    }
    Ok(dataset.with_weights(normalize_by_mean(&dataset.weights)))
}

fn score(valid: &Dataset, yhat: &[f64]) -> Evaluation {
    Evaluation {
        mae: mae(&valid.target, yhat),
        wmae: wmae(&valid.target, yhat, &valid.weights),
        n_features: valid.features.n_cols(),
    }
}

/// Fit gradient boosted trees on a random part of the table and score them on the rest.
///
/// Train and validation weights are normalized separately for the fitting and the monitoring,
/// but the reported WMAE uses the original validation weights.
pub fn evaluate_gbt(
    table: &Table,
    split: &SplitConfig,
    booster_params: &BoosterParams,
    tree_params: &TreeParams,
) -> Result<Evaluation, Error> {
    let dataset = extract_dataset(table, &split.weight_col)?;
    let (train, valid) = split_dataset(&dataset, split.test_size, split.seed)?;

    let train_fit = with_normalized_weights(&train, "train")?;
    let valid_monitor = with_normalized_weights(&valid, "validation")?;
    let gbt = GBT::build(
        booster_params,
        tree_params,
        &train_fit,
        Some(&valid_monitor),
        RegLoss::default(),
    )?;

    let yhat = gbt.par_predict(&valid.features);
    Ok(score(&valid, &yhat))
}

/// Fit a random forest on a random part of the table and score it on the rest.
///
/// Only the train weights are normalized. The reported WMAE uses the original validation weights.
pub fn evaluate_rf(
    table: &Table,
    split: &SplitConfig,
    rf_params: &RFParams,
    tree_params: &TreeParams,
) -> Result<Evaluation, Error> {
    let dataset = extract_dataset(table, &split.weight_col)?;
    let (train, valid) = split_dataset(&dataset, split.test_size, split.seed)?;

    let train_fit = with_normalized_weights(&train, "train")?;
    let mut rng = StdRng::seed_from_u64(split.seed);
    let rf = RandomForest::build(
        &train_fit,
        rf_params,
        tree_params,
        RegLoss::default(),
        &mut rng,
    )?;

    let yhat = rf.par_predict(&valid.features);
    Ok(score(&valid, &yhat))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(data: &str) -> Table {
        Table::from_reader(data.as_bytes(), "test").unwrap()
    }

    /// target = slope * x + 1 with x = 0..n_rows, uniform weights
    fn linear_table(n_rows: usize, slope: f64, with_weights: bool) -> Table {
        let header = if with_weights { "x,city,w,target\n" } else { "x,city,target\n" };
        let mut data = String::from(header);
        for i in 0..n_rows {
            let x = i as f64;
            if with_weights {
                data.push_str(&format!("{},c{},1,{}\n", x, i % 2, slope * x + 1.));
            } else {
                data.push_str(&format!("{},c{},{}\n", x, i % 2, slope * x + 1.));
            }
        }
        parse(&data)
    }

    /// Error of the weighted mean of the train target, ie of boosting without any tree.
    fn constant_baseline(table: &Table) -> Evaluation {
        let params = BoosterParams {
            n_rounds: 0,
            ..BoosterParams::new()
        };
        evaluate_gbt(table, &SplitConfig::default(), &params, &TreeParams::new()).unwrap()
    }

    #[test]
    fn test_extract_dataset() {
        let table = parse("a,name,w,b,target\n1,x,2,3,4\n5,y,0.5,7,8\n");
        let dataset = extract_dataset(&table, "w").unwrap();
        assert_eq!(dataset.features.n_cols(), 2);
        assert_eq!(dataset.features.column(0), &[1., 5.]);
        assert_eq!(dataset.features.column(1), &[3., 7.]);
        assert_eq!(dataset.target, vec![4., 8.]);
        assert_eq!(dataset.weights, vec![2., 0.5]);

        // Without weight column
        let dataset = extract_dataset(&table, "weight").unwrap();
        assert_eq!(dataset.weights, vec![1., 1.]);
        assert_eq!(dataset.features.n_cols(), 3);
    }

    #[test]
    fn test_empty_column_is_not_a_feature() {
        let table = parse("a,empty,target\n1,,4\n5,NA,8\n");
        assert!(!table.get("empty").unwrap().is_numeric());
        let dataset = extract_dataset(&table, "w").unwrap();
        assert_eq!(dataset.features.n_cols(), 1);

        // Still a text column after the cleaning
        let cleaned = crate::preprocess_raw(&table);
        assert!(!cleaned.get("empty").unwrap().is_numeric());
        assert_eq!(extract_dataset(&cleaned, "w").unwrap().features.n_cols(), 1);
    }

    #[test]
    fn test_missing_target() {
        let table = parse("a,b\n1,2\n");
        let err = extract_dataset(&table, "w").unwrap_err();
        assert_eq!(err.to_string(), "column not found: target");
    }

    #[test]
    fn test_gbt_linear() {
        for &with_weights in &[true, false] {
            let table = linear_table(10, 0.1, with_weights);
            let evaluation = evaluate_gbt(
                &table,
                &SplitConfig::default(),
                &BoosterParams::new(),
                &TreeParams::new(),
            )
            .unwrap();
            assert_eq!(evaluation.n_features, 1);
            assert!(evaluation.mae < 0.5, "MAE too important: {}", evaluation.mae);
            assert!((evaluation.wmae - evaluation.mae).abs() < 1e-12);
        }
    }

    #[test]
    fn test_rf_linear() {
        let table = linear_table(10, 0.1, true);
        let evaluation = evaluate_rf(
            &table,
            &SplitConfig::default(),
            &RFParams::new(),
            &TreeParams::fully_grown(),
        )
        .unwrap();
        assert_eq!(evaluation.n_features, 1);
        assert!(evaluation.mae < 0.5, "MAE too important: {}", evaluation.mae);
        assert!((evaluation.wmae - evaluation.mae).abs() < 1e-12);
    }

    #[test]
    fn test_models_beat_constant() {
        // Targets from 1 to 991: a constant is hundreds away from most rows, a fitted model
        // about one step of 10
        let table = linear_table(100, 10., true);
        let baseline = constant_baseline(&table);
        assert!(baseline.mae > 50., "Baseline MAE too small: {}", baseline.mae);

        let split = SplitConfig::default();
        let gbt = evaluate_gbt(&table, &split, &BoosterParams::new(), &TreeParams::new()).unwrap();
        let rf = evaluate_rf(&table, &split, &RFParams::new(), &TreeParams::fully_grown()).unwrap();
        for evaluation in &[gbt, rf] {
            assert!(evaluation.mae < 30., "MAE too important: {}", evaluation.mae);
            assert!(evaluation.mae < baseline.mae / 5.);
            assert!((evaluation.wmae - evaluation.mae).abs() < 1e-9);
        }
    }

    #[test]
    fn test_deterministic() {
        let table = linear_table(10, 0.1, true);
        let split = SplitConfig::default();
        let gbt = || evaluate_gbt(&table, &split, &BoosterParams::new(), &TreeParams::new());
        assert_eq!(gbt().unwrap(), gbt().unwrap());
        let rf = || evaluate_rf(&table, &split, &RFParams::new(), &TreeParams::fully_grown());
        assert_eq!(rf().unwrap(), rf().unwrap());
    }

    #[test]
    fn test_wmae_uses_original_weights() {
        // Without any tree, the prediction is the weighted mean of the train target
        let mut data = String::from("x,w,target\n");
        for i in 0..20 {
            let w = if i % 2 == 0 { 1. } else { 3. };
            data.push_str(&format!("{},{},{}\n", i, w, i % 2));
        }
        let table = parse(&data);
        let params = BoosterParams {
            n_rounds: 0,
            ..BoosterParams::new()
        };
        let split = SplitConfig::default();
        let evaluation = evaluate_gbt(&table, &split, &params, &TreeParams::new()).unwrap();

        // Recompute by hand with the original weights
        let dataset = extract_dataset(&table, "w").unwrap();
        let (train, valid) = split_dataset(&dataset, split.test_size, split.seed).unwrap();
        let prediction = crate::weighted_mean(&train.target, &normalize_by_mean(&train.weights));
        let yhat = vec![prediction; valid.n_rows()];
        assert_eq!(evaluation.wmae, wmae(&valid.target, &yhat, &valid.weights));
        assert_eq!(evaluation.mae, mae(&valid.target, &yhat));
    }
}
