use crate::{
    evaluate_gbt, evaluate_rf, preprocess_raw, BoosterParams, Evaluation, RFParams, SplitConfig,
    Table, TreeParams,
};
use failure::Error;
use std::io::Write;
use std::path::PathBuf;

pub static GBT_CLEARED: &str = "GBT (cleared)";
pub static GBT_IMPUTED: &str = "GBT (imputed)";
pub static RF_IMPUTED: &str = "RF (imputed)";

/// Everything needed to run the comparison.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BenchmarkConfig {
    /// Raw data, cleaned with `preprocess_raw` before the fitting
    pub cleared_path: PathBuf,
    /// Already imputed data, used as is
    pub imputed_path: PathBuf,
    pub split: SplitConfig,
    pub booster_params: BoosterParams,
    pub gbt_tree_params: TreeParams,
    pub rf_params: RFParams,
    pub rf_tree_params: TreeParams,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            cleared_path: PathBuf::from("data/hackathon_income_train_cleared.csv"),
            imputed_path: PathBuf::from("data/hackathon_income_train_imputed.csv"),
            split: SplitConfig::default(),
            booster_params: BoosterParams::new(),
            gbt_tree_params: TreeParams::new(),
            rf_params: RFParams::new(),
            rf_tree_params: TreeParams::fully_grown(),
        }
    }
}

/// Name and WMAE of the best model. The first one wins on ties, NaN scores are never selected.
pub fn best_model(results: &[(String, f64)]) -> Option<(&str, f64)> {
    let mut best: Option<(&str, f64)> = None;
    for (name, wmae) in results {
        if wmae.is_nan() {
            continue;
        }
        match best {
            Some((_, best_wmae)) if *wmae >= best_wmae => {}
            _ => best = Some((name.as_str(), *wmae)),
        }
    }
    best
}

fn write_evaluation(out: &mut impl Write, evaluation: &Evaluation) -> Result<(), Error> {
    writeln!(
        out,
        "   MAE: {:.4}, WMAE: {:.4}, Features: {}",
        evaluation.mae, evaluation.wmae, evaluation.n_features
    )?;
    Ok(())
}

/// Evaluate the three models and write the report to `out`.
///
/// Returns the WMAE of every model, in the order of the report.
pub fn run_benchmark(
    config: &BenchmarkConfig,
    out: &mut impl Write,
) -> Result<Vec<(String, f64)>, Error> {
    writeln!(out, "MODEL COMPARISON ON THE DATASETS (WEIGHTED)")?;
    writeln!(out, "{}", "=".repeat(60))?;

    writeln!(out, "1. CLEARED DATA (GBT):")?;
    let raw = Table::read_csv(&config.cleared_path)?;
    let cleared = preprocess_raw(&raw);
    let gbt_cleared = evaluate_gbt(
        &cleared,
        &config.split,
        &config.booster_params,
        &config.gbt_tree_params,
    )?;
    write_evaluation(out, &gbt_cleared)?;

    writeln!(out, "\n2. IMPUTED DATA (GBT):")?;
    let imputed = Table::read_csv(&config.imputed_path)?;
    let gbt_imputed = evaluate_gbt(
        &imputed,
        &config.split,
        &config.booster_params,
        &config.gbt_tree_params,
    )?;
    write_evaluation(out, &gbt_imputed)?;

    writeln!(out, "\n3. IMPUTED DATA (Random Forest):")?;
    let rf_imputed = evaluate_rf(
        &imputed,
        &config.split,
        &config.rf_params,
        &config.rf_tree_params,
    )?;
    write_evaluation(out, &rf_imputed)?;

    writeln!(out, "\nRESULTS:")?;
    let results = vec![
        (GBT_CLEARED.to_string(), gbt_cleared.wmae),
        (GBT_IMPUTED.to_string(), gbt_imputed.wmae),
        (RF_IMPUTED.to_string(), rf_imputed.wmae),
    ];
    match best_model(&results) {
        Some((name, wmae)) => writeln!(out, "BEST MODEL: {} (WMAE: {:.4})", name, wmae)?,
        None => {
            warn!("No model has a finite WMAE");
            writeln!(out, "BEST MODEL: none")?
        }
    }
    Ok(results)
}
