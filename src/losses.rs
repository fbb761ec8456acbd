use crate::weighted_mean;

/// General interface for a loss.
///
/// The gradient is taken in the direction of the target, so a leaf value is
/// `sum(grad) / (sum(hessian) + lambda)`.
pub trait Loss: std::marker::Sync {
    fn calc_gradient_hessian(&self, target: &[f64], predictions: &[f64]) -> (Vec<f64>, Vec<f64>);
    fn calc_loss(&self, target: &[f64], predictions: &[f64]) -> f64;
    /// Constant prediction we start the boosting from.
    fn initial_prediction(&self, target: &[f64], weights: &[f64]) -> f64;
}

/// Squared error, ie the usual loss for a regression: 1/2 * (target - prediction)^2
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct RegLoss {
    // Nothing inside
}

impl Loss for RegLoss {
    fn calc_gradient_hessian(&self, target: &[f64], predictions: &[f64]) -> (Vec<f64>, Vec<f64>) {
        assert_eq!(target.len(), predictions.len());
        let hessian: Vec<f64> = vec![1.; target.len()];
        let grad = target
            .iter()
            .zip(predictions)
            .map(|(&target, &prediction)| target - prediction)
            .collect();
        (grad, hessian)
    }

    fn calc_loss(&self, target: &[f64], predictions: &[f64]) -> f64 {
        target
            .iter()
            .zip(predictions)
            .map(|(&target, &prediction)| (target - prediction).powi(2) / 2.)
            .sum()
    }

    fn initial_prediction(&self, target: &[f64], weights: &[f64]) -> f64 {
        weighted_mean(target, weights)
    }
}
