use ordered_float::OrderedFloat;

pub fn sum(v: &[f64]) -> f64 {
    let mut o = 0.;
    for e in v.iter() {
        o += *e;
    }
    o
}

pub fn mean(v: &[f64]) -> f64 {
    sum(&v) / (v.len() as f64)
}

/// Median of the non-NaN values, or None if there is none.
/// For an even number of values it's the mean of the two middle ones.
pub fn median(v: &[f64]) -> Option<f64> {
    let mut values: Vec<f64> = v.iter().cloned().filter(|x| !x.is_nan()).collect();
    if values.is_empty() {
        return None;
    }
    values.sort_by_key(|&x| OrderedFloat::from(x));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.)
    } else {
        Some(values[mid])
    }
}

pub fn weighted_mean(v: &[f64], weights: &[f64]) -> f64 {
    assert_eq!(v.len(), weights.len());
    let num: f64 = v.iter().zip(weights).map(|(&a, &w)| a * w).sum();
    num / sum(weights)
}

pub fn prod_vec(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(&a, &b)| a * b).collect()
}

/// Divide the weights by their mean, so the result averages to 1.
pub fn normalize_by_mean(weights: &[f64]) -> Vec<f64> {
    let m = mean(weights);
    weights.iter().map(|&w| w / m).collect()
}

pub fn mae(target: &[f64], yhat: &[f64]) -> f64 {
    assert_eq!(target.len(), yhat.len());
    let mae: f64 = yhat
        .iter()
        .zip(target.iter())
        .map(|(&a, &b)| (a - b).abs())
        .sum();
    mae / target.len() as f64
}

/// Weighted mean absolute error: sum(|target - yhat| * weight) / sum(weight).
///
/// Nothing protects against a null sum of weights: the result is then NaN or infinite.
pub fn wmae(target: &[f64], yhat: &[f64], weights: &[f64]) -> f64 {
    assert_eq!(target.len(), yhat.len());
    assert_eq!(target.len(), weights.len());
    let mut num = 0.;
    for ((&t, &p), &w) in target.iter().zip(yhat).zip(weights) {
        num += (t - p).abs() * w;
    }
    num / sum(weights)
}

/// Threshold between two consecutive distinct values, `low < high`.
///
/// Rows with a value `<= threshold` go left, so the threshold must stay strictly below `high`:
/// the midpoint can round up to `high` for adjacent floats, then `low` is used.
pub(crate) fn split_value(low: f64, high: f64) -> f64 {
    let mid = low / 2. + high / 2.;
    if mid == high && high.is_finite() {
        low
    } else {
        mid
    }
}

pub(crate) fn sum_indices(v: &[f64], indices: &[usize]) -> f64 {
    // A sum over a null set is not possible there, and this catch bugs.
    // The speed difference is negligible
    assert_ne!(indices.len(), 0);
    let mut o = 0.;
    for &i in indices {
        o += v[i];
    }
    o
}

#[cfg(test)]
mod tests {
    use crate::*;

    macro_rules! assert_almost_eq {
        ($a : expr, $b:expr) => {
            let (a, b) = ($a, $b);
            let eps = 1e-9;
            let diff = (a - b).abs();
            if diff > eps {
                panic!("{} != {} at +-{}", a, b, eps)
            }
        };
    }

    #[test]
    fn test_wmae_uniform_weights_is_mae() {
        let target = vec![1., 2., 3., 4.];
        let yhat = vec![1.5, 1., 3., 6.];
        let weights = vec![1.; 4];
        assert_almost_eq!(wmae(&target, &yhat, &weights), mae(&target, &yhat));
        assert_almost_eq!(mae(&target, &yhat), 0.875);

        // Any constant weight gives the same result
        let weights = vec![3.5; 4];
        assert_almost_eq!(wmae(&target, &yhat, &weights), 0.875);
    }

    #[test]
    fn test_wmae_weighted() {
        let target = vec![0., 0.];
        let yhat = vec![1., 3.];
        assert_almost_eq!(wmae(&target, &yhat, &[3., 1.]), 1.5);
        assert_almost_eq!(wmae(&target, &yhat, &[1., 0.]), 1.);
    }

    #[test]
    fn test_wmae_null_weights() {
        // 0/0: not guarded, the result is just not a finite number
        let score = wmae(&[1., 2.], &[0., 0.], &[0., 0.]);
        assert!(!score.is_finite());
    }

    #[test]
    fn test_split_value() {
        assert_eq!(split_value(1., 2.), 1.5);
        assert_eq!(split_value(3., std::f64::INFINITY), std::f64::INFINITY);

        // Adjacent floats where the midpoint rounds up to the biggest one
        let low = f64::from_bits(1f64.to_bits() + 1);
        let high = f64::from_bits(1f64.to_bits() + 2);
        assert_eq!(low / 2. + high / 2., high);
        assert_eq!(split_value(low, high), low);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[3., 1., 2.]), Some(2.));
        assert_eq!(median(&[1.5, std::f64::NAN, 2.]), Some(1.75));
        assert_eq!(median(&[4., 1., 3., 2.]), Some(2.5));
        assert_eq!(median(&[std::f64::NAN]), None);
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_normalize_by_mean() {
        let normalized = normalize_by_mean(&[1., 2., 3.]);
        assert_almost_eq!(mean(&normalized), 1.);
        assert_almost_eq!(normalized[0], 0.5);
        assert_almost_eq!(weighted_mean(&[1., 3.], &[1., 3.]), 2.5);
    }
}
