use crate::tree::SplitResult;
use crate::tree_direct::build_direct;
use crate::{sum_indices, LeafNode, Node, SplitNode, TrainDataset, TreeParams};
use ord_subset::OrdSubsetIterExt;
use std::f64::INFINITY;

// Minimum number of rows before it's faster to use the direct algorithm
static MIN_ROWS_FOR_BINNING: usize = 100;

/// Histogram of the gradients and hessians per bin. Returns the smallest and biggest bins used.
fn update_grad_hessian(
    train: &TrainDataset,
    indices: &[usize],
    feature_id: usize,
    grads: &mut [f64],
    hessians: &mut [f64],
) -> (usize, usize) {
    assert_eq!(grads.len(), hessians.len());
    let mut min_bin = grads.len(); // placeholder value: if it don't change we have no data
    let mut max_bin = 0;

    for &i in indices {
        let bin = train.bins[(i, feature_id)] as usize;
        grads[bin] += train.grad[i];
        hessians[bin] += train.hessian[i];
        min_bin = min_bin.min(bin);
        max_bin = max_bin.max(bin);
    }
    (min_bin, max_bin)
}

/// Best split between two bins: (feature_id, gain, last bin on the left)
fn calc_gain_bins(
    sum_grad: f64,
    sum_hessian: f64,
    params: &TreeParams,
    feature_id: usize,
    grads: &[f64],
    hessians: &[f64],
    min_bin: usize,
    max_bin: usize,
) -> Option<(usize, f64, usize)> {
    if max_bin <= min_bin {
        // Not possible to split if there is just one bin
        return None;
    }

    let mut grad_left = 0.;
    let mut hessian_left = 0.;
    let mut best: Option<(f64, usize)> = None;
    for bin in min_bin..max_bin {
        grad_left += grads[bin];
        hessian_left += hessians[bin];
        if !Node::is_valid_split(sum_hessian, hessian_left, params) {
            continue;
        }

        let current_gain =
            Node::calc_split_gain(sum_grad, sum_hessian, grad_left, hessian_left, params.lambda);
        if current_gain > best.map(|e| e.0).unwrap_or(-INFINITY) {
            best = Some((current_gain, bin));
        }
    }

    best.map(|(best_gain, best_bin)| (feature_id, best_gain, best_bin))
}

fn get_best_split_bins(
    train: &TrainDataset,
    indices: &[usize],
    sum_grad: f64,
    sum_hessian: f64,
    params: &TreeParams,
) -> Option<SplitResult> {
    let best = train
        .columns
        .iter()
        .filter_map(|&feature_id| {
            let n_bins = train.n_bins[feature_id];
            let mut grads = vec![0.; n_bins];
            let mut hessians = vec![0.; n_bins];
            let (min_bin, max_bin) =
                update_grad_hessian(train, indices, feature_id, &mut grads, &mut hessians);
            calc_gain_bins(
                sum_grad,
                sum_hessian,
                params,
                feature_id,
                &grads,
                &hessians,
                min_bin,
                max_bin,
            )
        })
        .ord_subset_max_by_key(|result| result.1);
    let (feature_id, best_gain, best_bin) = best?;

    let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .cloned()
        .partition(|&i| train.bins[(i, feature_id)] as usize <= best_bin);
    let best_val = train.threshold_vals[feature_id][best_bin];
    Some(SplitResult {
        feature_id,
        best_val,
        best_gain,
        left_indices,
        right_indices,
    })
}

/// Histogram-based split finding: candidate thresholds are the edges between bins.
pub(crate) fn build_bins(
    train: &TrainDataset,
    indices: &[usize],
    predictions: &mut [f64],
    depth: usize,
    params: &TreeParams,
) -> Node {
    // If the number of indices is too small it's faster to just use the direct algorithm
    if indices.len() <= MIN_ROWS_FOR_BINNING {
        return build_direct(train, indices, predictions, depth, params);
    }
    macro_rules! return_leaf {
        () => {{
            let val = Node::calc_leaf_weight(&train.grad, &train.hessian, params.lambda, indices);
            for &i in indices {
                predictions[i] = val;
            }
            return Node::Leaf(LeafNode { val });
        }};
    }

    if depth >= params.max_depth {
        return_leaf!();
    }

    let sum_grad = sum_indices(&train.grad, indices);
    let sum_hessian = sum_indices(&train.hessian, indices);

    let best_result = match get_best_split_bins(train, indices, sum_grad, sum_hessian, params) {
        Some(e) => e,
        None => return_leaf!(),
    };

    if best_result.best_gain <= params.gamma {
        return_leaf!();
    }

    let left_child = Box::new(build_bins(
        train,
        &best_result.left_indices,
        predictions,
        depth + 1,
        params,
    ));

    let right_child = Box::new(build_bins(
        train,
        &best_result.right_indices,
        predictions,
        depth + 1,
        params,
    ));

    Node::Split(SplitNode {
        left_child,
        right_child,
        split_feature_id: best_result.feature_id,
        split_val: best_result.best_val,
    })
}
