use crate::tree::SplitResult;
use crate::{split_value, sum_indices, LeafNode, Node, SplitNode, TrainDataset, TreeParams};
use ord_subset::OrdSubsetIterExt;
use std::f64::INFINITY;

fn calc_gain_direct(
    train: &TrainDataset,
    indices: &[usize],
    sum_grad: f64,
    sum_hessian: f64,
    params: &TreeParams,
    feature_id: usize,
) -> Option<SplitResult> {
    // sorted_instance_ids = instances[:, feature_id].argsort()
    let mut sorted_instance_ids = indices.to_vec();
    sorted_instance_ids.sort_unstable_by_key(|&row_id| train.features_rank[(row_id, feature_id)]);

    let mut grad_left = 0.;
    let mut hessian_left = 0.;
    let mut best_gain = -INFINITY;
    let mut best_idx = None;
    let mut best_val = 0.;

    // The potential split is before the current row, so we have to skip the first
    for idx in 1..sorted_instance_ids.len() {
        let last_row = sorted_instance_ids[idx - 1];
        let row = sorted_instance_ids[idx];
        grad_left += train.grad[last_row];
        hessian_left += train.hessian[last_row];

        // We can only split when the value change
        if train.features_rank[(row, feature_id)] == train.features_rank[(last_row, feature_id)] {
            continue;
        }
        if !Node::is_valid_split(sum_hessian, hessian_left, params) {
            continue;
        }
        let current_gain =
            Node::calc_split_gain(sum_grad, sum_hessian, grad_left, hessian_left, params.lambda);
        if current_gain > best_gain {
            best_gain = current_gain;
            best_idx = Some(idx);
            best_val = split_value(
                train.features[(last_row, feature_id)],
                train.features[(row, feature_id)],
            );
        }
    }

    let best_idx = best_idx?;
    let (left_indices, right_indices) = sorted_instance_ids.split_at(best_idx);
    Some(SplitResult {
        feature_id,
        best_val,
        best_gain,
        left_indices: left_indices.to_vec(),
        right_indices: right_indices.to_vec(),
    })
}

fn get_best_split_direct(
    train: &TrainDataset,
    indices: &[usize],
    sum_grad: f64,
    sum_hessian: f64,
    params: &TreeParams,
) -> Option<SplitResult> {
    train
        .columns
        .iter()
        .filter_map(|&feature_id| {
            calc_gain_direct(train, indices, sum_grad, sum_hessian, params, feature_id)
        })
        .ord_subset_max_by_key(|result| result.best_gain)
}

/// Exact Greedy Algorithm for Split Finding
///  (Refer to Algorithm1 of Reference[1])
pub(crate) fn build_direct(
    train: &TrainDataset,
    indices: &[usize],
    predictions: &mut [f64],
    depth: usize,
    params: &TreeParams,
) -> Node {
    macro_rules! return_leaf {
        () => {{
            let val = Node::calc_leaf_weight(&train.grad, &train.hessian, params.lambda, indices);
            for &i in indices {
                predictions[i] = val;
            }
            return Node::Leaf(LeafNode { val });
        }};
    }

    if depth >= params.max_depth || indices.len() < 2 {
        return_leaf!();
    }

    let sum_grad = sum_indices(&train.grad, indices);
    let sum_hessian = sum_indices(&train.hessian, indices);

    let best_result = match get_best_split_direct(train, indices, sum_grad, sum_hessian, params) {
        Some(e) => e,
        None => return_leaf!(),
    };

    if best_result.best_gain <= params.gamma {
        return_leaf!();
    }

    let left_child = Box::new(build_direct(
        train,
        &best_result.left_indices,
        predictions,
        depth + 1,
        params,
    ));

    let right_child = Box::new(build_direct(
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
