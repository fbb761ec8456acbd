use crate::tree_bin::build_bins;
use crate::tree_direct::build_direct;
use crate::{
    sum_indices, ColumnMajorMatrix, StridedVecView, TrainDataset, DEFAULT_GAMMA, DEFAULT_LAMBDA,
    DEFAULT_MAX_DEPTH, DEFAULT_MIN_CHILD_WEIGHT,
};
use rayon::prelude::*;

/// Parameters of a single regression tree.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TreeParams {
    /// Minimum gain for splitting a node
    pub gamma: f64,
    /// L2 regularization of the leaf values
    pub lambda: f64,
    /// Depth after which we only create leaves. `usize::MAX` for unlimited depth
    pub max_depth: usize,
    /// Minimum sum of hessians (ie of the weights for a squared loss) in a child
    pub min_child_weight: f64,
}

impl TreeParams {
    pub fn new() -> Self {
        TreeParams {
            gamma: DEFAULT_GAMMA,
            lambda: DEFAULT_LAMBDA,
            max_depth: DEFAULT_MAX_DEPTH,
            min_child_weight: DEFAULT_MIN_CHILD_WEIGHT,
        }
    }

    /// Trees grown until their leaves are pure, like in a random forest.
    pub fn fully_grown() -> Self {
        TreeParams {
            gamma: 0.,
            lambda: 0.,
            max_depth: usize::MAX,
            min_child_weight: 0.,
        }
    }
}

impl Default for TreeParams {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SplitNode {
    pub(crate) left_child: Box<Node>,
    pub(crate) right_child: Box<Node>,
    pub(crate) split_feature_id: usize,
    pub(crate) split_val: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeafNode {
    pub(crate) val: f64,
}

/// Regression tree. Rows with `feature <= split_val` go to the left child.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Split(SplitNode),
    Leaf(LeafNode),
}

/// Store the result of a successful split on a node
pub(crate) struct SplitResult {
    pub(crate) feature_id: usize,
    pub(crate) best_val: f64,
    pub(crate) best_gain: f64,
    pub(crate) left_indices: Vec<usize>,
    pub(crate) right_indices: Vec<usize>,
}

impl Node {
    /// Loss reduction
    /// (Refer to Eq7 of Reference[1])
    pub(crate) fn calc_split_gain(g: f64, h: f64, g_l: f64, h_l: f64, lambda: f64) -> f64 {
        fn calc_term(g: f64, h: f64, lambda: f64) -> f64 {
            if h + lambda <= 0. {
                return 0.;
            }
            g.powi(2) / (h + lambda)
        }
        let g_r = g - g_l;
        let h_r = h - h_l;
        calc_term(g_l, h_l, lambda) + calc_term(g_r, h_r, lambda) - calc_term(g, h, lambda)
    }

    /// A split is only possible if both children have enough weight.
    pub(crate) fn is_valid_split(h: f64, h_l: f64, params: &TreeParams) -> bool {
        let h_r = h - h_l;
        h_l > 0. && h_r > 0. && h_l >= params.min_child_weight && h_r >= params.min_child_weight
    }

    /// Calculate the optimal weight of this leaf node.
    /// (Refer to Eq5 of Reference[1])
    pub(crate) fn calc_leaf_weight(
        grad: &[f64],
        hessian: &[f64],
        lambda: f64,
        indices: &[usize],
    ) -> f64 {
        let h = sum_indices(hessian, indices) + lambda;
        if h <= 0. {
            return 0.;
        }
        sum_indices(grad, indices) / h
    }

    /// Build a tree on the given rows. `predictions` is filled with the value of the leaf of
    /// every row in `indices`.
    pub(crate) fn build_from_train_data(
        train: &TrainDataset,
        indices: &[usize],
        predictions: &mut [f64],
        params: &TreeParams,
    ) -> Node {
        if train.binned {
            build_bins(train, indices, predictions, 0, params)
        } else {
            build_direct(train, indices, predictions, 0, params)
        }
    }

    /// Multiply all the leaves by alpha.
    pub(crate) fn apply_shrinking(&mut self, alpha: f64) {
        match self {
            Node::Split(split) => {
                split.left_child.apply_shrinking(alpha);
                split.right_child.apply_shrinking(alpha);
            }
            Node::Leaf(leaf) => leaf.val *= alpha,
        }
    }

    pub fn predict(&self, features: &StridedVecView<f64>) -> f64 {
        match self {
            Node::Split(split) => {
                let val = features[split.split_feature_id];
                if val <= split.split_val {
                    split.left_child.predict(features)
                } else {
                    split.right_child.predict(features)
                }
            }
            Node::Leaf(leaf) => leaf.val,
        }
    }

    pub fn par_predict(&self, features: &ColumnMajorMatrix<f64>) -> Vec<f64> {
        (0..features.n_rows())
            .into_par_iter()
            .map(|i| self.predict(&features.row(i)))
            .collect()
    }

    pub fn depth(&self) -> usize {
        match self {
            Node::Split(split) => 1 + split.left_child.depth().max(split.right_child.depth()),
            Node::Leaf(_) => 0,
        }
    }

    pub fn n_leaves(&self) -> usize {
        match self {
            Node::Split(split) => split.left_child.n_leaves() + split.right_child.n_leaves(),
            Node::Leaf(_) => 1,
        }
    }
}
