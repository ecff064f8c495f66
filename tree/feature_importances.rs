use crate::{Node, Tree};

/// This function computes feature importances using the "gain" method, where a feature's importance is the total impurity reduction achieved by the branches that split on it, each weighted by the fraction of training examples reaching the branch. The importances are normalized to sum to 1. If the tree has no branches, every importance is 0.
pub fn compute_feature_importances(tree: &Tree, n_features: usize) -> Vec<f64> {
	let mut feature_importances = vec![0.0; n_features];
	let n_root_examples = match tree.nodes.first() {
		Some(root) => root.n_examples() as f64,
		None => return feature_importances,
	};
	for node in tree.nodes.iter() {
		if let Node::Branch(branch) = node {
			let left = &tree.nodes[branch.left_child_index];
			let right = &tree.nodes[branch.right_child_index];
			let n_examples = branch.n_examples as f64;
			let weighted_child_impurity = (left.n_examples() as f64 / n_examples)
				* left.impurity()
				+ (right.n_examples() as f64 / n_examples) * right.impurity();
			let reduction = (branch.impurity - weighted_child_impurity).max(0.0);
			feature_importances[branch.feature_index] += (n_examples / n_root_examples) * reduction;
		}
	}
	// Normalize the feature_importances.
	let total: f64 = feature_importances.iter().sum();
	if total > 0.0 {
		for feature_importance in feature_importances.iter_mut() {
			*feature_importance /= total;
		}
	}
	feature_importances
}

#[test]
fn test_feature_importances_sum_to_one() {
	use crate::{train::train, TrainOptions};
	use ndarray::prelude::*;
	let features = arr2(&[
		[1.0, 5.0],
		[2.0, 1.0],
		[3.0, 5.0],
		[4.0, 1.0],
		[5.0, 5.0],
		[6.0, 1.0],
	]);
	let labels = vec![0, 0, 0, 1, 1, 0];
	let tree = train(features.view(), &labels, 2, &TrainOptions::default()).unwrap();
	let feature_importances = compute_feature_importances(&tree, 2);
	let total: f64 = feature_importances.iter().sum();
	assert!((total - 1.0).abs() < 1e-9);
	assert!(feature_importances.iter().all(|importance| *importance >= 0.0));
}

#[test]
fn test_feature_importances_of_a_single_split() {
	use crate::{train::train, TrainOptions};
	let (features, labels, _) = crate::loan_features();
	let tree = train(features.view(), &labels, 2, &TrainOptions::default()).unwrap();
	assert_eq!(compute_feature_importances(&tree, 2), vec![1.0, 0.0]);
}

#[test]
fn test_feature_importances_of_a_leaf() {
	use crate::{train::train, TrainOptions};
	use ndarray::prelude::*;
	let features = arr2(&[[1.0], [1.0]]);
	let tree = train(features.view(), &[0, 1], 2, &TrainOptions::default()).unwrap();
	assert_eq!(compute_feature_importances(&tree, 1), vec![0.0]);
}
