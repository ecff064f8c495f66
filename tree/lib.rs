/*!
This crate implements a single CART classification tree: binary splits on numeric thresholds, chosen greedily to maximize the reduction in Gini impurity.

Features are `f32` values, one column per feature. Categorical features are expected to arrive already encoded as category indexes, so every split in the tree is a threshold split of the form `value <= split_value`.

The trained tree is stored as a flat `Vec` of nodes addressed by index, with the root at index 0. Nodes are appended in depth-first order, left subtree first, and children are always created after their parent, so the tree can never contain a cycle.
*/

#![allow(clippy::tabs_in_doc_comments)]

use ndarray::prelude::*;
use thiserror::Error;

mod choose_best_split;
mod export_text;
mod feature_importances;
mod predict;
mod train;

pub use self::export_text::ExportTextOptions;
pub use self::predict::{Decision, Prediction};

/// These are the options passed to `Classifier::train`.
#[derive(Clone, Debug)]
pub struct TrainOptions {
	/// The depth of the tree will never exceed this value. If it is `None`, nodes are split until they are pure or too small to split.
	pub max_depth: Option<usize>,
	/// A node with fewer training examples than this will not be split.
	pub min_samples_split: usize,
}

impl Default for TrainOptions {
	fn default() -> Self {
		Self {
			max_depth: None,
			min_samples_split: 2,
		}
	}
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrainError {
	#[error("at least 2 training rows and 1 feature are required, got {n_examples} rows and {n_features} features")]
	InsufficientData {
		n_examples: usize,
		n_features: usize,
	},
	#[error("min_samples_split must be at least 2, got {0}")]
	InvalidMinSamplesSplit(usize),
	#[error("max_depth must be at least 1, got {0}")]
	InvalidMaxDepth(usize),
	#[error("labels must have one entry per row with values below the number of classes")]
	InvalidLabels,
}

/// This struct is a trained classification tree along with the class names its leaves count.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Classifier {
	/// The tree's nodes.
	pub tree: Tree,
	/// The names of the classes. Leaf class counts and predicted probabilities are indexed in this order.
	pub classes: Vec<String>,
	/// The importance of each feature, measured as the share of the total weighted impurity reduction achieved by branches that split on it. The importances sum to 1, or are all zero if the tree has no branches.
	pub feature_importances: Vec<f64>,
}

/// Trees are stored as a `Vec` of `Node`s. Each branch in the tree has two indexes into the `Vec`, one for each of its children.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Tree {
	pub nodes: Vec<Node>,
}

/// A node is either a branch or a leaf.
#[derive(Clone, Debug, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
	Branch(BranchNode),
	Leaf(LeafNode),
}

/// A `BranchNode` is a branch in a tree. An example whose value for `feature_index` is <= `split_value` is sent to the left child, and any other example is sent to the right child.
#[derive(Clone, Debug, serde::Serialize)]
pub struct BranchNode {
	/// This is the index in the tree's node vector for this node's left child.
	pub left_child_index: usize,
	/// This is the index in the tree's node vector for this node's right child.
	pub right_child_index: usize,
	/// This is the index of the feature to get the value for.
	pub feature_index: usize,
	/// This is the threshold value of the split.
	pub split_value: f32,
	/// This is the number of training examples that reached this node.
	pub n_examples: usize,
	/// This is the Gini impurity of the training examples that reached this node.
	pub impurity: f64,
}

/// The leaves in a tree hold the class distribution of the training examples that reached them.
#[derive(Clone, Debug, serde::Serialize)]
pub struct LeafNode {
	/// The number of training examples of each class that reached this leaf.
	pub class_counts: Vec<usize>,
	/// This is the Gini impurity of the training examples that reached this leaf.
	pub impurity: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitDirection {
	Left,
	Right,
}

impl Classifier {
	/// Train a classifier. `features` has shape (n_examples, n_features) and `labels` holds the class index of each example, where class indexes refer to `classes`.
	pub fn train(
		features: ArrayView2<f32>,
		labels: &[usize],
		classes: Vec<String>,
		options: &TrainOptions,
	) -> Result<Classifier, TrainError> {
		let tree = train::train(features, labels, classes.len(), options)?;
		let feature_importances =
			feature_importances::compute_feature_importances(&tree, features.ncols());
		Ok(Classifier {
			tree,
			classes,
			feature_importances,
		})
	}

	pub fn n_classes(&self) -> usize {
		self.classes.len()
	}
}

impl Tree {
	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	pub fn n_leaves(&self) -> usize {
		self.nodes
			.iter()
			.filter(|node| matches!(node, Node::Leaf(_)))
			.count()
	}

	/// The depth of the deepest leaf. A tree with a single leaf has depth 0.
	pub fn depth(&self) -> usize {
		self.subtree_depth(0)
	}

	/// The depth of the subtree rooted at `node_index`, where a leaf has depth 0.
	pub fn subtree_depth(&self, node_index: usize) -> usize {
		let mut max_depth = 0;
		let mut stack = vec![(node_index, 0)];
		while let Some((node_index, depth)) = stack.pop() {
			match &self.nodes[node_index] {
				Node::Branch(branch) => {
					stack.push((branch.left_child_index, depth + 1));
					stack.push((branch.right_child_index, depth + 1));
				}
				Node::Leaf(_) => max_depth = max_depth.max(depth),
			}
		}
		max_depth
	}
}

impl Node {
	pub fn n_examples(&self) -> usize {
		match self {
			Node::Branch(branch) => branch.n_examples,
			Node::Leaf(leaf) => leaf.n_examples(),
		}
	}

	pub fn impurity(&self) -> f64 {
		match self {
			Node::Branch(branch) => branch.impurity,
			Node::Leaf(leaf) => leaf.impurity,
		}
	}
}

impl LeafNode {
	pub fn n_examples(&self) -> usize {
		self.class_counts.iter().sum()
	}

	/// The class with the most training examples at this leaf. Ties go to the class with the lowest index.
	pub fn majority_class(&self) -> usize {
		let mut majority_class = 0;
		for (class_index, count) in self.class_counts.iter().enumerate() {
			if *count > self.class_counts[majority_class] {
				majority_class = class_index;
			}
		}
		majority_class
	}

	/// The fraction of training examples at this leaf belonging to each class.
	pub fn probabilities(&self) -> Vec<f32> {
		let n_examples = self.n_examples();
		if n_examples == 0 {
			return vec![0.0; self.class_counts.len()];
		}
		self.class_counts
			.iter()
			.map(|count| *count as f32 / n_examples as f32)
			.collect()
	}
}

/// Compute the Gini impurity `1 - Σ p_c²` of a class distribution.
pub fn gini(class_counts: &[usize], n_examples: usize) -> f64 {
	if n_examples == 0 {
		return 0.0;
	}
	let n_examples = n_examples as f64;
	1.0 - class_counts
		.iter()
		.map(|count| {
			let p = *count as f64 / n_examples;
			p * p
		})
		.sum::<f64>()
}

#[cfg(test)]
pub(crate) fn loan_features() -> (Array2<f32>, Vec<usize>, Vec<String>) {
	// credit_score, debt_ratio
	let features = arr2(&[
		[720.0, 0.25],
		[580.0, 0.55],
		[690.0, 0.31],
		[610.0, 0.62],
		[750.0, 0.18],
		[540.0, 0.71],
		[700.0, 0.35],
		[630.0, 0.48],
		[680.0, 0.29],
		[560.0, 0.66],
	]);
	// 0 = Approved, 1 = Denied
	let labels = vec![0, 1, 0, 1, 0, 1, 0, 1, 0, 1];
	let classes = vec!["Approved".to_owned(), "Denied".to_owned()];
	(features, labels, classes)
}

#[test]
fn test_gini() {
	assert_eq!(gini(&[5, 5], 10), 0.5);
	assert_eq!(gini(&[10, 0], 10), 0.0);
	assert_eq!(gini(&[], 0), 0.0);
}

#[test]
fn test_leaf_majority_class_ties_go_to_lowest_index() {
	let leaf = LeafNode {
		class_counts: vec![0, 3, 3],
		impurity: 0.5,
	};
	assert_eq!(leaf.majority_class(), 1);
	assert_eq!(leaf.probabilities(), vec![0.0, 0.5, 0.5]);
}
