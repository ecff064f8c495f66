use crate::{
	choose_best_split::{choose_best_split, Split},
	gini, BranchNode, LeafNode, Node, SplitDirection, TrainError, TrainOptions, Tree,
};
use ndarray::prelude::*;
use std::ops::Range;

/// A node waiting on the work stack to be turned into a branch or a leaf.
struct StackItem {
	/// The range of `examples_index` holding the examples that reach this node.
	examples_index_range: Range<usize>,
	/// The depth of the node in the tree. The root has depth 0.
	depth: usize,
	/// The branch this node is a child of, and which child it is.
	parent: Option<(usize, SplitDirection)>,
}

/// Grow a tree. Nodes are taken from an explicit work stack rather than through recursion, so the depth of the tree is bounded only by the number of examples and never by the size of the call stack.
pub fn train(
	features: ArrayView2<f32>,
	labels: &[usize],
	n_classes: usize,
	options: &TrainOptions,
) -> Result<Tree, TrainError> {
	let n_examples = features.nrows();
	let n_features = features.ncols();
	if n_examples < 2 || n_features < 1 {
		return Err(TrainError::InsufficientData {
			n_examples,
			n_features,
		});
	}
	if options.min_samples_split < 2 {
		return Err(TrainError::InvalidMinSamplesSplit(
			options.min_samples_split,
		));
	}
	if let Some(0) = options.max_depth {
		return Err(TrainError::InvalidMaxDepth(0));
	}
	if labels.len() != n_examples || labels.iter().any(|label| *label >= n_classes) {
		return Err(TrainError::InvalidLabels);
	}

	// The examples index is rearranged as the tree grows so that the examples reaching each node occupy a contiguous range.
	let mut examples_index: Vec<usize> = (0..n_examples).collect();
	let mut nodes: Vec<Node> = Vec::new();
	let mut stack = vec![StackItem {
		examples_index_range: 0..n_examples,
		depth: 0,
		parent: None,
	}];
	while let Some(item) = stack.pop() {
		let node_index = nodes.len();
		if let Some((parent_index, direction)) = item.parent {
			if let Node::Branch(parent) = &mut nodes[parent_index] {
				match direction {
					SplitDirection::Left => parent.left_child_index = node_index,
					SplitDirection::Right => parent.right_child_index = node_index,
				}
			}
		}
		let range = item.examples_index_range.clone();
		let n_examples_node = range.len();
		let class_counts = compute_class_counts(labels, &examples_index[range.clone()], n_classes);
		let impurity = gini(&class_counts, n_examples_node);

		let is_pure = class_counts.iter().filter(|count| **count > 0).count() <= 1;
		let max_depth_reached = options
			.max_depth
			.map(|max_depth| item.depth >= max_depth)
			.unwrap_or(false);
		let split = if is_pure || n_examples_node < options.min_samples_split || max_depth_reached
		{
			None
		} else {
			choose_best_split(
				features,
				labels,
				&examples_index[range.clone()],
				&class_counts,
				impurity,
			)
		};

		let split = match split {
			Some(split) => split,
			None => {
				nodes.push(Node::Leaf(LeafNode {
					class_counts,
					impurity,
				}));
				continue;
			}
		};

		let n_left = rearrange_examples_index(features, &split, &mut examples_index[range.clone()]);
		// Child indexes are filled in when the children are popped from the stack. Index 0 is the root, which is never a child.
		nodes.push(Node::Branch(BranchNode {
			left_child_index: 0,
			right_child_index: 0,
			feature_index: split.feature_index,
			split_value: split.split_value,
			n_examples: n_examples_node,
			impurity,
		}));
		// Push the right child first so the left subtree is built first.
		stack.push(StackItem {
			examples_index_range: range.start + n_left..range.end,
			depth: item.depth + 1,
			parent: Some((node_index, SplitDirection::Right)),
		});
		stack.push(StackItem {
			examples_index_range: range.start..range.start + n_left,
			depth: item.depth + 1,
			parent: Some((node_index, SplitDirection::Left)),
		});
	}
	Ok(Tree { nodes })
}

fn compute_class_counts(labels: &[usize], examples_index: &[usize], n_classes: usize) -> Vec<usize> {
	let mut class_counts = vec![0; n_classes];
	for example_index in examples_index {
		class_counts[labels[*example_index]] += 1;
	}
	class_counts
}

/// Rearrange `examples_index` so the examples sent left by `split` come first, keeping their relative order, and return how many were sent left.
fn rearrange_examples_index(
	features: ArrayView2<f32>,
	split: &Split,
	examples_index: &mut [usize],
) -> usize {
	let (left, right): (Vec<usize>, Vec<usize>) = examples_index
		.iter()
		.partition(|example_index| {
			features[[**example_index, split.feature_index]] <= split.split_value
		});
	let n_left = left.len();
	for (slot, example_index) in examples_index.iter_mut().zip(left.into_iter().chain(right)) {
		*slot = example_index;
	}
	n_left
}

#[cfg(test)]
fn branch(tree: &Tree, node_index: usize) -> &BranchNode {
	match &tree.nodes[node_index] {
		Node::Branch(branch) => branch,
		Node::Leaf(_) => panic!("node {} is a leaf", node_index),
	}
}

#[test]
fn test_single_split() {
	let (features, labels, _) = crate::loan_features();
	let options = TrainOptions {
		max_depth: Some(1),
		..Default::default()
	};
	let tree = train(features.view(), &labels, 2, &options).unwrap();
	assert_eq!(tree.node_count(), 3);
	assert_eq!(tree.n_leaves(), 2);
	assert_eq!(tree.depth(), 1);
	let root = branch(&tree, 0);
	// Both features separate the classes perfectly, so the lowest feature index wins.
	assert_eq!(root.feature_index, 0);
	assert_eq!(root.split_value, 655.0);
	assert_eq!(root.left_child_index, 1);
	assert_eq!(root.right_child_index, 2);
	match (&tree.nodes[1], &tree.nodes[2]) {
		(Node::Leaf(left), Node::Leaf(right)) => {
			assert_eq!(left.class_counts, vec![0, 5]);
			assert_eq!(right.class_counts, vec![5, 0]);
		}
		_ => panic!("expected two leaves"),
	}
}

#[test]
fn test_nodes_are_in_depth_first_order() {
	let features = arr2(&[[1.0], [2.0], [3.0], [4.0], [5.0], [6.0]]);
	let labels = vec![0, 1, 0, 1, 1, 1];
	let tree = train(features.view(), &labels, 2, &TrainOptions::default()).unwrap();
	for (node_index, node) in tree.nodes.iter().enumerate() {
		if let Node::Branch(branch) = node {
			assert_eq!(branch.left_child_index, node_index + 1);
			assert!(branch.right_child_index > branch.left_child_index);
		}
	}
	// With no depth limit every leaf is pure.
	for node in tree.nodes.iter() {
		if let Node::Leaf(leaf) = node {
			assert_eq!(leaf.impurity, 0.0);
		}
	}
}

#[test]
fn test_min_samples_split() {
	let (features, labels, _) = crate::loan_features();
	let options = TrainOptions {
		max_depth: None,
		min_samples_split: 11,
	};
	let tree = train(features.view(), &labels, 2, &options).unwrap();
	assert_eq!(tree.node_count(), 1);
	assert_eq!(tree.n_leaves(), 1);
	assert_eq!(tree.depth(), 0);
}

#[test]
fn test_constant_features_make_a_leaf() {
	let features = arr2(&[[1.0], [1.0], [1.0], [1.0]]);
	let labels = vec![0, 1, 0, 1];
	let tree = train(features.view(), &labels, 2, &TrainOptions::default()).unwrap();
	assert_eq!(tree.node_count(), 1);
}

#[test]
fn test_invalid_options() {
	let (features, labels, _) = crate::loan_features();
	let options = TrainOptions {
		max_depth: None,
		min_samples_split: 1,
	};
	assert_eq!(
		train(features.view(), &labels, 2, &options).unwrap_err(),
		TrainError::InvalidMinSamplesSplit(1)
	);
	let features = arr2(&[[1.0]]);
	assert_eq!(
		train(features.view(), &[0], 2, &TrainOptions::default()).unwrap_err(),
		TrainError::InsufficientData {
			n_examples: 1,
			n_features: 1
		}
	);
}
