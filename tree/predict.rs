use crate::{Classifier, LeafNode, Node, SplitDirection, Tree};

/// A `Decision` records one branch an example passed through on its way to a leaf.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Decision {
	pub node_index: usize,
	pub feature_index: usize,
	/// The example's value for the feature the branch splits on.
	pub feature_value: f32,
	pub split_value: f32,
	pub direction: SplitDirection,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Prediction {
	/// The index into `Classifier::classes` of the predicted class.
	pub class_index: usize,
	/// The class distribution of the leaf the example reached, in the order of `Classifier::classes`.
	pub probabilities: Vec<f32>,
	/// The branches visited from the root to the leaf, in order.
	pub decisions: Vec<Decision>,
}

impl Tree {
	/// Walk from the root to a leaf. `features` must have a value for every feature the tree was trained with.
	pub fn decision_path(&self, features: &[f32]) -> (&LeafNode, Vec<Decision>) {
		let mut decisions = Vec::new();
		// Start at the root node.
		let mut node_index = 0;
		loop {
			match &self.nodes[node_index] {
				Node::Branch(branch) => {
					let feature_value = features[branch.feature_index];
					let direction = if feature_value <= branch.split_value {
						SplitDirection::Left
					} else {
						SplitDirection::Right
					};
					decisions.push(Decision {
						node_index,
						feature_index: branch.feature_index,
						feature_value,
						split_value: branch.split_value,
						direction,
					});
					node_index = match direction {
						SplitDirection::Left => branch.left_child_index,
						SplitDirection::Right => branch.right_child_index,
					};
				}
				Node::Leaf(leaf) => return (leaf, decisions),
			}
		}
	}
}

impl Classifier {
	/// Predict the class of a single example along with its class probabilities and the path it took through the tree.
	pub fn predict(&self, features: &[f32]) -> Prediction {
		let (leaf, decisions) = self.tree.decision_path(features);
		Prediction {
			class_index: leaf.majority_class(),
			probabilities: leaf.probabilities(),
			decisions,
		}
	}

	pub fn predict_class(&self, features: &[f32]) -> usize {
		self.tree.decision_path(features).0.majority_class()
	}
}

#[cfg(test)]
fn loan_classifier() -> Classifier {
	let (features, labels, classes) = crate::loan_features();
	Classifier::train(
		features.view(),
		&labels,
		classes,
		&crate::TrainOptions::default(),
	)
	.unwrap()
}

#[test]
fn test_predict() {
	let classifier = loan_classifier();
	let prediction = classifier.predict(&[710.0, 0.3]);
	assert_eq!(classifier.classes[prediction.class_index], "Approved");
	assert_eq!(prediction.probabilities, vec![1.0, 0.0]);
	assert_eq!(
		prediction.decisions,
		vec![Decision {
			node_index: 0,
			feature_index: 0,
			feature_value: 710.0,
			split_value: 655.0,
			direction: SplitDirection::Right,
		}]
	);
}

#[test]
fn test_value_equal_to_the_split_value_goes_left() {
	let classifier = loan_classifier();
	let prediction = classifier.predict(&[655.0, 0.3]);
	assert_eq!(prediction.decisions[0].direction, SplitDirection::Left);
	assert_eq!(classifier.classes[prediction.class_index], "Denied");
}

#[test]
fn test_predict_is_deterministic() {
	let classifier = loan_classifier();
	let features = [600.0, 0.2];
	assert_eq!(classifier.predict(&features), classifier.predict(&features));
	assert_eq!(
		classifier.predict_class(&features),
		classifier.predict(&features).class_index
	);
}

#[test]
fn test_probabilities_sum_to_one() {
	use ndarray::prelude::*;
	let features = arr2(&[[1.0], [1.0], [1.0], [2.0], [2.0], [2.0]]);
	let labels = vec![0, 1, 1, 2, 2, 2];
	let classes = vec!["a".to_owned(), "b".to_owned(), "c".to_owned()];
	let classifier = Classifier::train(
		features.view(),
		&labels,
		classes,
		&crate::TrainOptions::default(),
	)
	.unwrap();
	let prediction = classifier.predict(&[1.0]);
	let total: f32 = prediction.probabilities.iter().sum();
	assert!((total - 1.0).abs() < 1e-6);
	assert_eq!(prediction.class_index, 1);
}
