use crate::{Classifier, Node};

/// These are the options passed to `Classifier::export_text`.
#[derive(Clone, Debug)]
pub struct ExportTextOptions {
	/// Branches deeper than this are summarized by a single "truncated branch" line.
	pub max_depth: usize,
	/// The number of decimal places split values are printed with.
	pub decimals: usize,
}

impl Default for ExportTextOptions {
	fn default() -> Self {
		Self {
			max_depth: 10,
			decimals: 2,
		}
	}
}

const SPACING: usize = 3;

impl Classifier {
	/**
	Render the tree as indented text, one line per branch direction and one line per leaf, in the following form:

	```text
	|--- credit_score <= 655.00
	|   |--- class: Denied
	|--- credit_score >  655.00
	|   |--- class: Approved
	```
	*/
	pub fn export_text(&self, feature_names: &[String], options: &ExportTextOptions) -> String {
		let mut text = String::new();
		if !self.tree.nodes.is_empty() {
			self.export_node(&mut text, feature_names, options, 0, 1);
		}
		text
	}

	fn export_node(
		&self,
		text: &mut String,
		feature_names: &[String],
		options: &ExportTextOptions,
		node_index: usize,
		depth: usize,
	) {
		let indent = format!("{}{}", "|   ".repeat(depth - 1), "|---");
		let node = &self.tree.nodes[node_index];
		if depth > options.max_depth + 1 {
			// Deep subtrees are summarized, counting the node itself as one level.
			let subtree_depth = self.tree.subtree_depth(node_index) + 1;
			if subtree_depth > 1 {
				text.push_str(&format!(
					"{} truncated branch of depth {}\n",
					indent, subtree_depth
				));
				return;
			}
		}
		match node {
			Node::Branch(branch) => {
				let feature_name = feature_names
					.get(branch.feature_index)
					.cloned()
					.unwrap_or_else(|| format!("feature_{}", branch.feature_index));
				let split_value = format!("{:.*}", options.decimals, branch.split_value);
				text.push_str(&format!("{} {} <= {}\n", indent, feature_name, split_value));
				self.export_node(
					text,
					feature_names,
					options,
					branch.left_child_index,
					depth + 1,
				);
				text.push_str(&format!("{} {} >  {}\n", indent, feature_name, split_value));
				self.export_node(
					text,
					feature_names,
					options,
					branch.right_child_index,
					depth + 1,
				);
			}
			Node::Leaf(leaf) => {
				let class = self
					.classes
					.get(leaf.majority_class())
					.map(|class| class.as_str())
					.unwrap_or("");
				text.push_str(&format!("{} class: {}\n", indent, class));
			}
		}
	}
}

#[cfg(test)]
use ndarray::prelude::*;

#[test]
fn test_export_text() {
	let (features, labels, classes) = crate::loan_features();
	let classifier = Classifier::train(
		features.view(),
		&labels,
		classes,
		&crate::TrainOptions::default(),
	)
	.unwrap();
	let feature_names = vec!["credit_score".to_owned(), "debt_ratio".to_owned()];
	let text = classifier.export_text(&feature_names, &ExportTextOptions::default());
	assert_eq!(
		text,
		concat!(
			"|--- credit_score <= 655.00\n",
			"|   |--- class: Denied\n",
			"|--- credit_score >  655.00\n",
			"|   |--- class: Approved\n",
		)
	);
}

#[test]
fn test_export_text_truncates_deep_branches() {
	let features = arr2(&[[1.0], [2.0], [3.0], [4.0], [5.0], [6.0]]);
	let labels = vec![0, 1, 0, 1, 1, 1];
	let classes = vec!["a".to_owned(), "b".to_owned()];
	let classifier = Classifier::train(
		features.view(),
		&labels,
		classes,
		&crate::TrainOptions::default(),
	)
	.unwrap();
	let options = ExportTextOptions {
		max_depth: 1,
		decimals: 2,
	};
	let text = classifier.export_text(&["x".to_owned()], &options);
	assert_eq!(
		text,
		concat!(
			"|--- x <= 3.50\n",
			"|   |--- x <= 1.50\n",
			"|   |   |--- class: a\n",
			"|   |--- x >  1.50\n",
			"|   |   |--- truncated branch of depth 2\n",
			"|--- x >  3.50\n",
			"|   |--- class: b\n",
		)
	);
}
