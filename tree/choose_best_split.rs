use crate::gini;
use ndarray::prelude::*;
use std::cmp::Ordering;

/// A split must reduce impurity by more than this to be chosen, and a later candidate must beat the current best by more than this to replace it. This keeps ties resolved in favor of the lowest feature index and then the lowest threshold even when floating point rounding makes mathematically equal gains differ in their last bits.
const GAIN_TOLERANCE: f64 = 1e-12;

#[derive(Clone, Debug, PartialEq)]
pub struct Split {
	pub feature_index: usize,
	pub split_value: f32,
	/// The reduction in Gini impurity achieved by the split.
	pub gain: f64,
}

/// Find the split of the examples in `examples_index` that most reduces Gini impurity. The candidate thresholds for each feature are the midpoints between consecutive distinct values of that feature among the examples. Returns `None` if no split reduces impurity.
pub fn choose_best_split(
	features: ArrayView2<f32>,
	labels: &[usize],
	examples_index: &[usize],
	class_counts: &[usize],
	impurity: f64,
) -> Option<Split> {
	let n_examples = examples_index.len();
	let n_classes = class_counts.len();
	let mut best_split: Option<Split> = None;
	// This buffer is reused for each feature to hold the (feature value, label) pairs sorted by feature value.
	let mut sorted: Vec<(f32, usize)> = Vec::with_capacity(n_examples);
	let mut left_class_counts = vec![0; n_classes];
	let mut right_class_counts = vec![0; n_classes];
	for (feature_index, feature_values) in features.axis_iter(Axis(1)).enumerate() {
		sorted.clear();
		sorted.extend(
			examples_index
				.iter()
				.map(|example_index| (feature_values[*example_index], labels[*example_index])),
		);
		sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
		left_class_counts.iter_mut().for_each(|count| *count = 0);
		right_class_counts.copy_from_slice(class_counts);
		for position in 0..n_examples - 1 {
			let (value, label) = sorted[position];
			left_class_counts[label] += 1;
			right_class_counts[label] -= 1;
			let next_value = sorted[position + 1].0;
			// Thresholds only fall between distinct values.
			if value >= next_value {
				continue;
			}
			let n_left = position + 1;
			let n_right = n_examples - n_left;
			let gain = impurity
				- (n_left as f64 / n_examples as f64) * gini(&left_class_counts, n_left)
				- (n_right as f64 / n_examples as f64) * gini(&right_class_counts, n_right);
			let is_better = match &best_split {
				Some(best_split) => gain > best_split.gain + GAIN_TOLERANCE,
				None => gain > GAIN_TOLERANCE,
			};
			if is_better {
				best_split = Some(Split {
					feature_index,
					split_value: compute_split_value(value, next_value),
					gain,
				});
			}
		}
	}
	best_split
}

/// The midpoint of two consecutive distinct values. If rounding pushes the midpoint up to `next_value`, the lower value is used instead so that `next_value` is still sent right.
fn compute_split_value(value: f32, next_value: f32) -> f32 {
	let midpoint = ((f64::from(value) + f64::from(next_value)) / 2.0) as f32;
	if midpoint >= next_value {
		value
	} else {
		midpoint
	}
}

#[test]
fn test_choose_best_split() {
	let features = arr2(&[[1.0, 10.0], [2.0, 20.0], [3.0, 10.0], [4.0, 20.0]]);
	let labels = vec![0, 0, 1, 1];
	let examples_index = vec![0, 1, 2, 3];
	let split = choose_best_split(features.view(), &labels, &examples_index, &[2, 2], 0.5).unwrap();
	assert_eq!(split.feature_index, 0);
	assert_eq!(split.split_value, 2.5);
	assert_eq!(split.gain, 0.5);
}

#[test]
fn test_ties_go_to_the_lowest_threshold() {
	// Splitting at 1.5 and at 2.5 both isolate one example of class 1 from a 2/1 mix.
	let features = arr2(&[[1.0], [2.0], [3.0]]);
	let labels = vec![1, 0, 1];
	let examples_index = vec![0, 1, 2];
	let impurity = gini(&[1, 2], 3);
	let split =
		choose_best_split(features.view(), &labels, &examples_index, &[1, 2], impurity).unwrap();
	assert_eq!(split.split_value, 1.5);
}

#[test]
fn test_no_useful_split() {
	let features = arr2(&[[1.0], [2.0], [1.0], [2.0]]);
	let labels = vec![0, 0, 1, 1];
	let examples_index = vec![0, 1, 2, 3];
	let split = choose_best_split(features.view(), &labels, &examples_index, &[2, 2], 0.5);
	assert_eq!(split, None);
}

#[test]
fn test_split_value_never_reaches_the_next_value() {
	let value = 1.0f32;
	let next_value = f32::from_bits(value.to_bits() + 1);
	assert_eq!(compute_split_value(value, next_value), value);
	assert_eq!(compute_split_value(1.0, 2.0), 1.5);
}
