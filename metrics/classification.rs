use super::StreamingMetric;
use itertools::izip;
use ndarray::prelude::*;

/// `ClassificationMetrics` accumulates a confusion matrix from (prediction, label) pairs of class indexes and summarizes it as a per-class precision, recall and f1 report.
pub struct ClassificationMetrics {
	/// The shape of the confusion matrix is (n_classes x n_classes).
	confusion_matrix: Array2<u64>,
}

pub struct ClassificationMetricsInput<'a> {
	/// (n_examples), 0-indexed
	pub predictions: &'a [usize],
	/// (n_examples), 0-indexed
	pub labels: &'a [usize],
}

#[derive(Debug)]
pub struct ClassificationMetricsOutput {
	pub class_metrics: Vec<ClassMetrics>,
	pub n_examples: u64,
	/// The unweighted mean of the metrics of the classes that are present.
	pub macro_average: AverageMetrics,
	/// The mean of the per-class metrics weighted by each class's support.
	pub weighted_average: AverageMetrics,
	/// The accuracy of always predicting the most common class.
	pub baseline_accuracy: f32,
}

#[derive(Debug)]
pub struct ClassMetrics {
	pub true_positives: u64,
	pub false_positives: u64,
	pub true_negatives: u64,
	pub false_negatives: u64,
	/// The number of examples whose label is this class.
	pub support: u64,
	pub precision: f32,
	pub recall: f32,
	pub f1_score: f32,
}

impl ClassMetrics {
	/// A class is present if it occurs as a label or as a prediction at least once. Absent classes are left out of the report averages.
	pub fn is_present(&self) -> bool {
		self.support > 0 || self.true_positives + self.false_positives > 0
	}
}

#[derive(Debug)]
pub struct AverageMetrics {
	pub precision: f32,
	pub recall: f32,
	pub f1_score: f32,
}

impl ClassificationMetrics {
	pub fn new(n_classes: usize) -> Self {
		//                                           prediction    label
		//                                               |           |
		//                                               v           v
		let confusion_matrix = <Array2<u64>>::zeros((n_classes, n_classes));
		Self { confusion_matrix }
	}
}

impl<'a> StreamingMetric<'a> for ClassificationMetrics {
	type Input = ClassificationMetricsInput<'a>;
	type Output = ClassificationMetricsOutput;

	fn update(&mut self, input: Self::Input) {
		for (prediction, label) in izip!(input.predictions.iter(), input.labels.iter()) {
			self.confusion_matrix[(*prediction, *label)] += 1;
		}
	}

	fn merge(&mut self, other: Self) {
		self.confusion_matrix += &other.confusion_matrix;
	}

	fn finalize(self) -> ClassificationMetricsOutput {
		let n_classes = self.confusion_matrix.nrows();
		let n_examples = self.confusion_matrix.sum();
		let confusion_matrix = self.confusion_matrix;
		let class_metrics: Vec<_> = (0..n_classes)
			.map(|class_index| {
				let true_positives = confusion_matrix[(class_index, class_index)];
				let false_positives = confusion_matrix.row(class_index).sum() - true_positives;
				let false_negatives = confusion_matrix.column(class_index).sum() - true_positives;
				let true_negatives =
					n_examples - true_positives - false_positives - false_negatives;
				// A class that is never predicted has precision 0, and a class that never occurs has recall 0.
				let precision = divide(true_positives, true_positives + false_positives);
				let recall = divide(true_positives, true_positives + false_negatives);
				let f1_score = if precision + recall > 0.0 {
					2.0 * (precision * recall) / (precision + recall)
				} else {
					0.0
				};
				ClassMetrics {
					true_positives,
					false_positives,
					true_negatives,
					false_negatives,
					support: true_positives + false_negatives,
					precision,
					recall,
					f1_score,
				}
			})
			.collect();
		let present: Vec<&ClassMetrics> = class_metrics
			.iter()
			.filter(|class| class.is_present())
			.collect();
		let macro_average = AverageMetrics {
			precision: mean(present.iter().map(|class| class.precision), present.len()),
			recall: mean(present.iter().map(|class| class.recall), present.len()),
			f1_score: mean(present.iter().map(|class| class.f1_score), present.len()),
		};
		let weighted = |metric: fn(&ClassMetrics) -> f32| {
			if n_examples == 0 {
				return 0.0;
			}
			class_metrics
				.iter()
				.map(|class| metric(class) * class.support as f32)
				.sum::<f32>()
				/ n_examples as f32
		};
		let weighted_average = AverageMetrics {
			precision: weighted(|class| class.precision),
			recall: weighted(|class| class.recall),
			f1_score: weighted(|class| class.f1_score),
		};
		let baseline_accuracy = divide(
			class_metrics
				.iter()
				.map(|class| class.support)
				.max()
				.unwrap_or(0),
			n_examples,
		);
		ClassificationMetricsOutput {
			class_metrics,
			n_examples,
			macro_average,
			weighted_average,
			baseline_accuracy,
		}
	}
}

fn divide(numerator: u64, denominator: u64) -> f32 {
	if denominator == 0 {
		0.0
	} else {
		numerator as f32 / denominator as f32
	}
}

fn mean(values: impl Iterator<Item = f32>, n: usize) -> f32 {
	if n == 0 {
		0.0
	} else {
		values.sum::<f32>() / n as f32
	}
}

#[cfg(test)]
fn assert_close(actual: f32, expected: f32) {
	assert!(
		(actual - expected).abs() < 1e-5,
		"expected {} to be close to {}",
		actual,
		expected
	);
}

#[test]
fn test_binary() {
	let mut metrics = ClassificationMetrics::new(2);
	let labels = [0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1];
	let predictions = [
		0, // correct
		0, // correct
		0, // correct
		0, // correct
		0, // correct
		1, // incorrect
		1, // incorrect
		1, // incorrect
		1, // correct
		1, // correct
		1, // correct
		0, // incorrect
		0, // incorrect
	];
	metrics.update(ClassificationMetricsInput {
		predictions: &predictions,
		labels: &labels,
	});
	let metrics = metrics.finalize();
	assert_eq!(metrics.n_examples, 13);
	let cat = &metrics.class_metrics[0];
	assert_eq!(
		(
			cat.true_positives,
			cat.false_positives,
			cat.true_negatives,
			cat.false_negatives,
			cat.support
		),
		(5, 2, 3, 3, 8)
	);
	assert_close(cat.precision, 5.0 / 7.0);
	assert_close(cat.recall, 5.0 / 8.0);
	assert_close(cat.f1_score, 2.0 / 3.0);
	let dog = &metrics.class_metrics[1];
	assert_eq!(dog.support, 5);
	assert_close(dog.precision, 0.5);
	assert_close(dog.recall, 0.6);
	assert_close(metrics.macro_average.precision, (5.0 / 7.0 + 0.5) / 2.0);
	assert_close(metrics.macro_average.recall, 0.6125);
	assert_close(metrics.weighted_average.recall, 8.0 / 13.0);
	assert_close(metrics.baseline_accuracy, 8.0 / 13.0);
}

#[test]
fn test_multiclass() {
	// example taken from https://en.wikipedia.org/wiki/Confusion_matrix
	let mut metrics = ClassificationMetrics::new(3);
	let labels = [
		0, 0, 0, 0, 0, 1, 1, 0, 0, 0, 1, 1, 1, 2, 2, 1, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2,
	];
	let predictions = [
		0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2,
	];
	// Split the input in two to exercise merge.
	let mut first = ClassificationMetrics::new(3);
	first.update(ClassificationMetricsInput {
		predictions: &predictions[..10],
		labels: &labels[..10],
	});
	metrics.update(ClassificationMetricsInput {
		predictions: &predictions[10..],
		labels: &labels[10..],
	});
	metrics.merge(first);
	let metrics = metrics.finalize();
	let supports: Vec<u64> = metrics
		.class_metrics
		.iter()
		.map(|class| class.support)
		.collect();
	assert_eq!(supports, vec![8, 6, 13]);
	let rabbit = &metrics.class_metrics[2];
	assert_eq!(
		(
			rabbit.true_positives,
			rabbit.false_positives,
			rabbit.true_negatives,
			rabbit.false_negatives
		),
		(11, 1, 13, 2)
	);
	assert_close(rabbit.f1_score, 0.88);
	assert_close(metrics.weighted_average.recall, 19.0 / 27.0);
	assert_close(metrics.baseline_accuracy, 13.0 / 27.0);
}

#[test]
fn test_zero_division() {
	let mut metrics = ClassificationMetrics::new(3);
	// Class 2 never occurs and is never predicted.
	metrics.update(ClassificationMetricsInput {
		predictions: &[0, 0, 1],
		labels: &[0, 1, 1],
	});
	let metrics = metrics.finalize();
	let unused = &metrics.class_metrics[2];
	assert_eq!(unused.support, 0);
	assert_eq!(unused.precision, 0.0);
	assert_eq!(unused.recall, 0.0);
	assert_eq!(unused.f1_score, 0.0);
	assert!(!unused.is_present());
	// Class 1 occurs twice and is predicted once.
	let missed = &metrics.class_metrics[1];
	assert!(missed.is_present());
	assert_close(missed.precision, 1.0);
	assert_close(missed.recall, 0.5);
	let empty = ClassificationMetrics::new(2).finalize();
	assert_eq!(empty.macro_average.f1_score, 0.0);
	assert_eq!(empty.weighted_average.f1_score, 0.0);
}

#[test]
fn test_absent_classes_are_left_out_of_the_averages() {
	let mut metrics = ClassificationMetrics::new(3);
	// Class 2 never occurs and is never predicted.
	metrics.update(ClassificationMetricsInput {
		predictions: &[0, 0, 1],
		labels: &[0, 1, 1],
	});
	let metrics = metrics.finalize();
	// Class 0 has precision 1/2 and recall 1, class 1 has precision 1 and recall 1/2.
	assert_close(metrics.macro_average.precision, 0.75);
	assert_close(metrics.macro_average.recall, 0.75);
	assert_close(metrics.macro_average.f1_score, 2.0 / 3.0);
	assert_close(metrics.weighted_average.recall, 2.0 / 3.0);
	// A class that is only ever predicted is present.
	let mut metrics = ClassificationMetrics::new(3);
	metrics.update(ClassificationMetricsInput {
		predictions: &[0, 2],
		labels: &[0, 0],
	});
	let metrics = metrics.finalize();
	assert!(metrics.class_metrics[2].is_present());
	assert!(!metrics.class_metrics[1].is_present());
	assert_close(metrics.macro_average.precision, 0.5);
	assert_close(metrics.macro_average.recall, 0.25);
}
