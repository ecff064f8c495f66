use crate::{
	config::Config,
	error::{Error, ParameterError, SchemaError},
};
use dendron_dataframe::{Column, DataFrame};
use dendron_features::{ColumnEncoder, Encoder, LabelEncoder};
use dendron_metrics::{
	Accuracy, ClassificationMetrics, ClassificationMetricsInput, StreamingMetric,
};
use dendron_tree::{Classifier, ExportTextOptions, TrainError, TrainOptions};
use itertools::izip;
use ndarray::prelude::*;
use num_traits::ToPrimitive;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use std::collections::HashSet;

/// The parameters of a training run. Only the target and feature columns are required; every other field has a default.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrainParams {
	pub target_column: String,
	/// The feature columns, in the order their values appear in every feature row.
	pub feature_columns: Vec<String>,
	/// The fraction of rows held out to evaluate the model.
	#[serde(default = "default_test_size")]
	pub test_size: f64,
	#[serde(default)]
	pub max_depth: Option<usize>,
	#[serde(default = "default_min_samples_split")]
	pub min_samples_split: usize,
	/// The seed of the shuffle that assigns rows to the train and test partitions.
	#[serde(default = "default_random_state")]
	pub random_state: u64,
}

fn default_test_size() -> f64 {
	0.2
}

fn default_min_samples_split() -> usize {
	2
}

fn default_random_state() -> u64 {
	42
}

impl TrainParams {
	pub fn new(target_column: String, feature_columns: Vec<String>) -> TrainParams {
		TrainParams {
			target_column,
			feature_columns,
			test_size: default_test_size(),
			max_depth: None,
			min_samples_split: default_min_samples_split(),
			random_state: default_random_state(),
		}
	}

	/// Override the defaults with the values set in `config`.
	pub fn with_config(mut self, config: &Config) -> TrainParams {
		if let Some(test_size) = config.test_size {
			self.test_size = test_size;
		}
		if let Some(max_depth) = config.max_depth {
			self.max_depth = Some(max_depth);
		}
		if let Some(min_samples_split) = config.min_samples_split {
			self.min_samples_split = min_samples_split;
		}
		if let Some(random_state) = config.random_state {
			self.random_state = random_state;
		}
		self
	}
}

/// A trained model: the encoder and the classifier from the same training run, along with the name of the column it predicts.
#[derive(Clone, Debug)]
pub struct Model {
	pub target_name: String,
	pub encoder: Encoder,
	pub classifier: Classifier,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TrainOutput {
	/// The accuracy on the test partition.
	pub accuracy: f32,
	pub classification_report: ClassificationReport,
	pub tree_depth: usize,
	pub node_count: usize,
	pub feature_importance: Vec<FeatureImportance>,
	/// The tree rendered as indented text.
	pub tree_text: String,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct FeatureImportance {
	pub feature: String,
	pub importance: f64,
}

/// Precision, recall and f1 on the test partition, per class and averaged. Only classes that occur in the test labels or the predictions are reported and averaged.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ClassificationReport {
	pub classes: Vec<ClassReport>,
	pub accuracy: f32,
	/// The accuracy of always predicting the most common test label.
	pub baseline_accuracy: f32,
	pub macro_avg: AverageReport,
	pub weighted_avg: AverageReport,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ClassReport {
	pub label: String,
	pub precision: f32,
	pub recall: f32,
	pub f1_score: f32,
	pub support: u64,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct AverageReport {
	pub precision: f32,
	pub recall: f32,
	pub f1_score: f32,
	pub support: u64,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ModelInfo {
	pub feature_names: Vec<String>,
	pub target_name: String,
	pub tree_depth: usize,
	pub node_count: usize,
	pub leaf_count: usize,
	pub feature_importance: Vec<FeatureImportance>,
	pub class_labels: Vec<String>,
}

impl Model {
	pub fn feature_importance(&self) -> Vec<FeatureImportance> {
		izip!(
			self.encoder.feature_names(),
			self.classifier.feature_importances.iter()
		)
		.map(|(feature, importance)| FeatureImportance {
			feature,
			importance: *importance,
		})
		.collect()
	}

	pub fn info(&self) -> ModelInfo {
		ModelInfo {
			feature_names: self.encoder.feature_names(),
			target_name: self.target_name.clone(),
			tree_depth: self.classifier.tree.depth(),
			node_count: self.classifier.tree.node_count(),
			leaf_count: self.classifier.tree.n_leaves(),
			feature_importance: self.feature_importance(),
			class_labels: self.classifier.classes.clone(),
		}
	}
}

/// Train a model on `dataframe`. Everything that can be checked up front is checked before any work is done: the parameters, then the column names, then the amount of data.
pub fn train(dataframe: &DataFrame, params: &TrainParams) -> Result<(Model, TrainOutput), Error> {
	validate_params(params)?;
	let (target_column, feature_columns) = resolve_columns(dataframe, params)?;
	let n_rows = dataframe.nrows();
	if n_rows < 2 || feature_columns.is_empty() {
		return Err(ParameterError::InsufficientData {
			n_rows,
			n_features: feature_columns.len(),
		}
		.into());
	}

	// Fit the encoders on the whole dataset so that every category and class is known to the model.
	let encoder = Encoder::fit(&feature_columns);
	for column_encoder in encoder.column_encoders.iter() {
		log::debug!(
			"feature \"{}\" is {}",
			column_encoder.column_name(),
			match column_encoder {
				ColumnEncoder::Numeric(_) => "numeric".to_owned(),
				ColumnEncoder::Categorical(encoder) =>
					format!("categorical with {} categories", encoder.table.len()),
			}
		);
	}
	let features = encoder.encode_columns(&feature_columns)?;
	let label_encoder = LabelEncoder::fit(target_column);
	let labels = label_encoder.encode_column(target_column)?;

	let (train_index, test_index) = train_test_split(n_rows, params.test_size, params.random_state);
	if train_index.len() < 2 {
		return Err(ParameterError::InsufficientData {
			n_rows: train_index.len(),
			n_features: feature_columns.len(),
		}
		.into());
	}
	let features_train = features.select(Axis(0), &train_index);
	let labels_train: Vec<usize> = train_index.iter().map(|index| labels[*index]).collect();

	let options = TrainOptions {
		max_depth: params.max_depth,
		min_samples_split: params.min_samples_split,
	};
	let classifier = Classifier::train(
		features_train.view(),
		&labels_train,
		label_encoder.classes.clone(),
		&options,
	)
	.map_err(|error| match error {
		TrainError::InvalidMinSamplesSplit(value) => ParameterError::InvalidMinSamplesSplit(value),
		TrainError::InvalidMaxDepth(value) => ParameterError::InvalidMaxDepth(value),
		TrainError::InsufficientData {
			n_examples,
			n_features,
		} => ParameterError::InsufficientData {
			n_rows: n_examples,
			n_features,
		},
		TrainError::InvalidLabels => ParameterError::InsufficientData {
			n_rows: train_index.len(),
			n_features: feature_columns.len(),
		},
	})?;
	if classifier.tree.node_count() == 1 {
		log::warn!("no split reduced impurity, the tree is a single leaf");
	}

	let model = Model {
		target_name: params.target_column.clone(),
		encoder,
		classifier,
	};
	let classification_report = evaluate(&model, features.view(), &labels, &test_index);
	log::info!(
		"trained a tree with {} nodes, {} leaves and depth {} on {} rows, accuracy on {} test rows is {:.4}",
		model.classifier.tree.node_count(),
		model.classifier.tree.n_leaves(),
		model.classifier.tree.depth(),
		train_index.len(),
		test_index.len(),
		classification_report.accuracy,
	);
	let output = TrainOutput {
		accuracy: classification_report.accuracy,
		classification_report,
		tree_depth: model.classifier.tree.depth(),
		node_count: model.classifier.tree.node_count(),
		feature_importance: model.feature_importance(),
		tree_text: model
			.classifier
			.export_text(&model.encoder.feature_names(), &ExportTextOptions::default()),
	};
	Ok((model, output))
}

fn validate_params(params: &TrainParams) -> Result<(), ParameterError> {
	if !(params.test_size > 0.0 && params.test_size < 1.0) {
		return Err(ParameterError::InvalidTestSize(params.test_size));
	}
	if params.min_samples_split < 2 {
		return Err(ParameterError::InvalidMinSamplesSplit(
			params.min_samples_split,
		));
	}
	if let Some(0) = params.max_depth {
		return Err(ParameterError::InvalidMaxDepth(0));
	}
	Ok(())
}

/// Look up the target and feature columns by name.
fn resolve_columns<'a>(
	dataframe: &'a DataFrame,
	params: &TrainParams,
) -> Result<(&'a Column, Vec<&'a Column>), SchemaError> {
	let target_column = dataframe
		.column(&params.target_column)
		.ok_or_else(|| SchemaError::UnknownTargetColumn(params.target_column.clone()))?;
	let mut seen = HashSet::new();
	let mut feature_columns = Vec::with_capacity(params.feature_columns.len());
	for name in params.feature_columns.iter() {
		if *name == params.target_column {
			return Err(SchemaError::TargetInFeatures(name.clone()));
		}
		if !seen.insert(name.as_str()) {
			return Err(SchemaError::DuplicateFeatureColumn(name.clone()));
		}
		let column = dataframe
			.column(name)
			.ok_or_else(|| SchemaError::UnknownFeatureColumn(name.clone()))?;
		feature_columns.push(column);
	}
	Ok((target_column, feature_columns))
}

/// Shuffle the row indexes with a generator seeded by `random_state` and split them. The first `ceil(test_size * n_rows)` shuffled rows are the test partition and the rest are the train partition. Returns `(train_index, test_index)`.
pub fn train_test_split(n_rows: usize, test_size: f64, random_state: u64) -> (Vec<usize>, Vec<usize>) {
	let mut index: Vec<usize> = (0..n_rows).collect();
	let mut rng = Xoshiro256Plus::seed_from_u64(random_state);
	index.shuffle(&mut rng);
	let n_test = (test_size * n_rows as f64)
		.ceil()
		.to_usize()
		.unwrap_or(0)
		.min(n_rows);
	let train_index = index.split_off(n_test);
	(train_index, index)
}

fn evaluate(
	model: &Model,
	features: ArrayView2<f32>,
	labels: &[usize],
	test_index: &[usize],
) -> ClassificationReport {
	let classes = &model.classifier.classes;
	let predictions: Vec<usize> = test_index
		.iter()
		.map(|index| {
			let row = features.row(*index).to_vec();
			model.classifier.predict_class(&row)
		})
		.collect();
	let labels: Vec<usize> = test_index.iter().map(|index| labels[*index]).collect();
	let mut accuracy = Accuracy::new();
	for (prediction, label) in izip!(predictions.iter(), labels.iter()) {
		accuracy.update((*prediction, *label));
	}
	let mut metrics = ClassificationMetrics::new(classes.len());
	metrics.update(ClassificationMetricsInput {
		predictions: &predictions,
		labels: &labels,
	});
	let metrics = metrics.finalize();
	let class_reports = izip!(classes.iter(), metrics.class_metrics.iter())
		.filter(|(_, class_metrics)| class_metrics.is_present())
		.map(|(label, class_metrics)| ClassReport {
			label: label.clone(),
			precision: class_metrics.precision,
			recall: class_metrics.recall,
			f1_score: class_metrics.f1_score,
			support: class_metrics.support,
		})
		.collect();
	ClassificationReport {
		classes: class_reports,
		accuracy: accuracy.finalize().unwrap_or(0.0),
		baseline_accuracy: metrics.baseline_accuracy,
		macro_avg: AverageReport {
			precision: metrics.macro_average.precision,
			recall: metrics.macro_average.recall,
			f1_score: metrics.macro_average.f1_score,
			support: metrics.n_examples,
		},
		weighted_avg: AverageReport {
			precision: metrics.weighted_average.precision,
			recall: metrics.weighted_average.recall,
			f1_score: metrics.weighted_average.f1_score,
			support: metrics.n_examples,
		},
	}
}

#[cfg(test)]
fn loan_dataframe() -> DataFrame {
	DataFrame::from_bytes(crate::test_data::LOAN_CSV.as_bytes()).unwrap()
}

#[cfg(test)]
fn params(target_column: &str, feature_columns: &[&str]) -> TrainParams {
	TrainParams::new(
		target_column.to_owned(),
		feature_columns.iter().map(|name| (*name).to_owned()).collect(),
	)
}

#[test]
fn test_train_test_split() {
	let (train_index, test_index) = train_test_split(20, 0.2, 42);
	assert_eq!(train_index.len(), 16);
	assert_eq!(test_index.len(), 4);
	let mut all: Vec<usize> = train_index.iter().chain(test_index.iter()).cloned().collect();
	all.sort_unstable();
	assert_eq!(all, (0..20).collect::<Vec<_>>());
	assert_eq!(train_test_split(20, 0.2, 42), (train_index, test_index));
	// The test partition is rounded up.
	assert_eq!(train_test_split(3, 0.2, 0).1.len(), 1);
}

#[test]
fn test_train_with_max_depth_one() {
	let dataframe = loan_dataframe();
	let mut params = params("loan_approved", &["credit_score", "debt_ratio"]);
	params.max_depth = Some(1);
	let (model, output) = train(&dataframe, &params).unwrap();
	assert_eq!(output.node_count, 3);
	assert_eq!(output.tree_depth, 1);
	assert_eq!(model.classifier.classes, vec!["Approved", "Denied"]);
	assert!(output.accuracy >= 0.0 && output.accuracy <= 1.0);
	assert_eq!(output.classification_report.macro_avg.support, 4);
	// Both features separate the classes, so the first one is chosen.
	assert!(output.tree_text.starts_with("|--- credit_score <= "));
	assert_eq!(
		output.feature_importance,
		vec![
			FeatureImportance {
				feature: "credit_score".to_owned(),
				importance: 1.0,
			},
			FeatureImportance {
				feature: "debt_ratio".to_owned(),
				importance: 0.0,
			},
		]
	);
}

#[test]
fn test_report_leaves_out_classes_absent_from_the_test_partition() {
	let mut csv = "x,y\n".to_owned();
	for _ in 0..10 {
		csv.push_str("1,a\n");
	}
	for _ in 0..10 {
		csv.push_str("5,b\n");
	}
	csv.push_str("9,c\n");
	let dataframe = DataFrame::from_bytes(csv.as_bytes()).unwrap();
	let (model, _) = train(&dataframe, &params("y", &["x"])).unwrap();
	assert_eq!(model.classifier.classes, vec!["a", "b", "c"]);
	let x = dataframe.column("x").unwrap();
	let features = model.encoder.encode_columns(&[x]).unwrap();
	let labels = LabelEncoder::fit(dataframe.column("y").unwrap())
		.encode_column(dataframe.column("y").unwrap())
		.unwrap();
	// One row of a and one row of b, no row of c.
	let report = evaluate(&model, features.view(), &labels, &[0, 10]);
	let reported: Vec<&str> = report
		.classes
		.iter()
		.map(|class| class.label.as_str())
		.collect();
	assert_eq!(reported, vec!["a", "b"]);
	assert_eq!(report.accuracy, 1.0);
	assert_eq!(report.baseline_accuracy, 0.5);
	assert_eq!(
		report.macro_avg,
		AverageReport {
			precision: 1.0,
			recall: 1.0,
			f1_score: 1.0,
			support: 2,
		}
	);
	assert_eq!(report.weighted_avg.f1_score, 1.0);
}

#[test]
fn test_feature_importance_sums_to_one() {
	let dataframe = loan_dataframe();
	let params = params(
		"loan_approved",
		&["age", "income", "job_type", "home_status"],
	);
	let (model, _) = train(&dataframe, &params).unwrap();
	let total: f64 = model
		.feature_importance()
		.iter()
		.map(|feature_importance| feature_importance.importance)
		.sum();
	assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn test_schema_errors() {
	let dataframe = loan_dataframe();
	let cases = vec![
		(
			params("approved", &["age"]),
			SchemaError::UnknownTargetColumn("approved".to_owned()),
		),
		(
			params("loan_approved", &["age", "height"]),
			SchemaError::UnknownFeatureColumn("height".to_owned()),
		),
		(
			params("loan_approved", &["age", "loan_approved"]),
			SchemaError::TargetInFeatures("loan_approved".to_owned()),
		),
		(
			params("loan_approved", &["age", "age"]),
			SchemaError::DuplicateFeatureColumn("age".to_owned()),
		),
	];
	for (params, expected) in cases {
		match train(&dataframe, &params) {
			Err(Error::Schema(error)) => assert_eq!(error, expected),
			other => panic!("expected a schema error, got {:?}", other.map(|_| ())),
		}
	}
}

#[test]
fn test_parameter_errors() {
	let dataframe = loan_dataframe();
	let mut invalid = params("loan_approved", &["age"]);
	invalid.test_size = 1.0;
	assert!(matches!(
		train(&dataframe, &invalid),
		Err(Error::Parameter(ParameterError::InvalidTestSize(_)))
	));
	let mut invalid = params("loan_approved", &["age"]);
	invalid.min_samples_split = 1;
	assert!(matches!(
		train(&dataframe, &invalid),
		Err(Error::Parameter(ParameterError::InvalidMinSamplesSplit(1)))
	));
	let mut invalid = params("loan_approved", &["age"]);
	invalid.max_depth = Some(0);
	assert!(matches!(
		train(&dataframe, &invalid),
		Err(Error::Parameter(ParameterError::InvalidMaxDepth(0)))
	));
	assert!(matches!(
		train(&dataframe, &params("loan_approved", &[])),
		Err(Error::Parameter(ParameterError::InsufficientData { n_features: 0, .. }))
	));
}

#[test]
fn test_single_row_dataset() {
	let csv = "credit_score,loan_approved\n720,Approved\n";
	let dataframe = DataFrame::from_bytes(csv.as_bytes()).unwrap();
	let error = train(&dataframe, &params("loan_approved", &["credit_score"])).unwrap_err();
	assert!(matches!(
		error,
		Error::Parameter(ParameterError::InsufficientData { n_rows: 1, .. })
	));
}

#[test]
fn test_not_numeric_cell_fails_training() {
	let csv = crate::test_data::LOAN_CSV.replace("27,33000,", "27,N/A,");
	let dataframe = DataFrame::from_bytes(csv.as_bytes()).unwrap();
	let error = train(&dataframe, &params("loan_approved", &["income", "age"])).unwrap_err();
	assert_eq!(
		error.to_string(),
		"feature \"income\" expected a numeric value but got \"N/A\""
	);
	assert_eq!(error.kind(), crate::ErrorKind::Encoding);
}

#[test]
fn test_with_config() {
	let config = Config {
		test_size: Some(0.3),
		max_depth: Some(4),
		min_samples_split: None,
		random_state: None,
	};
	let params = params("loan_approved", &["age"]).with_config(&config);
	assert_eq!(params.test_size, 0.3);
	assert_eq!(params.max_depth, Some(4));
	assert_eq!(params.min_samples_split, 2);
	assert_eq!(params.random_state, 42);
}
