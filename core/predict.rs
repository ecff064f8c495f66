use crate::{
	error::{Error, SchemaError},
	train::Model,
};
use dendron_features::{json_to_string, ColumnEncoder};
use dendron_tree::SplitDirection;
use itertools::izip;
use num_traits::ToPrimitive;
use std::collections::BTreeMap;

/// A prediction request maps each feature name to its value. Values may be json numbers or strings, and a numeric string is accepted for a numeric feature.
pub type PredictRequest = BTreeMap<String, serde_json::Value>;

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct PredictOutput {
	pub predicted_label: String,
	pub class_labels: Vec<String>,
	/// The probability of each class, keyed by class label. Every class the model knows has an entry.
	pub class_probabilities: BTreeMap<String, f32>,
	/// One line per branch visited, from the root to the leaf.
	pub decision_path: Vec<String>,
	pub decisions: Vec<DecisionOutput>,
}

/// A branch visited while predicting, with the feature value translated back to what the request contained.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct DecisionOutput {
	pub feature: String,
	/// The request's value for the feature. For categorical features this is the category label.
	pub value: String,
	/// The category index the value was encoded as, for categorical features.
	pub category_index: Option<usize>,
	pub threshold: f32,
	pub direction: SplitDirection,
}

pub fn predict(model: &Model, request: &PredictRequest) -> Result<PredictOutput, Error> {
	let feature_names = model.encoder.feature_names();
	let values = feature_names
		.iter()
		.map(|name| {
			request
				.get(name)
				.ok_or_else(|| SchemaError::MissingFeature(name.clone()))
		})
		.collect::<Result<Vec<_>, _>>()?;
	let row = model.encoder.encode_row(&values)?;
	let prediction = model.classifier.predict(&row);
	let decisions = prediction
		.decisions
		.iter()
		.map(|decision| -> Result<DecisionOutput, Error> {
			let feature = feature_names[decision.feature_index].clone();
			match &model.encoder.column_encoders[decision.feature_index] {
				ColumnEncoder::Categorical(encoder) => {
					let value = encoder.decode_feature_value(decision.feature_value)?;
					Ok(DecisionOutput {
						feature,
						value: value.to_owned(),
						category_index: decision.feature_value.to_usize(),
						threshold: decision.split_value,
						direction: decision.direction,
					})
				}
				ColumnEncoder::Numeric(_) => Ok(DecisionOutput {
					feature,
					value: json_to_string(values[decision.feature_index]),
					category_index: None,
					threshold: decision.split_value,
					direction: decision.direction,
				}),
			}
		})
		.collect::<Result<Vec<_>, Error>>()?;
	let decision_path = decisions.iter().map(DecisionOutput::to_string).collect();
	let class_labels = model.classifier.classes.clone();
	let class_probabilities = izip!(class_labels.iter(), prediction.probabilities.iter())
		.map(|(label, probability)| (label.clone(), *probability))
		.collect();
	Ok(PredictOutput {
		predicted_label: class_labels[prediction.class_index].clone(),
		class_labels,
		class_probabilities,
		decision_path,
		decisions,
	})
}

impl std::fmt::Display for DecisionOutput {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let (comparison, direction) = match self.direction {
			SplitDirection::Left => ("<=", "left"),
			SplitDirection::Right => (">", "right"),
		};
		match self.category_index {
			Some(category_index) => write!(
				f,
				"{} = '{}' (category index: {}) {} {:.2} (go {})",
				self.feature, self.value, category_index, comparison, self.threshold, direction
			),
			None => write!(
				f,
				"{} = {} {} {:.2} (go {})",
				self.feature, self.value, comparison, self.threshold, direction
			),
		}
	}
}

#[cfg(test)]
fn loan_model(feature_columns: &[&str], max_depth: Option<usize>) -> Model {
	let dataframe =
		dendron_dataframe::DataFrame::from_bytes(crate::test_data::LOAN_CSV.as_bytes()).unwrap();
	let mut params = crate::TrainParams::new(
		"loan_approved".to_owned(),
		feature_columns.iter().map(|name| (*name).to_owned()).collect(),
	);
	params.max_depth = max_depth;
	crate::train::train(&dataframe, &params).unwrap().0
}

#[test]
fn test_numeric_decision_path() {
	let model = loan_model(&["credit_score", "debt_ratio"], Some(1));
	let request = maplit::btreemap! {
		"credit_score".to_owned() => serde_json::json!(720),
		"debt_ratio".to_owned() => serde_json::json!(0.25),
	};
	let output = predict(&model, &request).unwrap();
	assert_eq!(output.predicted_label, "Approved");
	assert_eq!(output.class_labels, vec!["Approved", "Denied"]);
	assert_eq!(
		output.class_probabilities,
		maplit::btreemap! {
			"Approved".to_owned() => 1.0,
			"Denied".to_owned() => 0.0,
		}
	);
	assert_eq!(output.decision_path.len(), 1);
	assert!(output.decision_path[0].starts_with("credit_score = 720 > "));
	assert!(output.decision_path[0].ends_with(" (go right)"));
	assert_eq!(output.decisions[0].direction, SplitDirection::Right);
	assert_eq!(output.decisions[0].category_index, None);
}

#[test]
fn test_categorical_decision_path() {
	let model = loan_model(&["job_type"], None);
	let request = maplit::btreemap! {
		"job_type".to_owned() => serde_json::json!("Management"),
	};
	let output = predict(&model, &request).unwrap();
	assert_eq!(output.predicted_label, "Approved");
	assert!(!output.decision_path.is_empty());
	for line in output.decision_path.iter() {
		assert!(line.starts_with("job_type = 'Management' (category index: 3) "));
	}
	for decision in output.decisions.iter() {
		assert_eq!(decision.value, "Management");
		assert_eq!(decision.category_index, Some(3));
	}
}

#[test]
fn test_decision_display() {
	let decision = DecisionOutput {
		feature: "job_type".to_owned(),
		value: "Service".to_owned(),
		category_index: Some(3),
		threshold: 2.5,
		direction: SplitDirection::Left,
	};
	assert_eq!(
		decision.to_string(),
		"job_type = 'Service' (category index: 3) <= 2.50 (go left)"
	);
	let decision = DecisionOutput {
		feature: "credit_score".to_owned(),
		value: "720".to_owned(),
		category_index: None,
		threshold: 650.5,
		direction: SplitDirection::Right,
	};
	assert_eq!(decision.to_string(), "credit_score = 720 > 650.50 (go right)");
}

#[test]
fn test_unknown_category() {
	let model = loan_model(&["credit_score", "job_type"], None);
	let request = maplit::btreemap! {
		"credit_score".to_owned() => serde_json::json!(700),
		"job_type".to_owned() => serde_json::json!("Astronaut"),
	};
	let error = predict(&model, &request).unwrap_err();
	assert_eq!(error.kind(), crate::ErrorKind::Encoding);
	assert_eq!(
		error.to_string(),
		"value \"Astronaut\" for feature \"job_type\" was not in the training data, allowed values: [\"Professional\", \"Service\", \"Technical\", \"Management\", \"Office\"]"
	);
}

#[test]
fn test_missing_feature() {
	let model = loan_model(&["credit_score", "job_type"], None);
	let request = maplit::btreemap! {
		"credit_score".to_owned() => serde_json::json!(700),
	};
	match predict(&model, &request) {
		Err(Error::Schema(error)) => {
			assert_eq!(error, SchemaError::MissingFeature("job_type".to_owned()))
		}
		other => panic!("expected a schema error, got {:?}", other),
	}
}

#[test]
fn test_predict_is_deterministic() {
	let model = loan_model(&["age", "income", "job_type", "home_status"], None);
	let request = maplit::btreemap! {
		"age".to_owned() => serde_json::json!(40),
		"income".to_owned() => serde_json::json!("52000"),
		"job_type".to_owned() => serde_json::json!("Office"),
		"home_status".to_owned() => serde_json::json!("Own"),
	};
	let first = predict(&model, &request).unwrap();
	let second = predict(&model, &request).unwrap();
	assert_eq!(first, second);
	let total: f32 = first.class_probabilities.values().sum();
	assert!((total - 1.0).abs() < 1e-6);
	assert!(first
		.class_probabilities
		.values()
		.all(|probability| (0.0..=1.0).contains(probability)));
	let labels: Vec<&String> = first.class_probabilities.keys().collect();
	assert_eq!(labels, vec!["Approved", "Denied"]);
}
