/*!
This crate turns the raw string cells of a dataframe into the numeric feature matrix a decision tree is trained on, and turns a single prediction request into a feature row in exactly the same way.

Each feature column gets a [`ColumnEncoder`](enum.ColumnEncoder.html) when the [`Encoder`](struct.Encoder.html) is fit. The encoder's [`ColumnRole`](enum.ColumnRole.html) is decided once, from the whole training column, and is never revisited when encoding a request.

| role        | training cell | feature value                      |
|-------------|---------------|------------------------------------|
| numeric     | "0.35"        | 0.35                               |
| numeric     | "N/A"         | error: not numeric                 |
| categorical | "Service"     | index of "Service" in the table    |
| categorical | "Astronaut"   | error: unknown category            |
*/

use dendron_dataframe::Column;
#[cfg(test)]
use dendron_dataframe::DataFrame;
use ndarray::prelude::*;
use thiserror::Error;

mod categorical;
mod label;
mod numeric;

pub use self::categorical::{CategoricalColumnEncoder, EncodingTable};
pub use self::label::LabelEncoder;
pub use self::numeric::NumericColumnEncoder;

/// Numeric columns with fewer distinct values than this are treated as categorical. This is a policy, not a guarantee: a continuous feature that happens to take few distinct values in the training data will be encoded as categories.
pub const CATEGORICAL_MAX_UNIQUE_VALUES: usize = 10;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EncodingError {
	#[error("value \"{value}\" for feature \"{column}\" was not in the training data, allowed values: {}", format_allowed(.allowed))]
	UnknownCategory {
		column: String,
		value: String,
		allowed: Vec<String>,
	},
	#[error("feature \"{column}\" expected a numeric value but got \"{value}\"")]
	NotNumeric { column: String, value: String },
	#[error("code {code} is not a valid category index for feature \"{column}\"")]
	InvalidCode { column: String, code: usize },
	#[error("value \"{value}\" of target \"{column}\" is not one of the model's classes")]
	UnknownClass { column: String, value: String },
}

fn format_allowed(allowed: &[String]) -> String {
	let allowed: Vec<String> = allowed.iter().map(|value| format!("\"{}\"", value)).collect();
	format!("[{}]", allowed.join(", "))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
	Categorical,
	Numeric,
}

impl ColumnRole {
	/// A column is categorical if its values are not numbers or if it has fewer than `CATEGORICAL_MAX_UNIQUE_VALUES` distinct values.
	pub fn infer(column: &Column) -> ColumnRole {
		if !column.is_numeric() || column.n_unique() < CATEGORICAL_MAX_UNIQUE_VALUES {
			ColumnRole::Categorical
		} else {
			ColumnRole::Numeric
		}
	}
}

/// A `ColumnEncoder` describes how one feature column is converted to `f32` feature values.
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnEncoder {
	Numeric(NumericColumnEncoder),
	Categorical(CategoricalColumnEncoder),
}

impl ColumnEncoder {
	/// Choose the role for `column` and build the matching encoder.
	pub fn fit(column: &Column) -> ColumnEncoder {
		match ColumnRole::infer(column) {
			ColumnRole::Numeric => ColumnEncoder::Numeric(NumericColumnEncoder {
				column_name: column.name.clone(),
			}),
			ColumnRole::Categorical => {
				ColumnEncoder::Categorical(CategoricalColumnEncoder::fit(column))
			}
		}
	}

	pub fn column_name(&self) -> &str {
		match self {
			ColumnEncoder::Numeric(encoder) => &encoder.column_name,
			ColumnEncoder::Categorical(encoder) => &encoder.column_name,
		}
	}

	pub fn role(&self) -> ColumnRole {
		match self {
			ColumnEncoder::Numeric(_) => ColumnRole::Numeric,
			ColumnEncoder::Categorical(_) => ColumnRole::Categorical,
		}
	}

	pub fn encode(&self, value: &str) -> Result<f32, EncodingError> {
		match self {
			ColumnEncoder::Numeric(encoder) => encoder.encode(value),
			ColumnEncoder::Categorical(encoder) => encoder.encode(value),
		}
	}

	pub fn encode_json(&self, value: &serde_json::Value) -> Result<f32, EncodingError> {
		match self {
			ColumnEncoder::Numeric(encoder) => encoder.encode_json(value),
			ColumnEncoder::Categorical(encoder) => encoder.encode(&json_to_string(value)),
		}
	}
}

/// The `Encoder` holds one `ColumnEncoder` per feature column, in the order the feature columns were declared at training time. That order is the column order of every feature matrix and feature row it produces.
#[derive(Clone, Debug, PartialEq)]
pub struct Encoder {
	pub column_encoders: Vec<ColumnEncoder>,
}

impl Encoder {
	/// Fit an encoder for the feature `columns`, given in feature order.
	pub fn fit(columns: &[&Column]) -> Encoder {
		let column_encoders = columns
			.iter()
			.map(|column| ColumnEncoder::fit(column))
			.collect();
		Encoder { column_encoders }
	}

	pub fn n_features(&self) -> usize {
		self.column_encoders.len()
	}

	pub fn feature_names(&self) -> Vec<String> {
		self.column_encoders
			.iter()
			.map(|encoder| encoder.column_name().to_owned())
			.collect()
	}

	/// Encode the feature `columns`, given in feature order, into a matrix with shape (n_rows, n_features). The first cell that cannot be encoded aborts the whole computation.
	pub fn encode_columns(&self, columns: &[&Column]) -> Result<Array2<f32>, EncodingError> {
		let n_rows = columns.first().map(|column| column.len()).unwrap_or(0);
		let mut features = Array2::zeros((n_rows, self.n_features()));
		for (feature_index, (encoder, column)) in
			self.column_encoders.iter().zip(columns.iter()).enumerate()
		{
			for (row_index, value) in column.data.iter().enumerate() {
				features[[row_index, feature_index]] = encoder.encode(value)?;
			}
		}
		Ok(features)
	}

	/// Encode a single request row. `values` holds one value per feature, in feature order.
	pub fn encode_row(&self, values: &[&serde_json::Value]) -> Result<Vec<f32>, EncodingError> {
		self.column_encoders
			.iter()
			.zip(values.iter())
			.map(|(encoder, value)| encoder.encode_json(value))
			.collect()
	}
}

/// Render a json request value the way it would have appeared as a csv cell.
pub fn json_to_string(value: &serde_json::Value) -> String {
	match value {
		serde_json::Value::Null => String::new(),
		serde_json::Value::String(value) => value.clone(),
		value => value.to_string(),
	}
}

#[cfg(test)]
fn loan_dataframe() -> DataFrame {
	let csv = "credit_score,debt_ratio,job_type,loan_approved
720,0.25,Professional,Approved
580,0.55,Service,Denied
690,0.31,Technical,Approved
610,0.62,Service,Denied
750,0.18,Management,Approved
540,0.71,Office,Denied
700,0.35,Technical,Approved
630,0.48,Service,Denied
680,0.29,Professional,Approved
560,0.66,Office,Denied
";
	DataFrame::from_bytes(csv.as_bytes()).unwrap()
}

#[cfg(test)]
fn columns<'a>(dataframe: &'a DataFrame, names: &[&str]) -> Vec<&'a Column> {
	names
		.iter()
		.map(|name| dataframe.column(name).unwrap())
		.collect()
}

#[test]
fn test_roles() {
	let dataframe = loan_dataframe();
	let encoder = Encoder::fit(&columns(
		&dataframe,
		&["credit_score", "debt_ratio", "job_type"],
	));
	let roles: Vec<ColumnRole> = encoder
		.column_encoders
		.iter()
		.map(|encoder| encoder.role())
		.collect();
	assert_eq!(
		roles,
		vec![
			ColumnRole::Numeric,
			ColumnRole::Numeric,
			ColumnRole::Categorical
		]
	);
	assert_eq!(
		encoder.feature_names(),
		vec!["credit_score", "debt_ratio", "job_type"]
	);
}

#[test]
fn test_low_cardinality_numbers_are_categorical() {
	let csv = "rooms\n1\n2\n3\n2\n1\n";
	let dataframe = DataFrame::from_bytes(csv.as_bytes()).unwrap();
	assert_eq!(
		ColumnRole::infer(&dataframe.columns[0]),
		ColumnRole::Categorical
	);
}

#[test]
fn test_encode_columns() {
	let dataframe = loan_dataframe();
	let feature_columns = columns(&dataframe, &["job_type", "credit_score"]);
	let encoder = Encoder::fit(&feature_columns);
	let features = encoder.encode_columns(&feature_columns).unwrap();
	assert_eq!(features.dim(), (10, 2));
	assert_eq!(
		features.column(0).to_vec(),
		vec![0.0, 1.0, 2.0, 1.0, 3.0, 4.0, 2.0, 1.0, 0.0, 4.0]
	);
	assert_eq!(features[[0, 1]], 720.0);
}

#[test]
fn test_not_numeric_names_the_column() {
	let mut csv = String::from("income\n");
	for i in 0..12 {
		csv.push_str(&format!("{}\n", 40000 + i * 1000));
	}
	csv.push_str("N/A\n");
	let dataframe = DataFrame::from_bytes(csv.as_bytes()).unwrap();
	let feature_columns = columns(&dataframe, &["income"]);
	let encoder = Encoder::fit(&feature_columns);
	assert_eq!(encoder.column_encoders[0].role(), ColumnRole::Numeric);
	let error = encoder.encode_columns(&feature_columns).unwrap_err();
	assert_eq!(
		error,
		EncodingError::NotNumeric {
			column: "income".to_owned(),
			value: "N/A".to_owned(),
		}
	);
}

#[test]
fn test_encode_row() {
	let dataframe = loan_dataframe();
	let encoder = Encoder::fit(&columns(&dataframe, &["credit_score", "job_type"]));
	let credit_score = serde_json::json!(700);
	let job_type = serde_json::json!("Management");
	let row = encoder.encode_row(&[&credit_score, &job_type]).unwrap();
	assert_eq!(row, vec![700.0, 3.0]);
	let job_type = serde_json::json!("Astronaut");
	let error = encoder.encode_row(&[&credit_score, &job_type]).unwrap_err();
	assert_eq!(
		error.to_string(),
		"value \"Astronaut\" for feature \"job_type\" was not in the training data, allowed values: [\"Professional\", \"Service\", \"Technical\", \"Management\", \"Office\"]"
	);
}
