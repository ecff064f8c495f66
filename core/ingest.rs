use dendron_dataframe::{ColumnType, DataFrame, Value};
use dendron_features::{ColumnRole, EncodingTable};
use num_traits::ToPrimitive;
use std::collections::BTreeMap;

/// The number of rows included in `IngestOutput::sample_rows`.
pub const SAMPLE_ROW_COUNT: usize = 5;

/// A summary of an uploaded dataset.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct IngestOutput {
	/// The column names, in csv order.
	pub columns: Vec<String>,
	/// The inferred dtype of each column: `int64`, `float64` or `object`.
	pub dtypes: BTreeMap<String, String>,
	/// The first rows of the dataset, with numbers as json numbers and missing cells as null.
	pub sample_rows: Vec<BTreeMap<String, serde_json::Value>>,
	/// For each column that would be encoded as categorical, its values in first-seen order.
	pub categorical_columns: BTreeMap<String, Vec<String>>,
	pub row_count: usize,
}

pub fn ingest(dataframe: &DataFrame) -> IngestOutput {
	let columns = dataframe
		.column_names()
		.into_iter()
		.map(|name| name.to_owned())
		.collect();
	let dtypes = dataframe
		.columns
		.iter()
		.map(|column| (column.name.clone(), column.dtype.to_string()))
		.collect();
	let sample_rows = (0..dataframe.nrows().min(SAMPLE_ROW_COUNT))
		.map(|row_index| {
			dataframe
				.columns
				.iter()
				.zip(dataframe.row(row_index))
				.map(|(column, value)| (column.name.clone(), value_to_json(column.dtype, value)))
				.collect()
		})
		.collect();
	let categorical_columns = dataframe
		.columns
		.iter()
		.filter(|column| ColumnRole::infer(column) == ColumnRole::Categorical)
		.map(|column| (column.name.clone(), EncodingTable::fit(column).values))
		.collect();
	IngestOutput {
		columns,
		dtypes,
		sample_rows,
		categorical_columns,
		row_count: dataframe.nrows(),
	}
}

fn value_to_json(dtype: ColumnType, value: Value) -> serde_json::Value {
	match value {
		Value::Missing => serde_json::Value::Null,
		Value::Number(value) => match (dtype, value.to_i64()) {
			(ColumnType::Integer, Some(value)) => serde_json::Value::from(value),
			_ => serde_json::Value::from(value),
		},
		Value::Text(value) => serde_json::Value::from(value),
	}
}

#[test]
fn test_ingest() {
	let dataframe = DataFrame::from_bytes(crate::test_data::LOAN_CSV.as_bytes()).unwrap();
	let output = ingest(&dataframe);
	assert_eq!(output.row_count, 20);
	assert_eq!(
		output.columns,
		vec![
			"age",
			"income",
			"education_years",
			"debt_ratio",
			"credit_score",
			"job_type",
			"home_status",
			"loan_approved",
		]
	);
	assert_eq!(output.dtypes["income"], "int64");
	assert_eq!(output.dtypes["debt_ratio"], "float64");
	assert_eq!(output.dtypes["job_type"], "object");
	assert_eq!(output.sample_rows.len(), SAMPLE_ROW_COUNT);
	assert_eq!(
		output.sample_rows[0]["credit_score"],
		serde_json::json!(720)
	);
	assert_eq!(output.sample_rows[0]["debt_ratio"], serde_json::json!(0.25));
	assert_eq!(
		output.sample_rows[0]["job_type"],
		serde_json::json!("Professional")
	);
	// education_years is numeric but has only 9 distinct values.
	assert_eq!(
		output.categorical_columns.keys().collect::<Vec<_>>(),
		vec!["education_years", "home_status", "job_type", "loan_approved"]
	);
	assert_eq!(
		output.categorical_columns["home_status"],
		vec!["Own", "Rent", "Mortgage"]
	);
}

#[test]
fn test_missing_cells_are_null() {
	let dataframe = DataFrame::from_bytes(b"a,b\n1,x\nN/A,y\n").unwrap();
	let output = ingest(&dataframe);
	assert_eq!(output.sample_rows[1]["a"], serde_json::Value::Null);
	assert_eq!(output.dtypes["a"], "float64");
}
