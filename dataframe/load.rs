use super::*;
use std::{collections::HashSet, path::Path};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
	#[error("failed to read csv: {0}")]
	Csv(#[from] csv::Error),
	#[error("the csv has no header row")]
	MissingHeader,
	#[error("the csv contains more than one column named \"{0}\"")]
	DuplicateColumn(String),
}

impl DataFrame {
	pub fn from_path(path: &Path) -> Result<Self, LoadError> {
		let mut reader = reader_builder().from_path(path)?;
		Self::from_csv(&mut reader)
	}

	pub fn from_bytes(bytes: &[u8]) -> Result<Self, LoadError> {
		let mut reader = reader_builder().from_reader(bytes);
		Self::from_csv(&mut reader)
	}

	/// Read every record of the csv into string columns, then infer each column's dtype from its values.
	pub fn from_csv<R>(reader: &mut csv::Reader<R>) -> Result<Self, LoadError>
	where
		R: std::io::Read,
	{
		let column_names: Vec<String> = reader
			.headers()?
			.iter()
			.map(|column_name| column_name.to_owned())
			.collect();
		if column_names.is_empty() {
			return Err(LoadError::MissingHeader);
		}
		{
			let mut seen = HashSet::new();
			for column_name in column_names.iter() {
				if !seen.insert(column_name.as_str()) {
					return Err(LoadError::DuplicateColumn(column_name.clone()));
				}
			}
		}
		let mut data: Vec<Vec<String>> = vec![Vec::new(); column_names.len()];
		let mut infer_stats = vec![InferStats::new(); column_names.len()];
		// The reader is not flexible, so every record has exactly one value per column.
		let mut record = csv::StringRecord::new();
		while reader.read_record(&mut record)? {
			for ((column, infer_stats), value) in
				data.iter_mut().zip(infer_stats.iter_mut()).zip(record.iter())
			{
				infer_stats.update(value);
				column.push(value.to_owned());
			}
		}
		let columns = column_names
			.into_iter()
			.zip(data.into_iter())
			.zip(infer_stats.into_iter())
			.map(|((name, data), infer_stats)| Column {
				name,
				dtype: infer_stats.finalize(),
				data,
			})
			.collect();
		Ok(Self { columns })
	}
}

/// Cells and headers are kept exactly as they appear, surrounding whitespace included.
fn reader_builder() -> csv::ReaderBuilder {
	csv::ReaderBuilder::new()
}

#[derive(Clone, Debug)]
struct InferStats {
	column_type: InferColumnType,
	has_missing_values: bool,
}

#[derive(PartialEq, Clone, Copy, Debug)]
enum InferColumnType {
	Unknown,
	Integer,
	Float,
	Text,
}

impl InferStats {
	fn new() -> Self {
		Self {
			column_type: InferColumnType::Unknown,
			has_missing_values: false,
		}
	}

	fn update(&mut self, value: &str) {
		if is_missing(value) {
			self.has_missing_values = true;
			return;
		}
		let is_integer = lexical::parse::<i64, _>(value).is_ok();
		let is_number = is_integer || parse_number(value).is_some();
		self.column_type = match self.column_type {
			InferColumnType::Unknown | InferColumnType::Integer if is_integer => {
				InferColumnType::Integer
			}
			InferColumnType::Unknown | InferColumnType::Integer | InferColumnType::Float
				if is_number =>
			{
				InferColumnType::Float
			}
			_ => InferColumnType::Text,
		};
	}

	fn finalize(self) -> ColumnType {
		match self.column_type {
			// Integer columns with missing values become float columns, and a column with no valid values at all is a float column of missing values.
			InferColumnType::Integer if !self.has_missing_values => ColumnType::Integer,
			InferColumnType::Unknown | InferColumnType::Integer | InferColumnType::Float => {
				ColumnType::Float
			}
			InferColumnType::Text => ColumnType::Text,
		}
	}
}

#[test]
fn test_infer() {
	let csv = "age,debt_ratio,job_type,income\n35,0.25,Service,51000\n41,N/A,Office,\n";
	let dataframe = DataFrame::from_bytes(csv.as_bytes()).unwrap();
	let dtypes: Vec<String> = dataframe
		.columns
		.iter()
		.map(|column| column.dtype.to_string())
		.collect();
	insta::assert_debug_snapshot!(dtypes, @r###"
 [
     "int64",
     "float64",
     "object",
     "float64",
 ]
 "###);
	assert_eq!(dataframe.nrows(), 2);
	assert_eq!(dataframe.columns[1].data, vec!["0.25", "N/A"]);
}

#[test]
fn test_keeps_whitespace() {
	let csv = "a, job_type\n1, Service\n";
	let dataframe = DataFrame::from_bytes(csv.as_bytes()).unwrap();
	assert_eq!(dataframe.column_names(), vec!["a", " job_type"]);
	assert_eq!(dataframe.columns[0].dtype, ColumnType::Integer);
	assert_eq!(dataframe.columns[1].data, vec![" Service"]);
	assert_eq!(dataframe.columns[1].dtype, ColumnType::Text);
}

#[test]
fn test_ragged_rows_fail() {
	let csv = "a,b\n1,2\n3\n";
	let result = DataFrame::from_bytes(csv.as_bytes());
	assert!(matches!(result, Err(LoadError::Csv(_))));
}

#[test]
fn test_duplicate_columns_fail() {
	let csv = "a,a\n1,2\n";
	let result = DataFrame::from_bytes(csv.as_bytes());
	assert!(matches!(result, Err(LoadError::DuplicateColumn(name)) if name == "a"));
}
