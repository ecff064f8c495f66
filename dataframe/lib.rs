/*!
This crate provides a minimal dataframe: a list of named columns of raw string cells, each with a dtype inferred when the csv is loaded. Cells are kept as the strings that appeared in the csv so that downstream encoders can decide for themselves how to interpret them, which is what allows categorical values to be translated back to their original labels.
*/

use std::collections::HashSet;

mod load;

pub use self::load::*;

/// These values are considered missing when inferring a column's dtype and counting its distinct values.
pub const MISSING_VALUES: &[&str] = &[
	"", "null", "NULL", "n/a", "N/A", "nan", "-nan", "NaN", "-NaN", "?",
];

#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
	pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
	pub name: String,
	pub dtype: ColumnType,
	pub data: Vec<String>,
}

/// The dtype of a column, named after the pandas dtype that the same csv would produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
	/// Every valid value parses as an integer and no value is missing.
	Integer,
	/// Every valid value parses as a finite number.
	Float,
	/// At least one valid value is not a number.
	Text,
}

/// A single cell, interpreted according to its column's dtype.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value<'a> {
	Missing,
	Number(f64),
	Text(&'a str),
}

impl DataFrame {
	pub fn ncols(&self) -> usize {
		self.columns.len()
	}

	pub fn nrows(&self) -> usize {
		self.columns.first().map(|column| column.len()).unwrap_or(0)
	}

	pub fn column_names(&self) -> Vec<&str> {
		self.columns.iter().map(|column| column.name.as_str()).collect()
	}

	pub fn column(&self, name: &str) -> Option<&Column> {
		self.columns.iter().find(|column| column.name == name)
	}

	/// Read the values of the row at `index`, in column order.
	pub fn row(&self, index: usize) -> Vec<Value> {
		self.columns.iter().map(|column| column.value(index)).collect()
	}
}

impl Column {
	pub fn len(&self) -> usize {
		self.data.len()
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	pub fn is_numeric(&self) -> bool {
		matches!(self.dtype, ColumnType::Integer | ColumnType::Float)
	}

	pub fn value(&self, index: usize) -> Value {
		let raw = self.data[index].as_str();
		if is_missing(raw) {
			return Value::Missing;
		}
		match self.dtype {
			ColumnType::Integer | ColumnType::Float => match parse_number(raw) {
				Some(value) => Value::Number(value),
				None => Value::Missing,
			},
			ColumnType::Text => Value::Text(raw),
		}
	}

	/// The distinct raw values of this column in the order they first appear, including missing values.
	pub fn unique_values(&self) -> Vec<&str> {
		let mut seen = HashSet::new();
		self.data
			.iter()
			.map(|value| value.as_str())
			.filter(|value| seen.insert(*value))
			.collect()
	}

	/// The number of distinct values, not counting missing values.
	pub fn n_unique(&self) -> usize {
		self.data
			.iter()
			.filter(|value| !is_missing(value))
			.map(|value| value.as_str())
			.collect::<HashSet<_>>()
			.len()
	}
}

impl std::fmt::Display for ColumnType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let s = match self {
			ColumnType::Integer => "int64",
			ColumnType::Float => "float64",
			ColumnType::Text => "object",
		};
		write!(f, "{}", s)
	}
}

pub fn is_missing(value: &str) -> bool {
	MISSING_VALUES.contains(&value)
}

/// Parse a cell as a finite number.
pub fn parse_number(value: &str) -> Option<f64> {
	match lexical::parse::<f64, _>(value) {
		Ok(value) if value.is_finite() => Some(value),
		_ => None,
	}
}

#[test]
fn test_unique_values_keep_first_seen_order() {
	let column = Column {
		name: "job_type".to_owned(),
		dtype: ColumnType::Text,
		data: vec!["Service", "Office", "Service", "", "Technical", "Office"]
			.into_iter()
			.map(String::from)
			.collect(),
	};
	assert_eq!(
		column.unique_values(),
		vec!["Service", "Office", "", "Technical"]
	);
	assert_eq!(column.n_unique(), 3);
}

#[test]
fn test_value() {
	let column = Column {
		name: "debt_ratio".to_owned(),
		dtype: ColumnType::Float,
		data: vec!["0.25".to_owned(), "N/A".to_owned()],
	};
	assert_eq!(column.value(0), Value::Number(0.25));
	assert_eq!(column.value(1), Value::Missing);
}
