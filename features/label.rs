use crate::EncodingError;
use dendron_dataframe::{parse_number, Column};
use std::cmp::Ordering;

/// A `LabelEncoder` maps the values of the target column to class indexes. The classes are sorted, numerically if every class is a number and lexicographically otherwise, and that order is the order of every probability vector the model produces.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelEncoder {
	pub classes: Vec<String>,
}

impl LabelEncoder {
	pub fn fit(column: &Column) -> LabelEncoder {
		let mut classes: Vec<String> = column
			.unique_values()
			.into_iter()
			.map(|value| value.to_owned())
			.collect();
		let numbers: Option<Vec<f64>> = classes.iter().map(|class| parse_number(class)).collect();
		if numbers.is_some() {
			classes.sort_by(|a, b| {
				let a = parse_number(a).unwrap_or(0.0);
				let b = parse_number(b).unwrap_or(0.0);
				a.partial_cmp(&b).unwrap_or(Ordering::Equal)
			});
		} else {
			classes.sort();
		}
		LabelEncoder { classes }
	}

	pub fn n_classes(&self) -> usize {
		self.classes.len()
	}

	pub fn encode(&self, value: &str) -> Option<usize> {
		self.classes.iter().position(|class| class == value)
	}

	/// Encode every value of the target column. A value that is not one of the classes is an error.
	pub fn encode_column(&self, column: &Column) -> Result<Vec<usize>, EncodingError> {
		column
			.data
			.iter()
			.map(|value| {
				self.encode(value).ok_or_else(|| EncodingError::UnknownClass {
					column: column.name.clone(),
					value: value.clone(),
				})
			})
			.collect()
	}
}

#[test]
fn test_classes_are_sorted() {
	let column = Column {
		name: "loan_approved".to_owned(),
		dtype: dendron_dataframe::ColumnType::Text,
		data: vec!["Denied", "Approved", "Denied"]
			.into_iter()
			.map(String::from)
			.collect(),
	};
	let encoder = LabelEncoder::fit(&column);
	assert_eq!(encoder.classes, vec!["Approved", "Denied"]);
	assert_eq!(encoder.encode_column(&column).unwrap(), vec![1, 0, 1]);
}

#[test]
fn test_unknown_class() {
	let column = Column {
		name: "loan_approved".to_owned(),
		dtype: dendron_dataframe::ColumnType::Text,
		data: vec!["Denied", "Approved"]
			.into_iter()
			.map(String::from)
			.collect(),
	};
	let encoder = LabelEncoder::fit(&column);
	let other = Column {
		data: vec!["Approved", "Pending"]
			.into_iter()
			.map(String::from)
			.collect(),
		..column
	};
	assert_eq!(
		encoder.encode_column(&other),
		Err(EncodingError::UnknownClass {
			column: "loan_approved".to_owned(),
			value: "Pending".to_owned(),
		})
	);
}

#[test]
fn test_numeric_classes_sort_by_value() {
	let column = Column {
		name: "grade".to_owned(),
		dtype: dendron_dataframe::ColumnType::Integer,
		data: vec!["10", "2", "1"].into_iter().map(String::from).collect(),
	};
	let encoder = LabelEncoder::fit(&column);
	assert_eq!(encoder.classes, vec!["1", "2", "10"]);
}
