use crate::EncodingError;
use dendron_dataframe::{parse_number, Column};
use num_traits::ToPrimitive;

/**
An `EncodingTable` lists the distinct values of a categorical column in the order they first appear in the training data. A value's code is its index in the table.

# Example

| training value | code |
|----------------|------|
| "Service"      | 0    |
| "Office"       | 1    |
| "Service"      | 0    |
| "Technical"    | 2    |

The table is the only authority for translating between codes and labels, so a value that is not in the table is an error, never a new code.
*/
#[derive(Clone, Debug, PartialEq)]
pub struct EncodingTable {
	pub values: Vec<String>,
}

impl EncodingTable {
	pub fn fit(column: &Column) -> EncodingTable {
		let values = column
			.unique_values()
			.into_iter()
			.map(|value| value.to_owned())
			.collect();
		EncodingTable { values }
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	/// Find the code for `value`. Strings match exactly, or, when both sides are numbers, by numeric value so that a request value of `3.0` finds the training value `"3"`.
	pub fn code(&self, value: &str) -> Option<usize> {
		if let Some(position) = self.values.iter().position(|option| option == value) {
			return Some(position);
		}
		let number = parse_number(value)?;
		self.values
			.iter()
			.position(|option| parse_number(option) == Some(number))
	}

	pub fn label(&self, code: usize) -> Option<&str> {
		self.values.get(code).map(|value| value.as_str())
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct CategoricalColumnEncoder {
	pub column_name: String,
	pub table: EncodingTable,
}

impl CategoricalColumnEncoder {
	pub fn fit(column: &Column) -> CategoricalColumnEncoder {
		CategoricalColumnEncoder {
			column_name: column.name.clone(),
			table: EncodingTable::fit(column),
		}
	}

	pub fn encode(&self, value: &str) -> Result<f32, EncodingError> {
		let code = self
			.table
			.code(value)
			.ok_or_else(|| EncodingError::UnknownCategory {
				column: self.column_name.clone(),
				value: value.to_owned(),
				allowed: self.table.values.clone(),
			})?;
		code.to_f32().ok_or_else(|| EncodingError::InvalidCode {
			column: self.column_name.clone(),
			code,
		})
	}

	/// Translate a feature value produced by `encode` back to the original label.
	pub fn decode(&self, code: usize) -> Result<&str, EncodingError> {
		self.table
			.label(code)
			.ok_or_else(|| EncodingError::InvalidCode {
				column: self.column_name.clone(),
				code,
			})
	}

	/// Decode a feature value as it is stored in a feature row.
	pub fn decode_feature_value(&self, value: f32) -> Result<&str, EncodingError> {
		let code = value.to_usize().ok_or_else(|| EncodingError::InvalidCode {
			column: self.column_name.clone(),
			code: usize::MAX,
		})?;
		self.decode(code)
	}
}

#[cfg(test)]
fn job_type_encoder() -> CategoricalColumnEncoder {
	let column = Column {
		name: "job_type".to_owned(),
		dtype: dendron_dataframe::ColumnType::Text,
		data: vec!["Service", "Office", "Service", "Technical"]
			.into_iter()
			.map(String::from)
			.collect(),
	};
	CategoricalColumnEncoder::fit(&column)
}

#[test]
fn test_round_trip() {
	let encoder = job_type_encoder();
	for value in ["Service", "Office", "Technical"].iter() {
		let code = encoder.encode(value).unwrap();
		assert_eq!(encoder.decode_feature_value(code).unwrap(), *value);
	}
	assert_eq!(encoder.encode("Technical").unwrap(), 2.0);
}

#[test]
fn test_unknown_category() {
	let encoder = job_type_encoder();
	assert_eq!(
		encoder.encode("Astronaut"),
		Err(EncodingError::UnknownCategory {
			column: "job_type".to_owned(),
			value: "Astronaut".to_owned(),
			allowed: vec![
				"Service".to_owned(),
				"Office".to_owned(),
				"Technical".to_owned()
			],
		})
	);
}

#[test]
fn test_invalid_code() {
	let encoder = job_type_encoder();
	assert_eq!(
		encoder.decode(3),
		Err(EncodingError::InvalidCode {
			column: "job_type".to_owned(),
			code: 3,
		})
	);
}

#[test]
fn test_numeric_labels_match_by_value() {
	let column = Column {
		name: "rooms".to_owned(),
		dtype: dendron_dataframe::ColumnType::Integer,
		data: vec!["1".to_owned(), "3".to_owned()],
	};
	let table = EncodingTable::fit(&column);
	assert_eq!(table.code("3"), Some(1));
	assert_eq!(table.code("3.0"), Some(1));
	assert_eq!(table.code("2"), None);
}
