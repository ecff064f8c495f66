use crate::{json_to_string, EncodingError};
use dendron_dataframe::parse_number;
use num_traits::ToPrimitive;

/// A `NumericColumnEncoder` passes a number column through untouched. It still validates every value, because a value that is not a finite number must be reported, not silently turned into NaN.
#[derive(Clone, Debug, PartialEq)]
pub struct NumericColumnEncoder {
	pub column_name: String,
}

impl NumericColumnEncoder {
	pub fn encode(&self, value: &str) -> Result<f32, EncodingError> {
		parse_number(value)
			.and_then(|value| value.to_f32())
			.filter(|value| value.is_finite())
			.ok_or_else(|| self.not_numeric(value))
	}

	pub fn encode_json(&self, value: &serde_json::Value) -> Result<f32, EncodingError> {
		match value {
			serde_json::Value::Number(number) => number
				.as_f64()
				.and_then(|value| value.to_f32())
				.filter(|value| value.is_finite())
				.ok_or_else(|| self.not_numeric(&number.to_string())),
			serde_json::Value::String(value) => self.encode(value),
			value => Err(self.not_numeric(&json_to_string(value))),
		}
	}

	fn not_numeric(&self, value: &str) -> EncodingError {
		EncodingError::NotNumeric {
			column: self.column_name.clone(),
			value: value.to_owned(),
		}
	}
}

#[test]
fn test_encode() {
	let encoder = NumericColumnEncoder {
		column_name: "debt_ratio".to_owned(),
	};
	assert_eq!(encoder.encode("0.5"), Ok(0.5));
	assert_eq!(encoder.encode_json(&serde_json::json!(0.5)), Ok(0.5));
	assert_eq!(encoder.encode_json(&serde_json::json!("0.5")), Ok(0.5));
	assert_eq!(
		encoder.encode_json(&serde_json::json!(true)),
		Err(EncodingError::NotNumeric {
			column: "debt_ratio".to_owned(),
			value: "true".to_owned(),
		})
	);
	assert!(encoder.encode("N/A").is_err());
	assert!(encoder.encode("1e40").is_err());
}
