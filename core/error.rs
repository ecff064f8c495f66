use dendron_dataframe::LoadError;
use dendron_features::EncodingError;
use thiserror::Error;

/// Every way a `Session` operation can fail. Errors are detected before any state is touched, so a failed operation never leaves a partially stored dataset or model behind.
#[derive(Debug, Error)]
pub enum Error {
	#[error(transparent)]
	Schema(#[from] SchemaError),
	#[error(transparent)]
	Encoding(#[from] EncodingError),
	#[error(transparent)]
	State(#[from] StateError),
	#[error(transparent)]
	Parameter(#[from] ParameterError),
	#[error(transparent)]
	Load(#[from] LoadError),
}

/// The kind of an `Error`, for a transport to map to a status code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
	Schema,
	Encoding,
	State,
	Parameter,
	Load,
}

impl Error {
	pub fn kind(&self) -> ErrorKind {
		match self {
			Error::Schema(_) => ErrorKind::Schema,
			Error::Encoding(_) => ErrorKind::Encoding,
			Error::State(_) => ErrorKind::State,
			Error::Parameter(_) => ErrorKind::Parameter,
			Error::Load(_) => ErrorKind::Load,
		}
	}
}

/// A column named in a request does not fit the dataset or the model.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemaError {
	#[error("target column \"{0}\" is not in the dataset")]
	UnknownTargetColumn(String),
	#[error("feature column \"{0}\" is not in the dataset")]
	UnknownFeatureColumn(String),
	#[error("the target column \"{0}\" cannot also be a feature column")]
	TargetInFeatures(String),
	#[error("feature column \"{0}\" is listed more than once")]
	DuplicateFeatureColumn(String),
	#[error("feature \"{0}\" is missing in the request")]
	MissingFeature(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateError {
	#[error("no dataset has been uploaded")]
	NoDataset,
	#[error("no model has been trained")]
	NotTrained,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParameterError {
	#[error("test_size must be greater than 0 and less than 1, got {0}")]
	InvalidTestSize(f64),
	#[error("min_samples_split must be at least 2, got {0}")]
	InvalidMinSamplesSplit(usize),
	#[error("max_depth must be at least 1, got {0}")]
	InvalidMaxDepth(usize),
	#[error("at least 2 training rows and 1 feature column are required, got {n_rows} rows and {n_features} feature columns")]
	InsufficientData { n_rows: usize, n_features: usize },
}

#[test]
fn test_kind() {
	let error = Error::from(StateError::NotTrained);
	assert_eq!(error.kind(), ErrorKind::State);
	assert_eq!(error.to_string(), "no model has been trained");
	let error = Error::from(SchemaError::MissingFeature("income".to_owned()));
	assert_eq!(error.kind(), ErrorKind::Schema);
	assert_eq!(error.to_string(), "feature \"income\" is missing in the request");
}
