/*!
This crate ties the dataframe, encoder, tree and metrics crates together into the four operations a front end exposes: uploading a dataset, training a model, predicting with the model and describing the model.

The [`Session`](struct.Session.html) holds the current dataset and model between operations. The free functions [`ingest`](fn.ingest.html), [`train`](fn.train.html) and [`predict`](fn.predict.html) do the work and hold no state of their own.
*/

#![allow(clippy::tabs_in_doc_comments)]

mod config;
mod error;
mod ingest;
mod predict;
mod session;
#[cfg(test)]
mod test_data;
mod train;

pub use self::config::{load_config, Config};
pub use self::error::{Error, ErrorKind, ParameterError, SchemaError, StateError};
pub use self::ingest::{ingest, IngestOutput, SAMPLE_ROW_COUNT};
pub use self::predict::{predict, DecisionOutput, PredictOutput, PredictRequest};
pub use self::session::Session;
pub use self::train::{
	train, train_test_split, AverageReport, ClassReport, ClassificationReport, FeatureImportance,
	Model, ModelInfo, TrainOutput, TrainParams,
};
