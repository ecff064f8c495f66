use crate::{
	error::{Error, StateError},
	ingest::{ingest, IngestOutput},
	predict::{predict, PredictOutput, PredictRequest},
	train::{train, Model, ModelInfo, TrainOutput, TrainParams},
};
use dendron_dataframe::DataFrame;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/**
A `Session` holds the most recently uploaded dataset and the most recently trained model.

Uploads and training runs are serialized by a writer lock. Their results are published by swapping an `Arc` under a short write lock, so predictions running concurrently with a training run keep using the model they started with and never observe an encoder from one run paired with a tree from another.
*/
#[derive(Default)]
pub struct Session {
	writer: Mutex<()>,
	state: RwLock<State>,
}

#[derive(Default)]
struct State {
	dataset: Option<Arc<DataFrame>>,
	model: Option<Arc<Model>>,
}

impl Session {
	pub fn new() -> Session {
		Session::default()
	}

	/// Parse a csv and make it the current dataset. The current model, if any, is kept.
	pub fn ingest_dataset(&self, csv: &[u8]) -> Result<IngestOutput, Error> {
		let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
		let dataframe = DataFrame::from_bytes(csv)?;
		let output = ingest(&dataframe);
		log::info!(
			"loaded a dataset with {} rows and {} columns",
			dataframe.nrows(),
			dataframe.ncols()
		);
		self.write_state().dataset = Some(Arc::new(dataframe));
		Ok(output)
	}

	/// Train a model on the current dataset and make it the current model. If training fails, the previous model stays in place.
	pub fn train_model(&self, params: &TrainParams) -> Result<TrainOutput, Error> {
		let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
		let dataset = self
			.read_state()
			.dataset
			.clone()
			.ok_or(StateError::NoDataset)?;
		let (model, output) = train(&dataset, params)?;
		self.write_state().model = Some(Arc::new(model));
		Ok(output)
	}

	pub fn predict(&self, request: &PredictRequest) -> Result<PredictOutput, Error> {
		let model = self.model()?;
		predict(&model, request)
	}

	pub fn model_info(&self) -> Result<ModelInfo, Error> {
		Ok(self.model()?.info())
	}

	/// The current model.
	pub fn model(&self) -> Result<Arc<Model>, Error> {
		let model = self
			.read_state()
			.model
			.clone()
			.ok_or(StateError::NotTrained)?;
		Ok(model)
	}

	fn read_state(&self) -> RwLockReadGuard<State> {
		self.state.read().unwrap_or_else(PoisonError::into_inner)
	}

	fn write_state(&self) -> RwLockWriteGuard<State> {
		self.state.write().unwrap_or_else(PoisonError::into_inner)
	}
}

#[cfg(test)]
fn loan_params(feature_columns: &[&str]) -> TrainParams {
	TrainParams::new(
		"loan_approved".to_owned(),
		feature_columns.iter().map(|name| (*name).to_owned()).collect(),
	)
}

#[test]
fn test_predict_before_training() {
	let session = Session::new();
	let request = maplit::btreemap! {
		"credit_score".to_owned() => serde_json::json!(700),
	};
	assert!(matches!(
		session.predict(&request),
		Err(Error::State(StateError::NotTrained))
	));
	assert!(matches!(
		session.model_info(),
		Err(Error::State(StateError::NotTrained))
	));
}

#[test]
fn test_train_before_upload() {
	let session = Session::new();
	assert!(matches!(
		session.train_model(&loan_params(&["credit_score"])),
		Err(Error::State(StateError::NoDataset))
	));
}

#[test]
fn test_upload_train_predict() {
	let session = Session::new();
	let ingest_output = session
		.ingest_dataset(crate::test_data::LOAN_CSV.as_bytes())
		.unwrap();
	assert_eq!(ingest_output.row_count, 20);
	let mut params = loan_params(&["credit_score", "debt_ratio"]);
	params.max_depth = Some(1);
	let train_output = session.train_model(&params).unwrap();
	let model_info = session.model_info().unwrap();
	assert_eq!(model_info.feature_names, vec!["credit_score", "debt_ratio"]);
	assert_eq!(model_info.target_name, "loan_approved");
	assert_eq!(model_info.node_count, train_output.node_count);
	assert_eq!(model_info.tree_depth, 1);
	assert_eq!(model_info.leaf_count, 2);
	assert_eq!(model_info.class_labels, vec!["Approved", "Denied"]);
	for (credit_score, debt_ratio) in [(720, 0.25), (560, 0.66), (655, 0.4)].iter() {
		let request = maplit::btreemap! {
			"credit_score".to_owned() => serde_json::json!(credit_score),
			"debt_ratio".to_owned() => serde_json::json!(debt_ratio),
		};
		let output = session.predict(&request).unwrap();
		assert_eq!(output.decision_path.len(), 1);
	}
}

#[test]
fn test_failed_training_keeps_the_previous_model() {
	let session = Session::new();
	session
		.ingest_dataset(crate::test_data::LOAN_CSV.as_bytes())
		.unwrap();
	session.train_model(&loan_params(&["job_type"])).unwrap();
	let error = session
		.train_model(&loan_params(&["job_type", "height"]))
		.unwrap_err();
	assert_eq!(error.kind(), crate::ErrorKind::Schema);
	assert_eq!(session.model_info().unwrap().feature_names, vec!["job_type"]);
}

#[test]
fn test_upload_keeps_the_model() {
	let session = Session::new();
	session
		.ingest_dataset(crate::test_data::LOAN_CSV.as_bytes())
		.unwrap();
	session.train_model(&loan_params(&["job_type"])).unwrap();
	session.ingest_dataset(b"a,b\n1,2\n").unwrap();
	assert!(session.model().is_ok());
	assert!(matches!(
		session.ingest_dataset(b"a,a\n1,2\n"),
		Err(Error::Load(_))
	));
}

#[test]
fn test_concurrent_predictions() {
	let session = Arc::new(Session::new());
	session
		.ingest_dataset(crate::test_data::LOAN_CSV.as_bytes())
		.unwrap();
	session
		.train_model(&loan_params(&["credit_score", "job_type"]))
		.unwrap();
	let expected = session
		.predict(&maplit::btreemap! {
			"credit_score".to_owned() => serde_json::json!(610),
			"job_type".to_owned() => serde_json::json!("Service"),
		})
		.unwrap();
	let handles: Vec<_> = (0..4)
		.map(|_| {
			let session = session.clone();
			std::thread::spawn(move || {
				session
					.predict(&maplit::btreemap! {
						"credit_score".to_owned() => serde_json::json!(610),
						"job_type".to_owned() => serde_json::json!("Service"),
					})
					.unwrap()
			})
		})
		.collect();
	for handle in handles {
		assert_eq!(handle.join().unwrap(), expected);
	}
}

#[test]
fn test_predictions_during_retraining_see_one_model() {
	let session = Arc::new(Session::new());
	session
		.ingest_dataset(crate::test_data::LOAN_CSV.as_bytes())
		.unwrap();
	let numeric = loan_params(&["credit_score"]);
	let categorical = loan_params(&["job_type", "home_status"]);
	// The request has a value for every feature of both models.
	let request = maplit::btreemap! {
		"credit_score".to_owned() => serde_json::json!(610),
		"job_type".to_owned() => serde_json::json!("Service"),
		"home_status".to_owned() => serde_json::json!("Rent"),
	};
	session.train_model(&numeric).unwrap();
	let numeric_info = session.model_info().unwrap();
	let numeric_output = session.predict(&request).unwrap();
	session.train_model(&categorical).unwrap();
	let categorical_info = session.model_info().unwrap();
	let categorical_output = session.predict(&request).unwrap();
	let trainers: Vec<_> = vec![numeric, categorical]
		.into_iter()
		.map(|params| {
			let session = session.clone();
			std::thread::spawn(move || {
				for _ in 0..20 {
					session.train_model(&params).unwrap();
				}
			})
		})
		.collect();
	let readers: Vec<_> = (0..4)
		.map(|_| {
			let session = session.clone();
			let request = request.clone();
			std::thread::spawn(move || {
				(0..50)
					.map(|_| {
						(
							session.model_info().unwrap(),
							session.predict(&request).unwrap(),
						)
					})
					.collect::<Vec<_>>()
			})
		})
		.collect();
	for trainer in trainers {
		trainer.join().unwrap();
	}
	for reader in readers {
		for (info, output) in reader.join().unwrap() {
			assert!(info == numeric_info || info == categorical_info);
			assert!(output == numeric_output || output == categorical_output);
		}
	}
	let info = session.model_info().unwrap();
	assert!(info == numeric_info || info == categorical_info);
}
