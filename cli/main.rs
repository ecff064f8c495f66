//! This module contains the main entrypoint to the dendron cli.

use anyhow::{Context, Result};
use clap::{Args, Parser};
use colored::Colorize;
use dendron_core::{PredictRequest, Session, TrainOutput, TrainParams};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[clap(
	about = "Train a classification tree on a csv file and explain its predictions.",
	setting = clap::AppSettings::DisableHelpSubcommand,
)]
enum Options {
	#[clap(name = "inspect")]
	Inspect(InspectOptions),
	#[clap(name = "train")]
	Train(TrainOptions),
	#[clap(name = "predict")]
	Predict(PredictOptions),
}

#[derive(Parser, Debug)]
#[clap(about = "describe a csv file")]
#[clap(long_about = "print the columns, dtypes, sample rows and categorical columns of a csv file")]
struct InspectOptions {
	#[clap(short, long, help = "the path to your .csv file")]
	file: PathBuf,
}

#[derive(Parser, Debug)]
#[clap(about = "train a model")]
#[clap(long_about = "train a classification tree from a csv file and print its evaluation")]
struct TrainOptions {
	#[clap(flatten)]
	train: TrainArgs,
}

#[derive(Parser, Debug)]
#[clap(about = "train a model and predict")]
#[clap(
	long_about = "train a classification tree from a csv file, then predict each row given with --row and print the prediction with its decision path"
)]
struct PredictOptions {
	#[clap(flatten)]
	train: TrainArgs,
	#[clap(
		long = "row",
		help = "a json object mapping each feature to its value, for example '{\"credit_score\": 700, \"job_type\": \"Service\"}'"
	)]
	rows: Vec<String>,
}

#[derive(Args, Debug)]
struct TrainArgs {
	#[clap(short, long, help = "the path to your .csv file")]
	file: PathBuf,
	#[clap(short, long, help = "the name of the column to predict")]
	target: String,
	#[clap(long, help = "the comma separated names of the feature columns")]
	features: String,
	#[clap(short, long, help = "the path to a config file")]
	config: Option<PathBuf>,
	#[clap(long, help = "the fraction of rows held out for evaluation")]
	test_size: Option<f64>,
	#[clap(long, help = "the maximum depth of the tree")]
	max_depth: Option<usize>,
	#[clap(long, help = "the minimum number of rows a node needs to be split")]
	min_samples_split: Option<usize>,
	#[clap(long, help = "the seed of the train/test shuffle")]
	random_state: Option<u64>,
}

fn main() {
	let env = env_logger::Env::default().default_filter_or("dendron_core=info");
	env_logger::Builder::from_env(env)
		.format_level(false)
		.format_module_path(false)
		.format_timestamp(None)
		.init();
	let options = Options::parse();
	let result = match options {
		Options::Inspect(options) => cli_inspect(options),
		Options::Train(options) => cli_train(options),
		Options::Predict(options) => cli_predict(options),
	};
	if let Err(error) = result {
		eprintln!("{}: {:#}", "error".red().bold(), error);
		std::process::exit(1);
	}
}

fn cli_inspect(options: InspectOptions) -> Result<()> {
	let session = Session::new();
	let output = session.ingest_dataset(&read_file(&options.file)?)?;
	println!("{}", serde_json::to_string_pretty(&output)?);
	Ok(())
}

fn cli_train(options: TrainOptions) -> Result<()> {
	let session = Session::new();
	let output = train(&session, &options.train)?;
	print_train_output(&output);
	Ok(())
}

fn cli_predict(options: PredictOptions) -> Result<()> {
	let session = Session::new();
	train(&session, &options.train)?;
	for row in options.rows.iter() {
		let request: PredictRequest = serde_json::from_str(row)
			.with_context(|| format!("failed to parse row {}", row))?;
		let output = session.predict(&request)?;
		println!("{}", serde_json::to_string_pretty(&output)?);
	}
	Ok(())
}

/// Load the dataset into the session and train a model with the parameters from the command line, falling back to the config file and then to the defaults.
fn train(session: &Session, args: &TrainArgs) -> Result<TrainOutput> {
	let config = dendron_core::load_config(args.config.as_deref())?;
	session.ingest_dataset(&read_file(&args.file)?)?;
	let feature_columns = args
		.features
		.split(',')
		.map(|name| name.trim())
		.filter(|name| !name.is_empty())
		.map(|name| name.to_owned())
		.collect();
	let mut params = TrainParams::new(args.target.clone(), feature_columns);
	if let Some(config) = config.as_ref() {
		log::debug!("using config {:?}", config);
		params = params.with_config(config);
	}
	if let Some(test_size) = args.test_size {
		params.test_size = test_size;
	}
	if let Some(max_depth) = args.max_depth {
		params.max_depth = Some(max_depth);
	}
	if let Some(min_samples_split) = args.min_samples_split {
		params.min_samples_split = min_samples_split;
	}
	if let Some(random_state) = args.random_state {
		params.random_state = random_state;
	}
	let output = session.train_model(&params)?;
	Ok(output)
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
	std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn print_train_output(output: &TrainOutput) {
	println!("accuracy: {:.4}", output.accuracy);
	println!(
		"baseline accuracy: {:.4}",
		output.classification_report.baseline_accuracy
	);
	println!("tree depth: {}", output.tree_depth);
	println!("node count: {}", output.node_count);
	println!();
	println!(
		"{:>16} {:>10} {:>10} {:>10} {:>10}",
		"", "precision", "recall", "f1-score", "support"
	);
	let report = &output.classification_report;
	for class in report.classes.iter() {
		println!(
			"{:>16} {:>10.2} {:>10.2} {:>10.2} {:>10}",
			class.label, class.precision, class.recall, class.f1_score, class.support
		);
	}
	for (name, average) in [
		("macro avg", &report.macro_avg),
		("weighted avg", &report.weighted_avg),
	]
	.iter()
	{
		println!(
			"{:>16} {:>10.2} {:>10.2} {:>10.2} {:>10}",
			name, average.precision, average.recall, average.f1_score, average.support
		);
	}
	println!();
	println!("feature importance:");
	for feature_importance in output.feature_importance.iter() {
		println!(
			"  {}: {:.4}",
			feature_importance.feature, feature_importance.importance
		);
	}
	println!();
	print!("{}", output.tree_text);
}
