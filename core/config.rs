/*!
This module defines the `Config` struct, which can be loaded from a yaml file to set the training parameters that are not tied to a particular dataset.

```yaml
test_size: 0.25
max_depth: 4
min_samples_split: 5
random_state: 7
```
*/

use anyhow::{Context, Result};
use std::path::Path;

#[derive(Debug, Default, Clone, PartialEq, serde::Deserialize)]
pub struct Config {
	pub test_size: Option<f64>,
	pub max_depth: Option<usize>,
	pub min_samples_split: Option<usize>,
	pub random_state: Option<u64>,
}

impl Config {
	pub fn from_yaml(yaml: &str) -> Result<Config> {
		let config = serde_yaml::from_str(yaml).context("failed to parse config")?;
		Ok(config)
	}
}

/// Load the config from the config file, if provided.
pub fn load_config(config_path: Option<&Path>) -> Result<Option<Config>> {
	if let Some(config_path) = config_path {
		let config = std::fs::read_to_string(config_path)
			.with_context(|| format!("failed to read config file {}", config_path.display()))?;
		let config = serde_yaml::from_str(&config)
			.with_context(|| format!("failed to parse config file {}", config_path.display()))?;
		Ok(Some(config))
	} else {
		Ok(None)
	}
}

#[test]
fn test_from_yaml() {
	let config = Config::from_yaml("test_size: 0.3\nmax_depth: 4\n").unwrap();
	assert_eq!(
		config,
		Config {
			test_size: Some(0.3),
			max_depth: Some(4),
			min_samples_split: None,
			random_state: None,
		}
	);
	assert!(Config::from_yaml("max_depth: deep\n").is_err());
}

#[test]
fn test_load_config_without_a_path() {
	assert_eq!(load_config(None).unwrap(), None);
}
