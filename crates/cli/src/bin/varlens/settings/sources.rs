use std::env;
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use config::{Config, ConfigError, Environment, File};
use varlens::app_dirs;

use crate::cli::CliArgs;

/// Settings keys that take comma separated lists when set from the
/// environment. Every other `VARLENS__*` value stays a scalar, so paths that
/// contain commas survive intact.
const LIST_KEYS: [&str; 3] = ["browse.extensions", "browse.scopes", "library.global_ignores"];

/// Layer `config.toml`, `.varlens.toml`, `varlens.toml`, the `--config` files
/// and `VARLENS__SECTION__KEY` variables, later layers winning.
pub(super) fn build_config(cli: &CliArgs) -> Result<Config> {
	let mut builder = Config::builder();

	if !cli.no_config {
		for path in default_config_files() {
			if path.is_file() {
				log::debug!("reading settings from {}", path.display());
			}
			builder = builder.add_source(File::from(path).required(false));
		}
	}

	for path in &cli.config {
		builder = builder.add_source(File::from(path.clone()).required(true));
	}

	builder = builder.add_source(environment());

	builder.build().map_err(|err| match err {
		ConfigError::Frozen => anyhow!("settings builder is frozen"),
		other => other.into(),
	})
}

/// `VARLENS__LIBRARY__ROOT=/srv/library` style overrides.
fn environment() -> Environment {
	LIST_KEYS.into_iter().fold(
		Environment::with_prefix("varlens")
			.separator("__")
			.try_parsing(true)
			.list_separator(","),
		Environment::with_list_parse_key,
	)
}

/// Optional settings files, lowest precedence first: the user's config
/// directory, then the working directory.
pub(super) fn default_config_files() -> Vec<PathBuf> {
	let mut files = Vec::new();

	if let Ok(dir) = app_dirs::get_config_dir() {
		files.push(dir.join("config.toml"));
	}

	if let Ok(current_dir) = env::current_dir() {
		files.push(current_dir.join(".varlens.toml"));
		files.push(current_dir.join("varlens.toml"));
	}

	files
}
