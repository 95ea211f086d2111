use anyhow::{Context, Result};

use super::raw::RawConfig;
use super::resolved::ResolvedConfig;
use super::sources::build_config;
use crate::cli::CliArgs;

/// Resolve the library, browse and catalog settings for one run.
pub(crate) fn load(cli: &CliArgs) -> Result<ResolvedConfig> {
	let mut raw: RawConfig = build_config(cli)?
		.try_deserialize()
		.context("invalid varlens settings")?;
	raw.apply_cli_overrides(cli);
	let resolved = raw.resolve(cli)?;
	log::debug!(
		"library root {}, {} package manifest",
		resolved.root.display(),
		if resolved.manifest.is_some() { "with" } else { "no" }
	);
	Ok(resolved)
}
