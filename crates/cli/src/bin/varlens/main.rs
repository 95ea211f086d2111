//! Command-line entry point for the varlens catalog browser.

mod cli;
mod logging;
mod settings;
mod workflow;

use anyhow::Result;
use cli::{CliArgs, OutputFormat, parse_cli, print_grid, print_json, print_plain};
use settings::ResolvedConfig;
use workflow::CatalogWorkflow;

/// Entry point for the varlens command-line application.
fn main() -> Result<()> {
	let cli = parse_cli();
	logging::initialize(cli.verbose);

	let resolved = settings::load(&cli)?;

	if cli.print_config {
		resolved.print_summary();
	}

	run_catalog(&cli, resolved)
}

/// Run the catalog to completion and print the requested page.
fn run_catalog(cli: &CliArgs, settings: ResolvedConfig) -> Result<()> {
	let workflow = CatalogWorkflow::from_config(settings)?;
	let outcome = workflow.run(cli.page)?;

	match cli.output {
		OutputFormat::Plain => print_plain(&outcome),
		OutputFormat::Json => print_json(&outcome)?,
		OutputFormat::Grid => print_grid(&outcome, cli.width, cli.columns),
	}

	Ok(())
}
