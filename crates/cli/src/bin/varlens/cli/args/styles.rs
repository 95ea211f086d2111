use std::fmt::Write;
use std::path::PathBuf;

use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use varlens::app_dirs;

/// `--version` banner: where settings are read from and where the metadata
/// index is kept, with the variable that relocates each.
pub(super) fn long_version() -> &'static str {
	let mut details = format!("varlens {}", env!("CARGO_PKG_VERSION"));
	let _ = writeln!(details);
	let rows = [
		("settings", app_dirs::get_config_dir(), "VARLENS_CONFIG_DIR"),
		("data", app_dirs::get_data_dir(), "VARLENS_DATA_DIR"),
		("metadata index", app_dirs::default_metadata_index_path(), "VARLENS_DATA_DIR"),
	];
	for (label, path, variable) in rows {
		let _ = writeln!(details, "{label}: {} (${variable})", describe(path));
	}

	Box::leak(details.into_boxed_str())
}

fn describe(path: anyhow::Result<PathBuf>) -> String {
	match path {
		Ok(path) => path.display().to_string(),
		Err(err) => format!("unavailable ({err})"),
	}
}

/// Help colours: section headers stand out from flag names and value
/// placeholders.
pub(super) fn cli_styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Blue.on_default().effects(Effects::BOLD | Effects::UNDERLINE))
		.usage(AnsiColor::Blue.on_default().effects(Effects::BOLD))
		.literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
		.placeholder(AnsiColor::Magenta.on_default())
		.error(AnsiColor::Red.on_default().effects(Effects::BOLD))
		.valid(AnsiColor::Green.on_default())
		.invalid(AnsiColor::Yellow.on_default())
}
