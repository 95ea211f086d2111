use std::path::PathBuf;

use clap::{ArgAction, ColorChoice, Parser};

use super::options::{CategoryArg, OutputFormat, PeopleArg, SizeArg, SortArg, SourceArg, SubFilterArg};
use super::styles::{cli_styles, long_version};

#[derive(Parser, Debug)]
#[command(
	name = "varlens",
	version,
	long_version = long_version(),
	about = "Browse and filter very large asset libraries",
	color = ColorChoice::Auto,
	styles = cli_styles()
)]
/// Command-line arguments accepted by the `varlens` binary.
pub(crate) struct CliArgs {
	#[arg(
		short,
		long = "config",
		value_name = "FILE",
		env = "VARLENS_CONFIG",
		action = ArgAction::Append,
		help = "Additional configuration file to merge (default: none)"
	)]
	pub(crate) config: Vec<PathBuf>,
	#[arg(
		short = 'n',
		long = "no-config",
		help = "Skip loading default configuration files (default: disabled)"
	)]
	pub(crate) no_config: bool,
	#[arg(
		short = 'r',
		long,
		value_name = "PATH",
		help = "Library root holding loose files (default: current directory)"
	)]
	pub(crate) root: Option<PathBuf>,
	#[arg(
		short = 'm',
		long,
		value_name = "FILE",
		help = "Package manifest describing packaged entries (default: none)"
	)]
	pub(crate) manifest: Option<PathBuf>,
	#[arg(
		long = "index",
		value_name = "FILE",
		help = "Persistent metadata index (default: data directory)"
	)]
	pub(crate) index: Option<PathBuf>,
	#[arg(
		long = "no-index",
		help = "Keep derived metadata in memory only (default: disabled)"
	)]
	pub(crate) no_index: bool,
	#[arg(
		long = "tags-file",
		value_name = "FILE",
		help = "JSON object of uid to tag list (default: none)"
	)]
	pub(crate) tags_file: Option<PathBuf>,
	#[arg(
		long = "ratings-file",
		value_name = "FILE",
		help = "JSON object of uid to star rating (default: none)"
	)]
	pub(crate) ratings_file: Option<PathBuf>,
	#[arg(
		short = 'q',
		long,
		value_name = "QUERY",
		help = "Case-insensitive substring of the entry path (default: empty)"
	)]
	pub(crate) query: Option<String>,
	#[arg(
		short = 'e',
		long = "extensions",
		value_delimiter = ',',
		value_name = "EXT",
		help = "Restrict results to specific file extensions (default: all)"
	)]
	pub(crate) extensions: Option<Vec<String>>,
	#[arg(
		short = 's',
		long = "scope",
		value_name = "PREFIX",
		action = ArgAction::Append,
		help = "Path prefix to browse, repeatable (default: whole library)"
	)]
	pub(crate) scopes: Vec<String>,
	#[arg(
		short = 't',
		long = "tag",
		value_name = "TAG",
		action = ArgAction::Append,
		help = "Only show entries carrying any of these tags (default: none)"
	)]
	pub(crate) tags: Vec<String>,
	#[arg(
		long,
		value_enum,
		help = "Browsing category enabling the sub-filters (default: none)"
	)]
	pub(crate) category: Option<CategoryArg>,
	#[arg(
		long = "sub",
		value_enum,
		value_delimiter = ',',
		value_name = "BIT",
		help = "Comma-separated gender and kind sub-filters (default: all)"
	)]
	pub(crate) sub_filters: Vec<SubFilterArg>,
	#[arg(
		short = 'p',
		long = "people",
		value_enum,
		value_delimiter = ',',
		value_name = "COUNT",
		help = "Occupant-count filter, single or dual (default: all)"
	)]
	pub(crate) people: Vec<PeopleArg>,
	#[arg(
		long,
		value_name = "STARS",
		value_parser = clap::value_parser!(u8).range(1..=5),
		help = "Exact star rating (default: any)"
	)]
	pub(crate) rating: Option<u8>,
	#[arg(long, value_enum, help = "Size bucket (default: any)")]
	pub(crate) size: Option<SizeArg>,
	#[arg(
		long,
		value_enum,
		default_value_t = SourceArg::All,
		help = "Packaged or loose entries only"
	)]
	pub(crate) source: SourceArg,
	#[arg(long, value_enum, help = "Result ordering (default: name-asc)")]
	pub(crate) sort: Option<SortArg>,
	#[arg(
		long,
		value_name = "NUM",
		default_value_t = 0,
		help = "Zero-based page to print"
	)]
	pub(crate) page: usize,
	#[arg(long = "page-size", value_name = "NUM", help = "Entries per page (default: 120)")]
	pub(crate) page_size: Option<usize>,
	#[arg(
		long = "no-paginate",
		help = "Print every result instead of one page (default: disabled)"
	)]
	pub(crate) no_paginate: bool,
	#[arg(
		long = "frame-budget-ms",
		value_name = "MS",
		help = "Time allowance per engine tick (default: 10)"
	)]
	pub(crate) frame_budget_ms: Option<u64>,
	#[arg(
		long,
		value_name = "NUM",
		help = "Grid columns for grid output (default: fit to width)"
	)]
	pub(crate) columns: Option<usize>,
	#[arg(
		long,
		value_name = "CHARS",
		default_value_t = 100,
		help = "Character width used by grid output"
	)]
	pub(crate) width: usize,
	#[arg(
		short = 'H',
		long = "hidden",
		value_parser = clap::builder::BoolishValueParser::new(),
		help = "Include hidden loose files (default: disabled)"
	)]
	pub(crate) hidden: Option<bool>,
	#[arg(
		long = "follow-symlinks",
		value_parser = clap::builder::BoolishValueParser::new(),
		help = "Follow symbolic links while listing (default: disabled)"
	)]
	pub(crate) follow_symlinks: Option<bool>,
	#[arg(
		short = 'd',
		long = "max-depth",
		value_name = "NUM",
		help = "Limit directory traversal depth (default: unlimited)"
	)]
	pub(crate) max_depth: Option<usize>,
	#[arg(
		long = "print-config",
		help = "Print the resolved configuration before running (default: disabled)"
	)]
	pub(crate) print_config: bool,
	#[arg(
		short = 'v',
		long = "verbose",
		action = ArgAction::Count,
		help = "Raise log verbosity, repeatable (default: warnings only)"
	)]
	pub(crate) verbose: u8,
	#[arg(
		short = 'o',
		long = "output",
		value_enum,
		default_value_t = OutputFormat::Plain,
		help = "Choose how to print the result"
	)]
	pub(crate) output: OutputFormat,
}
