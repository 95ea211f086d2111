use std::path::PathBuf;

use varlens::{CatalogConfig, FilesystemOptions, FilterState, SortMode};

/// Application-ready configuration derived from user input, config files and
/// defaults.
#[derive(Debug)]
pub(crate) struct ResolvedConfig {
	pub(crate) root: PathBuf,
	pub(crate) manifest: Option<PathBuf>,
	/// `None` keeps derived metadata in memory only.
	pub(crate) index: Option<PathBuf>,
	pub(crate) tags_file: Option<PathBuf>,
	pub(crate) ratings_file: Option<PathBuf>,
	pub(crate) filesystem: FilesystemOptions,
	pub(crate) catalog: CatalogConfig,
	pub(crate) sort: SortMode,
	pub(crate) filter: FilterState,
}

impl ResolvedConfig {
	/// Print a human readable summary of the effective configuration.
	pub(crate) fn print_summary(&self) {
		println!("Effective configuration:");
		println!("  Root: {}", self.root.display());
		println!("  Manifest: {}", display_or(self.manifest.as_ref(), "(none)"));
		println!("  Metadata index: {}", display_or(self.index.as_ref(), "(memory only)"));
		if let Some(path) = &self.tags_file {
			println!("  Tags: {}", path.display());
		}
		if let Some(path) = &self.ratings_file {
			println!("  Ratings: {}", path.display());
		}
		println!(
			"  Include hidden: {}",
			bool_to_word(self.filesystem.include_hidden)
		);
		println!(
			"  Follow symlinks: {}",
			bool_to_word(self.filesystem.follow_symlinks)
		);
		match self.filesystem.max_depth {
			Some(depth) => println!("  Max depth: {depth}"),
			None => println!("  Max depth: unlimited"),
		}
		println!("  Frame budget: {} ms", self.catalog.frame_budget_ms);
		println!(
			"  Page size: {} ({})",
			self.catalog.page_size,
			if self.catalog.paginate { "paged" } else { "unpaged" }
		);
		println!("  Sort: {}", self.sort);
		if self.filter.extensions.is_empty() {
			println!("  Extensions: (all)");
		} else {
			println!("  Extensions: {}", self.filter.extensions.join(", "));
		}
		if !self.filter.scopes.is_empty() {
			println!("  Scopes: {}", self.filter.scopes.join(", "));
		}
		if !self.filter.query.is_empty() {
			println!("  Query: {}", self.filter.query);
		}
	}
}

fn display_or(path: Option<&PathBuf>, fallback: &str) -> String {
	path.map_or_else(|| fallback.to_string(), |path| path.display().to_string())
}

fn bool_to_word(value: bool) -> &'static str {
	if value { "yes" } else { "no" }
}
