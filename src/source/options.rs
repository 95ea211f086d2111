use std::collections::HashSet;
use std::ffi::OsString;

use serde::{Deserialize, Serialize};

/// Options for walking loose files below the library root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesystemOptions {
	/// Include hidden files and directories.
	pub include_hidden: bool,
	/// Follow symbolic links during traversal.
	pub follow_symlinks: bool,
	/// Respect .ignore files.
	pub respect_ignore_files: bool,
	/// Respect .gitignore files.
	pub git_ignore: bool,
	/// Directory names to always skip.
	pub global_ignores: Vec<String>,
	/// Maximum directory traversal depth.
	pub max_depth: Option<usize>,
}

impl Default for FilesystemOptions {
	fn default() -> Self {
		Self {
			include_hidden: false,
			follow_symlinks: false,
			respect_ignore_files: true,
			git_ignore: false,
			global_ignores: vec![".git".to_string(), ".cache".to_string()],
			max_depth: None,
		}
	}
}

impl FilesystemOptions {
	/// Create a set of directory names to skip.
	pub fn global_ignore_set(&self) -> HashSet<OsString> {
		self.global_ignores
			.iter()
			.map(|entry| OsString::from(entry.as_str()))
			.collect()
	}
}

/// Normalize an extension by trimming and removing leading dots.
pub fn normalize_extension(ext: &str) -> String {
	ext.trim().trim_start_matches('.').to_ascii_lowercase()
}
