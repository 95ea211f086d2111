use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use varlens::{
	CatalogConfig, FilesystemOptions, FilterState, PeopleFilter, SortMode, SubFilter, app_dirs,
};

use super::resolved::ResolvedConfig;
use crate::cli::CliArgs;

/// Mirror of the configuration file representation before CLI overrides and
/// validation are applied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(super) struct RawConfig {
	library: LibrarySection,
	browse: BrowseSection,
	catalog: CatalogConfig,
}

/// Where the library lives and how loose files are listed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct LibrarySection {
	root: Option<PathBuf>,
	manifest: Option<PathBuf>,
	index: Option<PathBuf>,
	persist_index: Option<bool>,
	tags_file: Option<PathBuf>,
	ratings_file: Option<PathBuf>,
	include_hidden: Option<bool>,
	follow_symlinks: Option<bool>,
	respect_ignore_files: Option<bool>,
	git_ignore: Option<bool>,
	max_depth: Option<usize>,
	global_ignores: Option<Vec<String>>,
}

/// Default browsing state.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct BrowseSection {
	sort: Option<SortMode>,
	extensions: Option<Vec<String>>,
	scopes: Option<Vec<String>>,
}

impl RawConfig {
	/// Apply CLI overrides on top of the raw configuration values.
	pub(super) fn apply_cli_overrides(&mut self, cli: &CliArgs) {
		if let Some(root) = cli.root.clone() {
			self.library.root = Some(root);
		}
		if let Some(manifest) = cli.manifest.clone() {
			self.library.manifest = Some(manifest);
		}
		if let Some(index) = cli.index.clone() {
			self.library.index = Some(index);
		}
		if cli.no_index {
			self.library.persist_index = Some(false);
		}
		if let Some(path) = cli.tags_file.clone() {
			self.library.tags_file = Some(path);
		}
		if let Some(path) = cli.ratings_file.clone() {
			self.library.ratings_file = Some(path);
		}
		if let Some(value) = cli.hidden {
			self.library.include_hidden = Some(value);
		}
		if let Some(value) = cli.follow_symlinks {
			self.library.follow_symlinks = Some(value);
		}
		if let Some(value) = cli.max_depth {
			self.library.max_depth = Some(value);
		}

		if let Some(sort) = cli.sort {
			self.browse.sort = Some(sort.into());
		}
		if let Some(extensions) = &cli.extensions {
			self.browse.extensions = Some(extensions.clone());
		}
		if !cli.scopes.is_empty() {
			self.browse.scopes = Some(cli.scopes.clone());
		}

		if let Some(page_size) = cli.page_size {
			self.catalog.page_size = page_size;
		}
		if cli.no_paginate {
			self.catalog.paginate = false;
		}
		if let Some(budget) = cli.frame_budget_ms {
			self.catalog.frame_budget_ms = budget;
		}
	}

	/// Convert the raw configuration into a [`ResolvedConfig`], validating and
	/// filling defaults where required.
	pub(super) fn resolve(self, cli: &CliArgs) -> Result<ResolvedConfig> {
		let root = resolve_root(self.library.root)?;

		let manifest = match self.library.manifest {
			Some(path) => {
				let path = absolutize(path)?;
				ensure!(path.is_file(), "package manifest {} does not exist", path.display());
				Some(path)
			}
			None => None,
		};

		let index = if self.library.persist_index == Some(false) {
			None
		} else {
			match self.library.index {
				Some(path) => Some(absolutize(path)?),
				None => match app_dirs::default_metadata_index_path() {
					Ok(path) => Some(path),
					Err(err) => {
						log::warn!("metadata index kept in memory: {err}");
						None
					}
				},
			}
		};

		let mut filesystem = FilesystemOptions::default();
		filesystem.include_hidden = self.library.include_hidden.unwrap_or(filesystem.include_hidden);
		filesystem.follow_symlinks = self.library.follow_symlinks.unwrap_or(filesystem.follow_symlinks);
		filesystem.respect_ignore_files = self
			.library
			.respect_ignore_files
			.unwrap_or(filesystem.respect_ignore_files);
		filesystem.git_ignore = self.library.git_ignore.unwrap_or(filesystem.git_ignore);
		filesystem.max_depth = self.library.max_depth;
		if let Some(ignores) = self.library.global_ignores {
			filesystem.global_ignores = ignores;
		}

		// Validate
		if let Some(max_depth) = filesystem.max_depth {
			ensure!(max_depth > 0, "max-depth must be at least 1");
		}
		ensure!(self.catalog.page_size > 0, "page-size must be greater than zero");
		ensure!(self.catalog.frame_budget_ms > 0, "frame-budget-ms must be greater than zero");
		ensure!(
			cli.sub_filters.is_empty() || cli.category.is_some(),
			"--sub requires --category"
		);

		let filter = build_filter(cli, self.browse.extensions, self.browse.scopes);

		Ok(ResolvedConfig {
			root,
			manifest,
			index,
			tags_file: self.library.tags_file,
			ratings_file: self.library.ratings_file,
			filesystem,
			catalog: self.catalog,
			sort: self.browse.sort.unwrap_or_default(),
			filter,
		})
	}
}

/// Resolve the library root, validating it exists and is a directory.
fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf> {
	let root = match root {
		Some(path) => absolutize(path)?,
		None => env::current_dir().context("failed to determine working directory")?,
	};
	let root = fs::canonicalize(&root)
		.with_context(|| format!("failed to canonicalize library root {}", root.display()))?;

	let metadata = fs::metadata(&root)
		.with_context(|| format!("failed to inspect library root {}", root.display()))?;
	ensure!(metadata.is_dir(), "library root must be a directory");

	Ok(root)
}

fn absolutize(path: PathBuf) -> Result<PathBuf> {
	if path.is_relative() {
		Ok(env::current_dir()
			.context("failed to resolve current directory")?
			.join(path))
	} else {
		Ok(path)
	}
}

/// Assemble the filter state from flags and browse defaults.
fn build_filter(
	cli: &CliArgs,
	extensions: Option<Vec<String>>,
	scopes: Option<Vec<String>>,
) -> FilterState {
	let people = cli
		.people
		.iter()
		.fold(PeopleFilter::empty(), |bits, arg| bits | arg.bit());

	let mut filter = FilterState::new()
		.with_extensions(extensions.unwrap_or_default())
		.with_scopes(scopes.unwrap_or_default())
		.with_query(cli.query.clone().unwrap_or_default())
		.with_tags(&cli.tags)
		.with_people(people)
		.with_rating(cli.rating)
		.with_size(cli.size.map(Into::into))
		.with_source(cli.source.into());

	if let Some(category) = cli.category {
		let sub_filter = cli
			.sub_filters
			.iter()
			.fold(SubFilter::empty(), |bits, arg| bits | arg.bit());
		filter = filter.with_category(category.into(), sub_filter);
	}
	filter
}
