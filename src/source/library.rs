use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use super::manifest::load_table;
use super::walk::walk_loose;
use super::{EntryReader, FilesystemOptions, LibrarySource, LooseFile, PackageTable};
use crate::entry::{Entry, EntryKind};
use crate::error::{CatalogError, Result};

/// How a package's entry table is obtained.
#[derive(Debug, Clone)]
enum TableSource {
	Ready(Arc<PackageTable>),
	/// Loaded from a JSON table file the first time the package is enumerated.
	/// A failed load is kept too, so later passes skip it without touching disk.
	Deferred {
		path: PathBuf,
		table: OnceLock<std::result::Result<Arc<PackageTable>, String>>,
	},
	Unreadable(String),
}

#[derive(Debug, Clone)]
struct PackageSlot {
	table: TableSource,
	/// Directory the package has been unpacked into, if any.
	content_root: Option<PathBuf>,
}

/// Filesystem-backed library: loose files below a root plus registered packages.
#[derive(Debug, Clone, Default)]
pub struct Library {
	root: Option<PathBuf>,
	options: FilesystemOptions,
	packages: BTreeMap<String, PackageSlot>,
}

impl Library {
	/// Library without loose files or packages.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Library whose loose files live below `root`.
	#[must_use]
	pub fn with_root(root: impl Into<PathBuf>, options: FilesystemOptions) -> Self {
		Self {
			root: Some(root.into()),
			options,
			packages: BTreeMap::new(),
		}
	}

	/// Register a package with an in-memory table.
	pub fn add_package(&mut self, name: impl Into<String>, table: PackageTable) -> &mut Self {
		self.insert(name.into(), TableSource::Ready(Arc::new(table)), None)
	}

	/// Register a package whose table is read from `table_path` on first use.
	pub fn add_deferred_package(
		&mut self,
		name: impl Into<String>,
		table_path: impl Into<PathBuf>,
	) -> &mut Self {
		let table = TableSource::Deferred {
			path: table_path.into(),
			table: OnceLock::new(),
		};
		self.insert(name.into(), table, None)
	}

	/// Register a package that is known to be unreadable.
	pub fn add_unreadable_package(
		&mut self,
		name: impl Into<String>,
		reason: impl Into<String>,
	) -> &mut Self {
		self.insert(name.into(), TableSource::Unreadable(reason.into()), None)
	}

	/// Point packaged entries of `name` at an unpacked copy on disk.
	pub fn set_content_root(&mut self, name: &str, dir: impl Into<PathBuf>) -> &mut Self {
		if let Some(slot) = self.packages.get_mut(name) {
			slot.content_root = Some(dir.into());
		}
		self
	}

	/// Number of registered packages.
	#[must_use]
	pub fn package_count(&self) -> usize {
		self.packages.len()
	}

	#[must_use]
	pub fn options(&self) -> &FilesystemOptions {
		&self.options
	}

	fn insert(&mut self, name: String, table: TableSource, content_root: Option<PathBuf>) -> &mut Self {
		self.packages.insert(
			name,
			PackageSlot {
				table,
				content_root,
			},
		);
		self
	}

	fn resolve(&self, entry: &Entry) -> io::Result<PathBuf> {
		match entry.kind() {
			EntryKind::Loose => {
				let root = self
					.root
					.as_deref()
					.ok_or_else(|| io::Error::new(ErrorKind::NotFound, "library has no loose root"))?;
				Ok(root.join(entry.path()))
			}
			EntryKind::Packaged => {
				let package = entry.package().unwrap_or_default();
				let content_root = self
					.packages
					.get(package)
					.and_then(|slot| slot.content_root.as_deref())
					.ok_or_else(|| {
						io::Error::new(
							ErrorKind::Unsupported,
							format!("package `{package}` has no unpacked content"),
						)
					})?;
				Ok(content_root.join(entry.internal_path()))
			}
		}
	}
}

impl LibrarySource for Library {
	fn package_names(&self) -> Vec<String> {
		self.packages.keys().cloned().collect()
	}

	fn package(&self, name: &str) -> Result<Arc<PackageTable>> {
		let slot = self.packages.get(name).ok_or_else(|| CatalogError::Package {
			name: name.to_string(),
			reason: "not registered".to_string(),
		})?;
		match &slot.table {
			TableSource::Ready(table) => Ok(Arc::clone(table)),
			TableSource::Deferred { path, table } => table
				.get_or_init(|| {
					load_table(path).map(Arc::new).map_err(|err| {
						log::debug!("package table for {name} could not be loaded: {err}");
						err.to_string()
					})
				})
				.clone()
				.map_err(|reason| CatalogError::Package {
					name: name.to_string(),
					reason,
				}),
			TableSource::Unreadable(reason) => Err(CatalogError::Package {
				name: name.to_string(),
				reason: reason.clone(),
			}),
		}
	}

	fn loose_root(&self) -> Option<&Path> {
		self.root.as_deref()
	}

	fn list_loose(&self, scopes: &[String], visit: &mut dyn FnMut(LooseFile) -> bool) -> Result<()> {
		let Some(root) = self.root.as_deref() else {
			return Ok(());
		};
		let metadata = fs::metadata(root).map_err(|err| CatalogError::io(root, err))?;
		if !metadata.is_dir() {
			return Err(CatalogError::io(
				root,
				io::Error::new(ErrorKind::NotADirectory, "library root is not a directory"),
			));
		}
		walk_loose(root, scopes, &self.options, visit);
		Ok(())
	}

	fn open(&self, entry: &Entry) -> io::Result<EntryReader> {
		let path = self.resolve(entry)?;
		let file = File::open(path)?;
		Ok(EntryReader::Seekable(Box::new(file)))
	}
}
