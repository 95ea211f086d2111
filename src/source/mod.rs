//! Entry sources.
//!
//! The engine never reads archive internals. A [`LibrarySource`] exposes the
//! cached entry table of each package, lists loose files below the library
//! root, and opens entry bytes for metadata extraction.

use std::io::{self, Read, Seek};
use std::path::Path;
use std::sync::Arc;

use crate::entry::Entry;
use crate::error::Result;

mod library;
mod manifest;
mod options;
mod walk;

pub use library::Library;
pub use manifest::{ManifestEntry, ManifestPackage, PackageManifest};
pub use options::{FilesystemOptions, normalize_extension};
pub(crate) use walk::build_walk;

/// Readable stream that can also seek.
pub trait SeekRead: Read + Seek + Send {}

impl<T: Read + Seek + Send> SeekRead for T {}

/// Bytes of one entry, as handed out by [`LibrarySource::open`].
pub enum EntryReader {
	/// Random access is available, so the tail probe can be used.
	Seekable(Box<dyn SeekRead>),
	/// Forward-only stream.
	Sequential(Box<dyn Read + Send>),
}

impl EntryReader {
	#[must_use]
	pub fn is_seekable(&self) -> bool {
		matches!(self, EntryReader::Seekable(_))
	}
}

/// A loose file reported by [`LibrarySource::list_loose`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LooseFile {
	/// Path relative to the library root, `/`-separated.
	pub path: String,
	pub size: u64,
	/// Seconds since the Unix epoch.
	pub modified: u64,
}

/// Cached entry table of a package, stored as parallel columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageTable {
	paths: Vec<String>,
	timestamps: Vec<u64>,
	sizes: Vec<u64>,
}

/// One row of a [`PackageTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageRow<'a> {
	pub path: &'a str,
	pub timestamp: u64,
	pub size: u64,
}

impl PackageTable {
	/// Build a table from `(internal_path, timestamp, size)` rows.
	pub fn from_rows<P: Into<String>>(rows: impl IntoIterator<Item = (P, u64, u64)>) -> Self {
		let mut table = Self::default();
		for (path, timestamp, size) in rows {
			table.paths.push(path.into());
			table.timestamps.push(timestamp);
			table.sizes.push(size);
		}
		table
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.paths.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.paths.is_empty()
	}

	/// Internal paths in table order.
	#[must_use]
	pub fn internal_paths(&self) -> &[String] {
		&self.paths
	}

	pub fn rows(&self) -> impl Iterator<Item = PackageRow<'_>> {
		self.paths
			.iter()
			.zip(&self.timestamps)
			.zip(&self.sizes)
			.map(|((path, timestamp), size)| PackageRow {
				path,
				timestamp: *timestamp,
				size: *size,
			})
	}
}

/// Everything the enumeration pipeline and the extractor need from a library.
pub trait LibrarySource: Send + Sync {
	/// Names of every package, in the order they should be walked.
	fn package_names(&self) -> Vec<String>;

	/// Cached entry table of one package.
	///
	/// # Errors
	///
	/// Returns an error when the package cannot be read. Enumeration skips
	/// the package and carries on.
	fn package(&self, name: &str) -> Result<Arc<PackageTable>>;

	/// Root directory of loose files.
	fn loose_root(&self) -> Option<&Path> {
		None
	}

	/// Visit loose files below the directories named by `scopes`.
	///
	/// An empty scope list means the whole root. `visit` returns `false` to
	/// stop listing early.
	///
	/// # Errors
	///
	/// Returns an error when the root cannot be walked at all.
	fn list_loose(&self, _scopes: &[String], _visit: &mut dyn FnMut(LooseFile) -> bool) -> Result<()> {
		Ok(())
	}

	/// Open the bytes of an entry.
	///
	/// # Errors
	///
	/// Returns an error when the entry cannot be opened.
	fn open(&self, entry: &Entry) -> io::Result<EntryReader>;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn table_rows_zip_columns() {
		let table = PackageTable::from_rows([("A/x.json", 5, 100), ("A/y.json", 6, 200)]);
		assert_eq!(table.len(), 2);
		let rows: Vec<_> = table.rows().collect();
		assert_eq!(rows[1].path, "A/y.json");
		assert_eq!(rows[1].timestamp, 6);
		assert_eq!(rows[1].size, 200);
		assert_eq!(table.internal_paths()[0], "A/x.json");
	}
}
