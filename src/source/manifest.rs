use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{Library, PackageTable};
use crate::error::{CatalogError, Result};

const MANIFEST_VERSION: u32 = 1;

/// JSON description of the packages in a library.
///
/// Each package carries its entry table inline, or names a separate table
/// file that is read when the package is enumerated. Relative paths are
/// resolved against the manifest's directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
	#[serde(default = "default_version")]
	pub version: u32,
	#[serde(default)]
	pub packages: Vec<ManifestPackage>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestPackage {
	pub name: String,
	#[serde(default)]
	pub entries: Vec<ManifestEntry>,
	/// Separate table file holding a JSON array of entries.
	#[serde(default)]
	pub table: Option<PathBuf>,
	/// Directory holding an unpacked copy of the package.
	#[serde(default)]
	pub content_root: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
	pub path: String,
	#[serde(default)]
	pub size: u64,
	#[serde(default)]
	pub modified: u64,
}

fn default_version() -> u32 {
	MANIFEST_VERSION
}

impl PackageManifest {
	/// Read and validate a manifest file.
	///
	/// # Errors
	///
	/// Returns an error if the file cannot be read, is not valid JSON, or was
	/// written for another manifest version.
	pub fn load(path: &Path) -> Result<Self> {
		let bytes = fs::read(path).map_err(|err| CatalogError::io(path, err))?;
		let manifest: Self =
			serde_json::from_slice(&bytes).map_err(|err| CatalogError::payload(path, err))?;
		if manifest.version != MANIFEST_VERSION {
			return Err(CatalogError::Version {
				path: path.to_path_buf(),
				found: manifest.version,
				expected: MANIFEST_VERSION,
			});
		}
		Ok(manifest)
	}

	/// Register every package with `library`, resolving relative paths against `base`.
	pub fn register(self, library: &mut Library, base: &Path) {
		for package in self.packages {
			let ManifestPackage {
				name,
				entries,
				table,
				content_root,
			} = package;

			match table {
				Some(table) => library.add_deferred_package(name.clone(), resolve(base, table)),
				None => library.add_package(name.clone(), table_from_entries(entries)),
			};
			if let Some(dir) = content_root {
				library.set_content_root(&name, resolve(base, dir));
			}
		}
	}
}

/// Read a table file holding a JSON array of [`ManifestEntry`] values.
pub(super) fn load_table(path: &Path) -> Result<PackageTable> {
	let bytes = fs::read(path).map_err(|err| CatalogError::io(path, err))?;
	let entries: Vec<ManifestEntry> =
		serde_json::from_slice(&bytes).map_err(|err| CatalogError::payload(path, err))?;
	Ok(table_from_entries(entries))
}

fn table_from_entries(entries: Vec<ManifestEntry>) -> PackageTable {
	PackageTable::from_rows(
		entries
			.into_iter()
			.map(|entry| (entry.path, entry.modified, entry.size)),
	)
}

fn resolve(base: &Path, path: PathBuf) -> PathBuf {
	if path.is_relative() {
		base.join(path)
	} else {
		path
	}
}

#[cfg(test)]
mod tests {
	use tempfile::tempdir;

	use super::*;
	use crate::source::LibrarySource;

	#[test]
	fn registers_inline_and_deferred_tables() {
		let dir = tempdir().expect("tempdir");
		fs::write(
			dir.path().join("b.json"),
			r#"[{ "path": "B/z.vap", "size": 3, "modified": 9 }]"#,
		)
		.expect("write table");
		let manifest_path = dir.path().join("manifest.json");
		fs::write(
			&manifest_path,
			r#"{
				"packages": [
					{ "name": "A.var", "entries": [{ "path": "A/x.json", "size": 1 }] },
					{ "name": "B.var", "table": "b.json" },
					{ "name": "C.var", "table": "missing.json" }
				]
			}"#,
		)
		.expect("write manifest");

		let manifest = PackageManifest::load(&manifest_path).expect("load manifest");
		let mut library = Library::new();
		manifest.register(&mut library, dir.path());

		assert_eq!(library.package_names(), vec!["A.var", "B.var", "C.var"]);
		let a = library.package("A.var").expect("inline table");
		assert_eq!(a.internal_paths(), ["A/x.json".to_string()]);
		let b = library.package("B.var").expect("deferred table");
		assert_eq!(b.rows().next().map(|row| row.timestamp), Some(9));
		assert!(library.package("C.var").is_err(), "missing table file is an error");
	}

	#[test]
	fn rejects_unknown_versions() {
		let dir = tempdir().expect("tempdir");
		let path = dir.path().join("manifest.json");
		fs::write(&path, r#"{ "version": 7, "packages": [] }"#).expect("write");
		let err = PackageManifest::load(&path).expect_err("version mismatch");
		assert!(matches!(err, CatalogError::Version { found: 7, .. }));
	}
}
