//! Browsable entries produced by enumeration.

use serde::{Deserialize, Serialize};

/// Separator between a package name and the path inside it.
pub const PACKAGE_SEPARATOR: char = ':';

/// Where an entry physically lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
	/// A file on disk below the library root.
	Loose,
	/// A file nested inside a package.
	Packaged,
}

/// One browsable asset.
///
/// Entries are plain values: they are created by the enumeration producer,
/// owned by the result list that kept them, and dropped with it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Entry {
	path: String,
	uid: String,
	size: u64,
	last_modified: u64,
	kind: EntryKind,
}

impl Entry {
	/// Entry for a loose file. `path` is relative to the library root.
	#[must_use]
	pub fn loose(path: impl Into<String>, size: u64, last_modified: u64) -> Self {
		let path = normalize_separators(path.into());
		Self {
			uid: path.clone(),
			path,
			size,
			last_modified,
			kind: EntryKind::Loose,
		}
	}

	/// Entry for a file stored inside `package`.
	#[must_use]
	pub fn packaged(package: &str, internal_path: &str, size: u64, last_modified: u64) -> Self {
		let internal_path = normalize_separators(internal_path.to_string());
		let path = format!("{package}{PACKAGE_SEPARATOR}{internal_path}");
		Self {
			uid: path.clone(),
			path,
			size,
			last_modified,
			kind: EntryKind::Packaged,
		}
	}

	/// Replace the identity key. An empty uid keeps the path as identity.
	#[must_use]
	pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
		let uid = uid.into();
		if !uid.is_empty() {
			self.uid = uid;
		}
		self
	}

	/// Full path in the host namespace (`package:internal/path` for packaged entries).
	#[must_use]
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Stable identity used as the metadata key.
	#[must_use]
	pub fn uid(&self) -> &str {
		&self.uid
	}

	/// Size in bytes.
	#[must_use]
	pub fn size(&self) -> u64 {
		self.size
	}

	/// Modification time in seconds since the Unix epoch.
	#[must_use]
	pub fn last_modified(&self) -> u64 {
		self.last_modified
	}

	#[must_use]
	pub fn kind(&self) -> EntryKind {
		self.kind
	}

	/// Name of the containing package, if any.
	#[must_use]
	pub fn package(&self) -> Option<&str> {
		match self.kind {
			EntryKind::Packaged => self
				.path
				.split_once(PACKAGE_SEPARATOR)
				.map(|(package, _)| package),
			EntryKind::Loose => None,
		}
	}

	/// Path inside the package, or the root-relative path for loose files.
	#[must_use]
	pub fn internal_path(&self) -> &str {
		match self.kind {
			EntryKind::Packaged => self
				.path
				.split_once(PACKAGE_SEPARATOR)
				.map_or(self.path.as_str(), |(_, internal)| internal),
			EntryKind::Loose => &self.path,
		}
	}

	/// Last path component.
	#[must_use]
	pub fn file_name(&self) -> &str {
		file_name_of(&self.path)
	}

	/// Extension of the file name without the dot, as written.
	#[must_use]
	pub fn extension(&self) -> Option<&str> {
		extension_of(&self.path)
	}
}

/// Last `/`-separated component of `path`.
#[must_use]
pub fn file_name_of(path: &str) -> &str {
	let tail = path.rsplit('/').next().unwrap_or(path);
	tail.rsplit(PACKAGE_SEPARATOR).next().unwrap_or(tail)
}

/// Extension of the last component of `path`, without the dot.
#[must_use]
pub fn extension_of(path: &str) -> Option<&str> {
	let name = file_name_of(path);
	match name.rsplit_once('.') {
		Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
		_ => None,
	}
}

fn normalize_separators(path: String) -> String {
	if path.contains('\\') {
		path.replace('\\', "/")
	} else {
		path
	}
}
