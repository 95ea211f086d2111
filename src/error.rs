use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by catalog collaborators.
///
/// None of these escape the engine's public operations: enumeration skips the
/// failing package, extraction falls back to its default, and store errors are
/// treated as a cache miss.
#[derive(Debug, Error)]
pub enum CatalogError {
	/// Reading or writing a file failed.
	#[error("i/o error on {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
	/// A package could not produce its entry table.
	#[error("package `{name}` is unreadable: {reason}")]
	Package { name: String, reason: String },
	/// A persisted payload could not be encoded or decoded.
	#[error("invalid payload in {path}: {source}")]
	Payload {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},
	/// The persisted payload was written by an incompatible version.
	#[error("unsupported payload version {found} in {path} (expected {expected})")]
	Version {
		path: PathBuf,
		found: u32,
		expected: u32,
	},
	/// The backing store refused the operation.
	#[error("metadata store unavailable: {0}")]
	Store(String),
}

impl CatalogError {
	pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
		Self::Io {
			path: path.into(),
			source,
		}
	}

	pub(crate) fn payload(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
		Self::Payload {
			path: path.into(),
			source,
		}
	}
}

pub type Result<T, E = CatalogError> = std::result::Result<T, E>;
