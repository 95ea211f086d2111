//! Persistent metadata stores.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{BufWriter, ErrorKind};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

const STORE_VERSION: u32 = 1;

/// Durable `key -> value` map behind the metadata index.
///
/// Writes are buffered until [`MetadataStore::save`] is called.
pub trait MetadataStore: Send {
	/// # Errors
	///
	/// Returns an error when the store cannot be read.
	fn try_get(&self, key: &str) -> Result<Option<u32>>;

	/// # Errors
	///
	/// Returns an error when the store refuses the write.
	fn set(&mut self, key: &str, value: u32) -> Result<()>;

	/// Flush buffered writes.
	///
	/// # Errors
	///
	/// Returns an error when the flush fails.
	fn save(&mut self) -> Result<()>;
}

/// Volatile store, for embedding without persistence and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
	values: HashMap<String, u32>,
	saves: usize,
	failing: bool,
}

impl MemoryStore {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// A store whose every operation fails.
	#[must_use]
	pub fn failing() -> Self {
		Self {
			failing: true,
			..Self::default()
		}
	}

	#[must_use]
	pub fn with_values<K: Into<String>>(values: impl IntoIterator<Item = (K, u32)>) -> Self {
		Self {
			values: values
				.into_iter()
				.map(|(key, value)| (key.into(), value))
				.collect(),
			..Self::default()
		}
	}

	/// Number of completed saves.
	#[must_use]
	pub fn saves(&self) -> usize {
		self.saves
	}

	fn check(&self) -> Result<()> {
		if self.failing {
			Err(CatalogError::Store("memory store is failing".to_string()))
		} else {
			Ok(())
		}
	}
}

impl MetadataStore for MemoryStore {
	fn try_get(&self, key: &str) -> Result<Option<u32>> {
		self.check()?;
		Ok(self.values.get(key).copied())
	}

	fn set(&mut self, key: &str, value: u32) -> Result<()> {
		self.check()?;
		self.values.insert(key.to_string(), value);
		Ok(())
	}

	fn save(&mut self) -> Result<()> {
		self.check()?;
		self.saves += 1;
		Ok(())
	}
}

/// Store persisted as a versioned JSON document.
///
/// [`JsonMetadataStore::save`] writes a sibling temporary file and renames it
/// over the target, so a crash mid-save leaves the previous index intact.
#[derive(Debug, Clone)]
pub struct JsonMetadataStore {
	path: PathBuf,
	values: BTreeMap<String, u32>,
	dirty: bool,
}

#[derive(Deserialize)]
struct StorePayload {
	version: u32,
	#[serde(default)]
	values: BTreeMap<String, u32>,
}

/// Serialized form of [`StorePayload`], borrowing the live map.
#[derive(Serialize)]
struct StorePayloadRef<'a> {
	version: u32,
	values: &'a BTreeMap<String, u32>,
}

impl JsonMetadataStore {
	/// Open the store at `path`. A missing file yields an empty store.
	///
	/// # Errors
	///
	/// Returns an error if the file exists but cannot be read, is not valid
	/// JSON, or was written by another version.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
		let path = path.into();
		let values = match fs::read(&path) {
			Ok(bytes) => decode(&path, &bytes)?,
			Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
			Err(err) => return Err(CatalogError::io(&path, err)),
		};
		Ok(Self {
			path,
			values,
			dirty: false,
		})
	}

	/// Open the store at `path`, starting empty when the existing file is unusable.
	#[must_use]
	pub fn open_or_empty(path: impl Into<PathBuf>) -> Self {
		let path = path.into();
		match Self::open(&path) {
			Ok(store) => store,
			Err(err) => {
				log::warn!("discarding metadata index: {err}");
				Self {
					path,
					values: BTreeMap::new(),
					dirty: false,
				}
			}
		}
	}

	#[must_use]
	pub fn path(&self) -> &Path {
		&self.path
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.values.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	fn write(&self) -> Result<()> {
		if let Some(dir) = self.path.parent() {
			fs::create_dir_all(dir).map_err(|err| CatalogError::io(dir, err))?;
		}
		let payload = StorePayloadRef {
			version: STORE_VERSION,
			values: &self.values,
		};
		let tmp_path = self.path.with_extension("tmp");
		{
			let file = fs::File::create(&tmp_path).map_err(|err| CatalogError::io(&tmp_path, err))?;
			let mut writer = BufWriter::new(file);
			serde_json::to_writer(&mut writer, &payload)
				.map_err(|err| CatalogError::payload(&self.path, err))?;
			let file = writer
				.into_inner()
				.map_err(|err| CatalogError::io(&tmp_path, err.into_error()))?;
			file.sync_all().ok();
		}
		fs::rename(&tmp_path, &self.path).map_err(|err| CatalogError::io(&self.path, err))
	}
}

fn decode(path: &Path, bytes: &[u8]) -> Result<BTreeMap<String, u32>> {
	let payload: StorePayload =
		serde_json::from_slice(bytes).map_err(|err| CatalogError::payload(path, err))?;
	if payload.version != STORE_VERSION {
		return Err(CatalogError::Version {
			path: path.to_path_buf(),
			found: payload.version,
			expected: STORE_VERSION,
		});
	}
	Ok(payload.values)
}

impl MetadataStore for JsonMetadataStore {
	fn try_get(&self, key: &str) -> Result<Option<u32>> {
		Ok(self.values.get(key).copied())
	}

	fn set(&mut self, key: &str, value: u32) -> Result<()> {
		if self.values.insert(key.to_string(), value) != Some(value) {
			self.dirty = true;
		}
		Ok(())
	}

	fn save(&mut self) -> Result<()> {
		if !self.dirty {
			return Ok(());
		}
		self.write()?;
		self.dirty = false;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use tempfile::tempdir;

	use super::*;

	#[test]
	fn json_store_round_trips_through_disk() {
		let dir = tempdir().expect("tempdir");
		let path = dir.path().join("nested").join("metadata-index.json");

		let mut store = JsonMetadataStore::open(&path).expect("open missing");
		assert!(store.is_empty());
		store.set("a.json", 2).expect("set");
		store.save().expect("save");
		assert!(path.exists());
		assert!(!path.with_extension("tmp").exists());

		let reopened = JsonMetadataStore::open(&path).expect("reopen");
		assert_eq!(reopened.try_get("a.json").expect("get"), Some(2));
		assert_eq!(reopened.len(), 1);
	}

	#[test]
	fn repeated_saves_write_the_live_map() {
		let dir = tempdir().expect("tempdir");
		let path = dir.path().join("index.json");
		let mut store = JsonMetadataStore::open(&path).expect("open");
		store.set("a.json", 1).expect("set");
		store.save().expect("first save");
		store.set("b.json", 2).expect("set");
		store.set("a.json", 3).expect("set");
		store.save().expect("second save");

		let raw: serde_json::Value =
			serde_json::from_slice(&fs::read(&path).expect("read")).expect("parse");
		assert_eq!(raw["version"], STORE_VERSION);
		assert_eq!(raw["values"]["a.json"], 3);
		assert_eq!(raw["values"]["b.json"], 2);
		assert_eq!(store.len(), 2, "the store keeps its values after saving");
	}

	#[test]
	fn unchanged_store_skips_writes() {
		let dir = tempdir().expect("tempdir");
		let path = dir.path().join("index.json");
		let mut store = JsonMetadataStore::open(&path).expect("open");
		store.save().expect("save");
		assert!(!path.exists(), "nothing to flush");
	}

	#[test]
	fn corrupt_or_foreign_files_are_rejected() {
		let dir = tempdir().expect("tempdir");
		let path = dir.path().join("index.json");
		fs::write(&path, b"not json").expect("write");
		assert!(matches!(
			JsonMetadataStore::open(&path),
			Err(CatalogError::Payload { .. })
		));
		assert!(JsonMetadataStore::open_or_empty(&path).is_empty());

		fs::write(&path, br#"{ "version": 99, "values": {} }"#).expect("write");
		assert!(matches!(
			JsonMetadataStore::open(&path),
			Err(CatalogError::Version { found: 99, .. })
		));
	}

	#[test]
	fn failing_memory_store_errors_everywhere() {
		let mut store = MemoryStore::failing();
		assert!(store.try_get("a").is_err());
		assert!(store.set("a", 1).is_err());
		assert!(store.save().is_err());
		assert_eq!(store.saves(), 0);
	}
}
