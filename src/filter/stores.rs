//! Tag and rating lookups consulted by the filter chain.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use crate::entry::Entry;
use crate::error::{CatalogError, Result};

/// Highest star rating.
pub const MAX_RATING: u8 = 5;

/// User tag membership.
pub trait TagStore: Send + Sync {
	/// Whether the entry identified by `uid` carries `tag` (case-insensitive).
	fn has_tag(&self, uid: &str, tag: &str) -> bool;
}

/// User star ratings.
pub trait RatingStore: Send + Sync {
	/// `0` means unrated, `1..=5` are stars.
	fn rating(&self, entry: &Entry) -> u8;
}

/// Tag store held in memory, optionally loaded from a JSON object of
/// `uid -> [tags]`.
#[derive(Debug, Clone, Default)]
pub struct MemoryTags {
	tags: HashMap<String, BTreeSet<String>>,
}

impl MemoryTags {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Read tags from a JSON file.
	///
	/// # Errors
	///
	/// Returns an error if the file cannot be read or parsed.
	pub fn load(path: &Path) -> Result<Self> {
		let bytes = fs::read(path).map_err(|err| CatalogError::io(path, err))?;
		let raw: HashMap<String, Vec<String>> =
			serde_json::from_slice(&bytes).map_err(|err| CatalogError::payload(path, err))?;
		let mut store = Self::new();
		for (uid, tags) in raw {
			for tag in tags {
				store.tag(&uid, &tag);
			}
		}
		Ok(store)
	}

	/// Attach `tag` to `uid`.
	pub fn tag(&mut self, uid: &str, tag: &str) -> &mut Self {
		let tag = tag.trim().to_lowercase();
		if !tag.is_empty() {
			self.tags.entry(uid.to_string()).or_default().insert(tag);
		}
		self
	}
}

impl TagStore for MemoryTags {
	fn has_tag(&self, uid: &str, tag: &str) -> bool {
		self.tags
			.get(uid)
			.is_some_and(|tags| tags.contains(&tag.to_lowercase()))
	}
}

/// Rating store held in memory, optionally loaded from a JSON object of
/// `uid -> stars`.
#[derive(Debug, Clone, Default)]
pub struct MemoryRatings {
	ratings: HashMap<String, u8>,
}

impl MemoryRatings {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Read ratings from a JSON file.
	///
	/// # Errors
	///
	/// Returns an error if the file cannot be read or parsed.
	pub fn load(path: &Path) -> Result<Self> {
		let bytes = fs::read(path).map_err(|err| CatalogError::io(path, err))?;
		let raw: HashMap<String, u8> =
			serde_json::from_slice(&bytes).map_err(|err| CatalogError::payload(path, err))?;
		let mut store = Self::new();
		for (uid, stars) in raw {
			store.rate(&uid, stars);
		}
		Ok(store)
	}

	/// Rate `uid`, clamping to [`MAX_RATING`]. Zero removes the rating.
	pub fn rate(&mut self, uid: &str, stars: u8) -> &mut Self {
		if stars == 0 {
			self.ratings.remove(uid);
		} else {
			self.ratings.insert(uid.to_string(), stars.min(MAX_RATING));
		}
		self
	}
}

impl RatingStore for MemoryRatings {
	fn rating(&self, entry: &Entry) -> u8 {
		self.ratings.get(entry.uid()).copied().unwrap_or(0)
	}
}
