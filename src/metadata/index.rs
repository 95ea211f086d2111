use std::sync::{Mutex, MutexGuard, PoisonError};

use super::cache::MemoryCache;
use super::store::MetadataStore;
use crate::entry::Entry;
use crate::filter::MetadataLookup;

/// Two-tier metadata index: the persistent store is the source of truth and
/// the bounded memory cache is a read-through accelerator.
///
/// Shared between the consumer's on-demand lookups and the background sweep.
/// Store failures are logged and treated as misses, leaving the memory cache
/// as the fallback for the session.
pub struct MetadataIndex {
	memory: Mutex<MemoryCache>,
	store: Mutex<Box<dyn MetadataStore>>,
}

impl MetadataIndex {
	#[must_use]
	pub fn new(store: Box<dyn MetadataStore>, memory_capacity: usize) -> Self {
		Self {
			memory: Mutex::new(MemoryCache::new(memory_capacity)),
			store: Mutex::new(store),
		}
	}

	/// Known value for `key`, consulting the store first.
	#[must_use]
	pub fn lookup(&self, key: &str) -> Option<u32> {
		let stored = match self.lock_store().try_get(key) {
			Ok(value) => value,
			Err(err) => {
				log::debug!("metadata store lookup for {key} failed: {err}");
				None
			}
		};
		let mut memory = self.lock_memory();
		match stored {
			Some(value) => {
				memory.insert(key, value);
				Some(value)
			}
			None => memory.get(key),
		}
	}

	/// Known value for `key`, without promoting store hits into memory.
	///
	/// Used by bulk readers such as facet recounts, which would otherwise
	/// churn the bounded memory tier.
	#[must_use]
	pub fn peek(&self, key: &str) -> Option<u32> {
		if let Some(value) = self.lock_memory().get(key) {
			return Some(value);
		}
		match self.lock_store().try_get(key) {
			Ok(value) => value,
			Err(err) => {
				log::debug!("metadata store lookup for {key} failed: {err}");
				None
			}
		}
	}

	/// [`MetadataLookup`] view backed by [`MetadataIndex::peek`].
	#[must_use]
	pub fn peeking(&self) -> Peek<'_> {
		Peek(self)
	}

	/// Whether a value for `key` is already known.
	#[must_use]
	pub fn contains(&self, key: &str) -> bool {
		self.lookup(key).is_some()
	}

	/// Memoize a derived value in both tiers.
	pub fn record(&self, key: &str, value: u32) {
		self.lock_memory().insert(key, value);
		if let Err(err) = self.lock_store().set(key, value) {
			log::debug!("metadata store rejected {key}: {err}");
		}
	}

	/// Flush the store. Returns whether the flush succeeded.
	pub fn save(&self) -> bool {
		match self.lock_store().save() {
			Ok(()) => true,
			Err(err) => {
				log::warn!("failed to save metadata index: {err}");
				false
			}
		}
	}

	/// Entries currently held in memory.
	#[must_use]
	pub fn memory_len(&self) -> usize {
		self.lock_memory().len()
	}

	fn lock_memory(&self) -> MutexGuard<'_, MemoryCache> {
		self.memory.lock().unwrap_or_else(PoisonError::into_inner)
	}

	fn lock_store(&self) -> MutexGuard<'_, Box<dyn MetadataStore>> {
		self.store.lock().unwrap_or_else(PoisonError::into_inner)
	}
}

impl MetadataLookup for MetadataIndex {
	fn people_count(&self, entry: &Entry) -> Option<u32> {
		self.lookup(entry.uid())
	}
}

/// Read-only lookup that leaves the memory tier untouched.
pub struct Peek<'a>(&'a MetadataIndex);

impl MetadataLookup for Peek<'_> {
	fn people_count(&self, entry: &Entry) -> Option<u32> {
		self.0.peek(entry.uid())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::metadata::MemoryStore;

	#[test]
	fn store_hits_populate_memory() {
		let index = MetadataIndex::new(Box::new(MemoryStore::with_values([("a", 2)])), 10);
		assert_eq!(index.memory_len(), 0);
		assert_eq!(index.lookup("a"), Some(2));
		assert_eq!(index.memory_len(), 1);
		assert_eq!(index.lookup("b"), None);
	}

	#[test]
	fn failing_store_falls_back_to_memory() {
		let index = MetadataIndex::new(Box::new(MemoryStore::failing()), 10);
		index.record("a", 3);
		assert_eq!(index.lookup("a"), Some(3));
		assert!(!index.save());
	}

	#[test]
	fn values_survive_memory_overflow_through_the_store() {
		let index = MetadataIndex::new(Box::new(MemoryStore::new()), 2);
		index.record("a", 1);
		index.record("b", 2);
		index.record("c", 2);
		assert!(index.memory_len() <= 2);
		assert_eq!(index.lookup("a"), Some(1));
		assert!(index.contains("b"));
	}

	#[test]
	fn peeking_leaves_memory_untouched() {
		let index = MetadataIndex::new(Box::new(MemoryStore::with_values([("a", 2), ("b", 1)])), 1);
		index.record("c", 3);
		let entry = Entry::loose("a", 0, 0);
		assert_eq!(index.peeking().people_count(&entry), Some(2));
		assert_eq!(index.peek("c"), Some(3));
		assert_eq!(index.peek("missing"), None);
		assert_eq!(index.memory_len(), 1);
	}
}
