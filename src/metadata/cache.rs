use std::collections::HashMap;

/// Bounded in-memory metadata map.
///
/// Inserting a new key into a full cache clears it first. Nothing is evicted
/// selectively, so callers must treat every miss as "derive again".
#[derive(Debug, Clone)]
pub struct MemoryCache {
	values: HashMap<String, u32>,
	capacity: usize,
	clears: u64,
}

impl MemoryCache {
	#[must_use]
	pub fn new(capacity: usize) -> Self {
		Self {
			values: HashMap::new(),
			capacity: capacity.max(1),
			clears: 0,
		}
	}

	#[must_use]
	pub fn get(&self, key: &str) -> Option<u32> {
		self.values.get(key).copied()
	}

	pub fn insert(&mut self, key: &str, value: u32) {
		if let Some(slot) = self.values.get_mut(key) {
			*slot = value;
			return;
		}
		if self.values.len() >= self.capacity {
			self.values.clear();
			self.clears += 1;
		}
		self.values.insert(key.to_string(), value);
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.values.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	#[must_use]
	pub fn capacity(&self) -> usize {
		self.capacity
	}

	/// How many times the cache has been emptied by overflow.
	#[must_use]
	pub fn clears(&self) -> u64 {
		self.clears
	}
}
